// ABOUTME: Reader engine - deadline-bounded parse loop over the inbound PDU stream
// ABOUTME: Auto-responds to liveness and unbind probes, hands everything else to the user

use crate::connection::{PduReader, PduWriter};
use crate::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use crate::session::client::{Engine, EngineEvent};
use crate::session::settings::{
    ClosedState, ErrorCallback, PduCallback, DEFAULT_READ_TIMEOUT,
};
use crate::session::writer::Writer;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct ReaderSettings {
    /// Per-read deadline. Exceeding it is treated as a dead connection:
    /// it is the sole detector for a silently broken TCP peer.
    pub timeout: Duration,
    pub on_pdu: Option<PduCallback>,
    pub on_receiving_error: Option<ErrorCallback>,
}

impl ReaderSettings {
    pub(crate) fn normalize(&mut self) {
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_READ_TIMEOUT;
        }
    }
}

pub(crate) struct Reader {
    /// Writer engine, the primary path for mechanical responses.
    writer: Arc<Writer>,
    /// Write half of the shared connection: response fallback when the
    /// writer is already closed, and socket teardown on close.
    conn: Arc<Mutex<PduWriter>>,
    cancel: CancellationToken,
    closed: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
    settings: ReaderSettings,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl Reader {
    pub(crate) async fn start(
        conn_reader: PduReader,
        conn: Arc<Mutex<PduWriter>>,
        writer: Arc<Writer>,
        mut settings: ReaderSettings,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Arc<Reader> {
        settings.normalize();

        let reader = Arc::new(Reader {
            writer,
            conn,
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
            handle: Mutex::new(None),
            settings,
            events,
        });

        let handle = tokio::spawn({
            let reader = reader.clone();
            async move { reader.run(conn_reader).await }
        });
        *reader.handle.lock().await = Some(handle);
        reader
    }

    /// Close the reader and, unless the peer engine owns the teardown, the
    /// connection. One-shot.
    pub(crate) async fn close(&self, state: ClosedState) -> SmppResult<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        // Cancellation unhooks the loop from any in-flight blocking parse.
        self.cancel.cancel();
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        if state != ClosedState::StoppingProcessOnly {
            let _ = self.conn.lock().await.shutdown().await;
        }

        debug!(?state, "reader closed");
        let _ = self.events.send(EngineEvent {
            engine: Engine::Reader,
            state,
        });
        Ok(())
    }

    fn closing(self: &Arc<Self>, state: ClosedState) {
        let reader = self.clone();
        tokio::spawn(async move {
            let _ = reader.close(state).await;
        });
    }

    async fn run(self: Arc<Self>, mut conn: PduReader) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let received = tokio::select! {
                _ = self.cancel.cancelled() => return,
                read = timeout(self.settings.timeout, conn.read_pdu()) => match read {
                    Ok(result) => result,
                    Err(_elapsed) => Err(SmppError::Io(io::ErrorKind::TimedOut.into())),
                },
            };

            match received {
                Ok(pdu) => {
                    if self.handle_or_close(pdu).await {
                        return;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "receive failed, closing reader");
                    if let Some(cb) = &self.settings.on_receiving_error {
                        cb(&err);
                    }
                    self.closing(ClosedState::InvalidStreaming);
                    return;
                }
            }
        }
    }

    /// Dispatch one inbound PDU; true means the loop must stop.
    async fn handle_or_close(self: &Arc<Self>, pdu: Pdu) -> bool {
        match &pdu {
            Pdu::EnquireLink(probe) => {
                debug!(sequence = probe.sequence_number, "answering enquire_link");
                if let Some(resp) = pdu.response() {
                    self.respond(resp).await;
                }
                false
            }
            Pdu::Unbind(request) => {
                debug!(sequence = request.sequence_number, "peer requested unbind");
                if let Some(resp) = pdu.response() {
                    self.respond(resp).await;
                    // Grace period so the response clears our send path
                    // before the teardown races it. A synchronous flush
                    // would be cleaner; this mirrors long-standing field
                    // behaviour.
                    sleep(Duration::from_millis(50)).await;
                }
                self.closing(ClosedState::UnbindClosing);
                true
            }
            _ => {
                let mut responded = false;
                if let Some(resp) = pdu.response() {
                    self.respond(resp).await;
                    responded = true;
                }
                if let Some(cb) = &self.settings.on_pdu {
                    cb(pdu, responded);
                }
                false
            }
        }
    }

    /// Hand a response to the writer; if the writer is already closing,
    /// fall back to a direct best-effort write. The fallback takes no close
    /// lock, so it cannot deadlock against a closing writer.
    async fn respond(&self, resp: Pdu) {
        if self.writer.submit(resp.clone()).await.is_err() {
            if let Ok(bytes) = resp.to_bytes() {
                let _ = self.conn.lock().await.write(&bytes).await;
            }
        }
    }
}
