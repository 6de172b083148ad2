// ABOUTME: Writer engine - serializes outbound PDUs from a bounded channel onto the socket
// ABOUTME: Emits periodic enquire_link probes and triages write errors into close decisions

use crate::connection::{PduWriter, WriteError};
use crate::datatypes::{EnquireLink, Unbind};
use crate::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use crate::session::client::{Engine, EngineEvent};
use crate::session::settings::{
    ClosedState, PduErrorCallback, ENQUIRE_LINK_INTERVAL_MINIMUM,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct WriterSettings {
    /// Interval between automatic enquire_link probes; zero disables.
    pub enquire_link: Duration,
    pub on_submit_error: Option<PduErrorCallback>,
}

impl WriterSettings {
    pub(crate) fn normalize(&mut self) {
        if !self.enquire_link.is_zero() && self.enquire_link < ENQUIRE_LINK_INTERVAL_MINIMUM {
            self.enquire_link = ENQUIRE_LINK_INTERVAL_MINIMUM;
        }
    }
}

/// Submit-side gate. Submitters hold the read lock while racing the
/// channel send against cancellation; the close path takes the write lock,
/// so a send in flight always completes or cancels before the channel is
/// torn down.
struct Gate {
    closed: bool,
    tx: Option<mpsc::Sender<Pdu>>,
    handle: Option<JoinHandle<()>>,
}

pub(crate) struct Writer {
    conn: Arc<Mutex<PduWriter>>,
    cancel: CancellationToken,
    gate: RwLock<Gate>,
    settings: WriterSettings,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl Writer {
    pub(crate) async fn start(
        conn: Arc<Mutex<PduWriter>>,
        mut settings: WriterSettings,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Arc<Writer> {
        settings.normalize();

        let (tx, rx) = mpsc::channel(1);
        let writer = Arc::new(Writer {
            conn,
            cancel: CancellationToken::new(),
            gate: RwLock::new(Gate {
                closed: false,
                tx: Some(tx),
                handle: None,
            }),
            settings,
            events,
        });

        let handle = tokio::spawn({
            let writer = writer.clone();
            async move { writer.run(rx).await }
        });
        writer.gate.write().await.handle = Some(handle);
        writer
    }

    /// Enqueue one PDU for transmission. Fails once the writer is closing.
    pub(crate) async fn submit(&self, pdu: Pdu) -> SmppResult<()> {
        let gate = self.gate.read().await;
        if gate.closed {
            return Err(SmppError::SessionClosing);
        }
        let Some(tx) = gate.tx.as_ref() else {
            return Err(SmppError::SessionClosing);
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(SmppError::SessionClosing),
            sent = tx.send(pdu) => sent.map_err(|_| SmppError::SessionClosing),
        }
    }

    /// Close the writer: stop accepting submissions, drain the loop, send a
    /// best-effort unbind and (unless the peer engine owns the teardown)
    /// close the socket.
    pub(crate) async fn close(&self, state: ClosedState) -> SmppResult<()> {
        let mut gate = self.gate.write().await;
        if gate.closed {
            return Ok(());
        }

        // Stop submitters, then close the channel so the loop drains out.
        self.cancel.cancel();
        gate.tx.take();
        if let Some(handle) = gate.handle.take() {
            let _ = handle.await;
        }

        {
            let mut conn = self.conn.lock().await;
            if let Ok(bytes) = Pdu::Unbind(Unbind::new()).to_bytes() {
                let _ = conn.write(&bytes).await;
            }
            if state != ClosedState::StoppingProcessOnly {
                let _ = conn.shutdown().await;
            }
        }

        gate.closed = true;
        debug!(?state, "writer closed");
        let _ = self.events.send(EngineEvent {
            engine: Engine::Writer,
            state,
        });
        Ok(())
    }

    /// Asynchronous close used from inside the loop; the loop must return
    /// before `close` can join it.
    fn closing(self: &Arc<Self>, state: ClosedState) {
        let writer = self.clone();
        tokio::spawn(async move {
            let _ = writer.close(state).await;
        });
    }

    async fn run(self: Arc<Self>, rx: mpsc::Receiver<Pdu>) {
        if self.settings.enquire_link.is_zero() {
            self.drain_loop(rx).await;
        } else {
            self.enquire_link_loop(rx).await;
        }
    }

    async fn drain_loop(self: &Arc<Self>, mut rx: mpsc::Receiver<Pdu>) {
        while let Some(pdu) = rx.recv().await {
            if self.transmit(&pdu).await {
                return;
            }
        }
    }

    async fn enquire_link_loop(self: &Arc<Self>, mut rx: mpsc::Receiver<Pdu>) {
        let mut ticker = tokio::time::interval(self.settings.enquire_link);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; swallow that so the first probe waits
        // a full period
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let probe = Pdu::EnquireLink(EnquireLink::new());
                    debug!(sequence = probe.sequence_number(), "sending enquire_link");
                    if self.transmit(&probe).await {
                        return;
                    }
                }
                received = rx.recv() => {
                    let Some(pdu) = received else { return };
                    if self.transmit(&pdu).await {
                        return;
                    }
                }
            }
        }
    }

    /// Marshal and write one PDU; true means the loop must stop.
    async fn transmit(self: &Arc<Self>, pdu: &Pdu) -> bool {
        let bytes = match pdu.to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                // A PDU that cannot be marshalled condemns nothing but itself.
                if let Some(cb) = &self.settings.on_submit_error {
                    cb(pdu, &SmppError::Codec(err));
                }
                return false;
            }
        };
        let result = self.conn.lock().await.write(&bytes).await;
        self.check(pdu, result)
    }

    /// Error triage. A partial write leaves a corrupt frame on the wire and
    /// always condemns the connection; a zero-byte failure is judged by its
    /// error kind.
    fn check(self: &Arc<Self>, pdu: &Pdu, result: Result<usize, WriteError>) -> bool {
        let Err(err) = result else { return false };

        if let Some(cb) = &self.settings.on_submit_error {
            cb(pdu, &SmppError::Io(io::Error::new(err.source.kind(), err.source.to_string())));
        }

        let closing = if err.written == 0 {
            is_timeout(&err.source) || !is_temporary(&err.source)
        } else {
            true
        };

        if closing {
            warn!(written = err.written, error = %err.source, "write failed, closing writer");
            self.closing(ClosedState::ConnectionIssue);
        }
        closing
    }
}

fn is_timeout(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::TimedOut
}

fn is_temporary(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    fn settings(enquire_link: Duration) -> WriterSettings {
        WriterSettings {
            enquire_link,
            on_submit_error: None,
        }
    }

    #[test]
    fn enquire_link_normalization() {
        // after normalization the interval is either 0 or >= 20s
        let mut disabled = settings(Duration::ZERO);
        disabled.normalize();
        assert_eq!(disabled.enquire_link, Duration::ZERO);

        let mut short = settings(Duration::from_secs(5));
        short.normalize();
        assert_eq!(short.enquire_link, ENQUIRE_LINK_INTERVAL_MINIMUM);

        let mut long = settings(Duration::from_secs(90));
        long.normalize();
        assert_eq!(long.enquire_link, Duration::from_secs(90));
    }

    async fn writer_pair() -> (Arc<Writer>, TcpStream, mpsc::UnboundedReceiver<EngineEvent>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (peer, _) = listener.accept().await.unwrap();

        let conn = Connection::new(client);
        let (_reader, pdu_writer) = conn.split(Duration::from_secs(1));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let writer = Writer::start(
            Arc::new(Mutex::new(pdu_writer)),
            settings(Duration::ZERO),
            events_tx,
        )
        .await;
        (writer, peer, events_rx)
    }

    #[tokio::test]
    async fn submitted_pdus_reach_the_socket_in_order() {
        let (writer, mut peer, _events) = writer_pair().await;

        let first = Pdu::EnquireLink(EnquireLink { sequence_number: 1 });
        let second = Pdu::EnquireLink(EnquireLink { sequence_number: 2 });
        writer.submit(first.clone()).await.unwrap();
        writer.submit(second.clone()).await.unwrap();

        let mut expected = first.to_bytes().unwrap().to_vec();
        expected.extend_from_slice(&second.to_bytes().unwrap());
        let mut received = vec![0u8; expected.len()];
        peer.read_exact(&mut received).await.unwrap();
        assert_eq!(received, expected);

        writer.close(ClosedState::ExplicitClosing).await.unwrap();
    }

    #[tokio::test]
    async fn submit_after_close_reports_session_closing() {
        let (writer, _peer, _events) = writer_pair().await;
        writer.close(ClosedState::ExplicitClosing).await.unwrap();

        let err = writer
            .submit(Pdu::EnquireLink(EnquireLink::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, SmppError::SessionClosing));
    }

    #[tokio::test]
    async fn close_sends_best_effort_unbind() {
        let (writer, mut peer, _events) = writer_pair().await;
        writer.close(ClosedState::ExplicitClosing).await.unwrap();

        let mut header = [0u8; 16];
        peer.read_exact(&mut header).await.unwrap();
        // command_id of the trailing unbind
        assert_eq!(&header[4..8], &[0x00, 0x00, 0x00, 0x06]);
    }

    // Partial writes always close; zero-byte failures close unless the
    // error is merely temporary.
    async fn triage(
        written: usize,
        kind: io::ErrorKind,
    ) -> (bool, mpsc::UnboundedReceiver<EngineEvent>) {
        let (writer, _peer, events) = writer_pair().await;
        let closing = writer.check(
            &Pdu::EnquireLink(EnquireLink { sequence_number: 1 }),
            Err(WriteError {
                written,
                source: kind.into(),
            }),
        );
        (closing, events)
    }

    #[tokio::test]
    async fn partial_write_always_closes() {
        let (closing, mut events) = triage(5, io::ErrorKind::BrokenPipe).await;
        assert!(closing);
        let event = events.recv().await.unwrap();
        assert_eq!(event.engine, Engine::Writer);
        assert_eq!(event.state, ClosedState::ConnectionIssue);
    }

    #[tokio::test]
    async fn zero_byte_fatal_error_closes() {
        let (closing, mut events) = triage(0, io::ErrorKind::BrokenPipe).await;
        assert!(closing);
        assert_eq!(
            events.recv().await.unwrap().state,
            ClosedState::ConnectionIssue
        );
    }

    #[tokio::test]
    async fn zero_byte_temporary_error_does_not_close() {
        let (closing, _events) = triage(0, io::ErrorKind::Interrupted).await;
        assert!(!closing);
    }

    #[tokio::test]
    async fn zero_byte_timeout_closes() {
        let (closing, _events) = triage(0, io::ErrorKind::TimedOut).await;
        assert!(closing);
    }

    #[tokio::test]
    async fn short_enquire_link_interval_emits_probes() {
        // Build the writer by hand to dodge normalization; nothing else
        // gets an interval under the 20s floor.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();

        let conn = Connection::new(client);
        let (_reader, pdu_writer) = conn.split(Duration::ZERO);
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::channel(1);
        let writer = Arc::new(Writer {
            conn: Arc::new(Mutex::new(pdu_writer)),
            cancel: CancellationToken::new(),
            gate: RwLock::new(Gate {
                closed: false,
                tx: Some(tx),
                handle: None,
            }),
            settings: settings(Duration::from_millis(50)),
            events: events_tx,
        });
        writer.gate.write().await.handle = Some(tokio::spawn({
            let writer = writer.clone();
            async move { writer.run(rx).await }
        }));

        let mut header = [0u8; 16];
        peer.read_exact(&mut header).await.unwrap();
        // command_id of enquire_link
        assert_eq!(&header[4..8], &[0x00, 0x00, 0x00, 0x15]);

        writer.close(ClosedState::ExplicitClosing).await.unwrap();
    }
}
