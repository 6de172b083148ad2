// ABOUTME: Client - one writer plus one reader bound to one authenticated connection
// ABOUTME: A monitor task turns either engine's failure into a mutual shutdown and one upward event

use crate::connection::{Connection, PduWriter};
use crate::error::SmppResult;
use crate::pdu::Pdu;
use crate::session::reader::{Reader, ReaderSettings};
use crate::session::settings::{ClosedState, SessionSettings};
use crate::session::writer::{Writer, WriterSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Which engine reported a closed event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Engine {
    Writer,
    Reader,
}

/// A closed notification from one engine to the client's monitor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EngineEvent {
    pub engine: Engine,
    pub state: ClosedState,
}

/// One authenticated connection with its writer and reader engines.
///
/// Cheap to clone; the session swaps whole clients atomically on rebind.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    writer: Arc<Writer>,
    reader: Arc<Reader>,
    conn: Arc<Mutex<PduWriter>>,
    state: AtomicBool,
    system_id: String,
    settings: SessionSettings,
}

impl Client {
    /// Wire both engines onto a bound connection and start them.
    pub async fn new(conn: Connection, settings: SessionSettings) -> Client {
        let system_id = conn.system_id().to_owned();
        let (pdu_reader, pdu_writer) = conn.split(settings.write_timeout);
        let conn = Arc::new(Mutex::new(pdu_writer));

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let writer = Writer::start(
            conn.clone(),
            WriterSettings {
                enquire_link: settings.enquire_link,
                on_submit_error: settings.on_submit_error.clone(),
            },
            events_tx.clone(),
        )
        .await;

        let reader = Reader::start(
            pdu_reader,
            conn.clone(),
            writer.clone(),
            ReaderSettings {
                timeout: settings.read_timeout,
                on_pdu: settings.on_pdu.clone(),
                on_receiving_error: settings.on_receiving_error.clone(),
            },
            events_tx,
        )
        .await;

        let inner = Arc::new(ClientInner {
            writer,
            reader,
            conn,
            state: AtomicBool::new(false),
            system_id,
            settings,
        });

        tokio::spawn(monitor(Arc::downgrade(&inner), events_rx));

        Client { inner }
    }

    /// The peer's system_id from the bind response.
    pub fn system_id(&self) -> &str {
        &self.inner.system_id
    }

    /// Enqueue a PDU for transmission.
    pub async fn submit(&self, pdu: Pdu) -> SmppResult<()> {
        self.inner.writer.submit(pdu).await
    }

    /// Close both engines and the connection. One-shot; later calls are
    /// no-ops.
    pub async fn close(&self) -> SmppResult<()> {
        if self
            .inner
            .state
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let _ = self.inner.writer.close(ClosedState::StoppingProcessOnly).await;
        let _ = self.inner.reader.close(ClosedState::StoppingProcessOnly).await;
        let _ = self.inner.conn.lock().await.shutdown().await;

        self.inner.notify(ClosedState::ExplicitClosing);
        Ok(())
    }
}

impl ClientInner {
    fn notify(&self, state: ClosedState) {
        if let Some(cb) = &self.settings.on_closed {
            cb(state);
        }
    }
}

/// Supervise the engine pair: when one engine dies on its own, stop the
/// other without re-closing the socket, then report upward once.
/// `ExplicitClosing` and `StoppingProcessOnly` events are absorbed; their
/// originators already own the propagation.
async fn monitor(
    client: Weak<ClientInner>,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(client) = client.upgrade() else { return };
        debug!(engine = ?event.engine, state = ?event.state, "engine closed");

        match (event.engine, event.state) {
            (Engine::Writer, ClosedState::ConnectionIssue) => {
                let _ = client.reader.close(ClosedState::StoppingProcessOnly).await;
                client.notify(ClosedState::ConnectionIssue);
            }
            (
                Engine::Reader,
                state @ (ClosedState::InvalidStreaming | ClosedState::UnbindClosing),
            ) => {
                let _ = client.writer.close(ClosedState::StoppingProcessOnly).await;
                client.notify(state);
            }
            _ => {}
        }
    }
}
