// ABOUTME: Session supervisor - holds the live client atomically and rebinds after any loss
// ABOUTME: Wraps the client's closed event so every non-explicit close triggers reconnection

mod client;
mod reader;
mod settings;
mod writer;

pub use client::Client;
pub use settings::{
    ClosedCallback, ClosedState, ErrorCallback, PduCallback, PduErrorCallback, SessionSettings,
    DEFAULT_READ_TIMEOUT, ENQUIRE_LINK_INTERVAL_MINIMUM,
};

use crate::connect::{connect_as, Auth, Dialer, TcpDialer};
use crate::datatypes::BindType;
use crate::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A long-lived, authenticated SMPP session.
///
/// The session owns one [`Client`] at a time. When the client dies for any
/// reason other than an explicit `close()`, and a rebinding interval is
/// configured, the session reconnects and re-authenticates in a loop,
/// swapping the fresh client in atomically. PDUs in flight at the moment
/// of a disconnect are lost; resubmission is the caller's business.
///
/// Cheap to clone; all clones share the same supervisor state.
pub struct Session<D: Dialer = TcpDialer> {
    inner: Arc<SessionInner<D>>,
}

impl<D: Dialer> Clone for Session<D> {
    fn clone(&self) -> Self {
        Session {
            inner: self.inner.clone(),
        }
    }
}

struct SessionInner<D: Dialer> {
    dialer: D,
    auth: Auth,
    bind_type: BindType,
    /// Settings with `on_closed` already wrapped for rebind triggering.
    settings: SessionSettings,
    rebinding_interval: Duration,
    client: ArcSwapOption<Client>,
    closed: AtomicBool,
    rebinding: AtomicBool,
}

impl<D: Dialer> Session<D> {
    /// Bind to the SMSC and start the engines.
    ///
    /// `rebinding_interval` is the constant back-off between reconnect
    /// attempts; zero disables auto-rebind entirely.
    pub async fn new(
        bind_type: BindType,
        dialer: D,
        auth: Auth,
        settings: SessionSettings,
        rebinding_interval: Duration,
    ) -> SmppResult<Session<D>> {
        let conn = connect_as(bind_type, &dialer, &auth).await?;

        let inner = Arc::new_cyclic(|weak: &Weak<SessionInner<D>>| {
            let effective = if rebinding_interval.is_zero() {
                settings.clone()
            } else {
                let mut wrapped = settings.clone();
                wrapped.on_closed = Some(wrap_on_closed(weak.clone(), settings.on_closed.clone()));
                wrapped
            };
            SessionInner {
                dialer,
                auth,
                bind_type,
                settings: effective,
                rebinding_interval,
                client: ArcSwapOption::empty(),
                closed: AtomicBool::new(false),
                rebinding: AtomicBool::new(false),
            }
        });

        let client = Client::new(conn, inner.settings.clone()).await;
        inner.client.store(Some(Arc::new(client)));

        Ok(Session { inner })
    }

    /// Bind as a receiver.
    pub async fn receiver(
        dialer: D,
        auth: Auth,
        settings: SessionSettings,
        rebinding_interval: Duration,
    ) -> SmppResult<Session<D>> {
        Session::new(BindType::Receiver, dialer, auth, settings, rebinding_interval).await
    }

    /// Bind as a transmitter.
    pub async fn transmitter(
        dialer: D,
        auth: Auth,
        settings: SessionSettings,
        rebinding_interval: Duration,
    ) -> SmppResult<Session<D>> {
        Session::new(
            BindType::Transmitter,
            dialer,
            auth,
            settings,
            rebinding_interval,
        )
        .await
    }

    /// Bind as a transceiver.
    pub async fn transceiver(
        dialer: D,
        auth: Auth,
        settings: SessionSettings,
        rebinding_interval: Duration,
    ) -> SmppResult<Session<D>> {
        Session::new(
            BindType::Transceiver,
            dialer,
            auth,
            settings,
            rebinding_interval,
        )
        .await
    }

    /// Submit a PDU through the current client.
    ///
    /// While a rebind is in progress this fails with
    /// [`SmppError::SessionClosing`]; the caller decides whether to retry.
    /// Nothing is queued across rebinds.
    pub async fn submit(&self, pdu: Pdu) -> SmppResult<()> {
        match self.inner.client.load_full() {
            Some(client) => client.submit(pdu).await,
            None => Err(SmppError::SessionClosing),
        }
    }

    /// The SMSC's system_id from the most recent bind response.
    pub fn system_id(&self) -> String {
        self.inner
            .client
            .load_full()
            .map(|client| client.system_id().to_owned())
            .unwrap_or_default()
    }

    /// Close the session for good. One-shot; the rebind loop stops.
    pub async fn close(&self) -> SmppResult<()> {
        if self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(client) = self.inner.client.load_full() {
                client.close().await?;
            }
        }
        Ok(())
    }
}

/// Compose the user's closed callback with the rebind trigger: explicit
/// closes pass silently, everything else notifies the user and kicks off a
/// reconnect.
fn wrap_on_closed<D: Dialer>(
    session: Weak<SessionInner<D>>,
    user_on_closed: Option<ClosedCallback>,
) -> ClosedCallback {
    Arc::new(move |state| {
        if state == ClosedState::ExplicitClosing {
            return;
        }
        if let Some(cb) = &user_on_closed {
            cb(state);
        }
        if let Some(session) = session.upgrade() {
            tokio::spawn(async move {
                session.rebind().await;
            });
        }
    })
}

impl<D: Dialer> SessionInner<D> {
    /// Reconnect loop: close whatever client is left, then keep dialing and
    /// binding with constant back-off until it works or the session is
    /// closed. Only one rebind runs at a time.
    async fn rebind(self: Arc<Self>) {
        if self
            .rebinding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        if let Some(client) = self.client.load_full() {
            let _ = client.close().await;
        }

        while !self.closed.load(Ordering::Acquire) {
            match connect_as(self.bind_type, &self.dialer, &self.auth).await {
                Err(err) => {
                    warn!(error = %err, "rebind attempt failed");
                    if let Some(cb) = &self.settings.on_rebinding_error {
                        cb(&err);
                    }
                    sleep(self.rebinding_interval).await;
                }
                Ok(conn) => {
                    debug!(system_id = conn.system_id(), "rebound to SMSC");
                    let client = Client::new(conn, self.settings.clone()).await;
                    self.client.store(Some(Arc::new(client)));
                    self.rebinding.store(false, Ordering::Release);
                    return;
                }
            }
        }
    }
}
