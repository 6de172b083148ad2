// ABOUTME: Session configuration: timeouts, keep-alive interval and event callbacks
// ABOUTME: Also defines the ClosedState enum surfaced through on_closed

use crate::error::SmppError;
use crate::pdu::Pdu;
use std::sync::Arc;
use std::time::Duration;

/// Why an engine (or the whole client) closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosedState {
    /// The user called `close()`.
    ExplicitClosing,
    /// Internal: stop the peer engine's loop without touching the socket;
    /// the initiating close path owns the socket teardown.
    StoppingProcessOnly,
    /// A write failed in a way that condemns the connection.
    ConnectionIssue,
    /// A read or parse failed; the inbound stream is unusable.
    InvalidStreaming,
    /// The peer sent unbind and was acknowledged.
    UnbindClosing,
}

/// Received-PDU callback; `responded` reports that the core already sent
/// the mechanical response.
pub type PduCallback = Arc<dyn Fn(Pdu, bool) + Send + Sync>;

/// Failed-submit callback: the PDU that did not go out, and why.
pub type PduErrorCallback = Arc<dyn Fn(&Pdu, &SmppError) + Send + Sync>;

pub type ErrorCallback = Arc<dyn Fn(&SmppError) + Send + Sync>;

pub type ClosedCallback = Arc<dyn Fn(ClosedState) + Send + Sync>;

/// Floor for the enquire_link interval; anything shorter hammers the SMSC.
pub const ENQUIRE_LINK_INTERVAL_MINIMUM: Duration = Duration::from_secs(20);

/// Read deadline applied when none is configured. The read deadline is the
/// only detector for a silently dead TCP peer, so it must not be unbounded.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for a session and the client it (re)creates on every bind.
#[derive(Clone, Default)]
pub struct SessionSettings {
    /// Per-write socket deadline; zero disables.
    pub write_timeout: Duration,

    /// Per-read socket deadline. Zero selects [`DEFAULT_READ_TIMEOUT`].
    pub read_timeout: Duration,

    /// Interval between automatic enquire_link probes. Zero disables;
    /// non-zero values are raised to [`ENQUIRE_LINK_INTERVAL_MINIMUM`].
    pub enquire_link: Duration,

    /// Every PDU received from the SMSC.
    pub on_pdu: Option<PduCallback>,

    /// A PDU failed to reach the wire.
    pub on_submit_error: Option<PduErrorCallback>,

    /// An error occurred while reading from the SMSC.
    pub on_receiving_error: Option<ErrorCallback>,

    /// A rebind attempt failed; the loop sleeps and retries.
    pub on_rebinding_error: Option<ErrorCallback>,

    /// The client closed, with the reason.
    pub on_closed: Option<ClosedCallback>,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("write_timeout", &self.write_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("enquire_link", &self.enquire_link)
            .finish_non_exhaustive()
    }
}
