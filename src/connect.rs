// ABOUTME: Dialing and the bind handshake - the single entry point used for
// ABOUTME: the initial connect and for every rebind

use crate::connection::Connection;
use crate::datatypes::{BindRequest, BindType};
use crate::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use std::future::Future;
use std::io;
use tokio::net::TcpStream;
use tracing::debug;

/// Basic authentication against an SMSC.
#[derive(Clone, Debug, Default)]
pub struct Auth {
    /// SMSC address in `host:port` form.
    pub smsc: String,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
}

/// Connection dialer. Swap in an implementation to add TLS, a SOCKS hop or
/// a test transport; the session keeps it for rebinds.
pub trait Dialer: Send + Sync + 'static {
    fn dial(&self, addr: &str) -> impl Future<Output = io::Result<TcpStream>> + Send;
}

/// Plain TCP dialer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    async fn dial(&self, addr: &str) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}

fn new_bind_request(auth: &Auth, bind_type: BindType) -> BindRequest {
    let mut req = BindRequest::new(bind_type);
    req.system_id = auth.system_id.clone();
    req.password = auth.password.clone();
    req.system_type = auth.system_type.clone();
    req
}

/// Dial the SMSC and authenticate with the given role. Returns a bound
/// connection carrying the peer's system_id, or closes the socket and
/// reports why the bind was refused.
pub async fn connect_as<D: Dialer>(
    bind_type: BindType,
    dialer: &D,
    auth: &Auth,
) -> SmppResult<Connection> {
    let stream = dialer.dial(&auth.smsc).await?;
    let mut conn = Connection::new(stream);

    let request = new_bind_request(auth, bind_type);
    conn.write_pdu(&Pdu::BindRequest(request)).await?;

    match conn.read_pdu().await? {
        Pdu::BindResponse(resp) if resp.command_status.is_ok() => {
            debug!(system_id = %resp.system_id, ?bind_type, "bound to SMSC");
            conn.set_system_id(resp.system_id);
            Ok(conn)
        }
        Pdu::BindResponse(resp) => Err(SmppError::BindFailed(resp.command_status)),
        other => Err(SmppError::UnexpectedPdu {
            expected: "bind response",
            actual: other.command_id().name(),
        }),
    }
}

/// Bind as a receiver.
pub async fn connect_as_receiver<D: Dialer>(dialer: &D, auth: &Auth) -> SmppResult<Connection> {
    connect_as(BindType::Receiver, dialer, auth).await
}

/// Bind as a transmitter.
pub async fn connect_as_transmitter<D: Dialer>(dialer: &D, auth: &Auth) -> SmppResult<Connection> {
    connect_as(BindType::Transmitter, dialer, auth).await
}

/// Bind as a transceiver.
pub async fn connect_as_transceiver<D: Dialer>(dialer: &D, auth: &Auth) -> SmppResult<Connection> {
    connect_as(BindType::Transceiver, dialer, auth).await
}
