//! Client-side SMPP v3.4 session runtime.
//!
//! An ESME talks to an SMSC over one long-lived TCP connection. This crate
//! keeps that conversation alive: it binds with one of the three roles,
//! runs a writer and a reader engine concurrently on the connection, sends
//! periodic enquire_link probes, answers the peer's liveness and unbind
//! requests, and - when the connection dies - rebinds with constant
//! back-off and swaps the fresh client in atomically.
//!
//! ```rust,no_run
//! use smpp_session::{Auth, Pdu, Session, SessionSettings, TcpDialer};
//! use smpp_session::datatypes::{Address, ShortMessage, SubmitSm};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = Auth {
//!         smsc: "smsc.example.net:2775".into(),
//!         system_id: "esme01".into(),
//!         password: "secret".into(),
//!         system_type: String::new(),
//!     };
//!
//!     let settings = SessionSettings {
//!         enquire_link: Duration::from_secs(30),
//!         on_pdu: Some(Arc::new(|pdu, responded| {
//!             println!("received {:?} (auto-responded: {responded})", pdu.command_id());
//!         })),
//!         ..Default::default()
//!     };
//!
//!     let session =
//!         Session::transceiver(TcpDialer, auth, settings, Duration::from_secs(5)).await?;
//!
//!     let submit = SubmitSm::new(
//!         Address::international("84900000001"),
//!         Address::international("84900000002"),
//!         ShortMessage::new("hello from rust")?,
//!     );
//!     session.submit(Pdu::SubmitSm(Box::new(submit))).await?;
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! Long texts are split into concatenated segments with
//! [`datatypes::ShortMessage::long_message_with_encoding`]; each segment
//! carries a user-data header linking it to its siblings.

pub mod codec;
pub mod connect;
pub mod connection;
pub mod datatypes;
pub mod encoding;
pub mod error;
pub mod pdu;
pub mod session;

#[cfg(test)]
mod tests;

pub use connect::{
    connect_as, connect_as_receiver, connect_as_transceiver, connect_as_transmitter, Auth,
    Dialer, TcpDialer,
};
pub use datatypes::BindType;
pub use error::{SmppError, SmppResult};
pub use pdu::Pdu;
pub use session::{Client, ClosedState, Session, SessionSettings};
