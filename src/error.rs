// ABOUTME: Operation-level error type for SMPP session operations
// ABOUTME: Covers I/O, codec, bind and submit failures plus the session sentinels

use crate::codec::CodecError;
use crate::datatypes::CommandStatus;
use std::io;
use thiserror::Error;

/// Error type for session operations.
///
/// Wire-level problems are reported as [`SmppError::Codec`]; everything the
/// engines and the supervisor can fail with has its own variant so callers
/// can match on it.
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during connect, read or write
    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    /// PDU encode/decode error
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Session (or its writer) is closing; the PDU was not submitted
    #[error("session is closing, cannot send PDU to SMSC")]
    SessionClosing,

    /// SMSC rejected the bind request
    #[error("bind rejected by SMSC: {0:?}")]
    BindFailed(CommandStatus),

    /// Peer closed the connection mid-handshake
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A different PDU arrived than the handshake expected
    #[error("unexpected PDU: expected {expected}, got {actual}")]
    UnexpectedPdu {
        expected: &'static str,
        actual: &'static str,
    },

    /// Encoded short-message payload does not fit a single segment
    #[error("short message length exceeds the single-segment limit")]
    ShortMessageLengthTooLarge,

    /// Declared user-data header is at least as long as the payload
    #[error("user data header longer than the short message payload")]
    UdhTooLong,

    /// Message text cannot be represented in the chosen encoding
    #[error("message is not representable in {encoding}")]
    Unencodable { encoding: &'static str },

    /// Payload bytes are not valid under the chosen encoding
    #[error("payload is not valid {encoding}")]
    MalformedPayload { encoding: &'static str },
}

/// Result alias used across the crate.
pub type SmppResult<T> = Result<T, SmppError>;
