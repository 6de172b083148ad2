// SMPP v3.4 wire primitives shared by every PDU type: the 16-byte header,
// C-octet-string helpers and the process-wide sequence number allocator.

use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion on a hostile peer.
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU header (16 bytes, common to all PDUs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode a PDU header from the buffer with validation.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::InvalidCommandId(command_id_raw))?;
        let command_status = CommandStatus::from_u32(buf.get_u32());
        let sequence_number = buf.get_u32();

        if command_length < Self::SIZE as u32 || command_length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode the header. `command_length` is back-patched by the caller
    /// once the body size is known.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status.as_u32());
        buf.put_u32(self.sequence_number);
    }
}

/// Codec errors with context for debugging a broken stream.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("incomplete PDU: need more data")]
    Incomplete,

    #[error("invalid command_id: {0:#010x}")]
    InvalidCommandId(u32),

    #[error("invalid PDU length {length} (allowed {min}..={max})")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("PDU body ends before its command_length")]
    TruncatedBody,

    #[error("C-octet string not null-terminated")]
    UnterminatedCString,

    #[error("C-octet string is not valid UTF-8")]
    NonUtf8CString,

    #[error("truncated user data header")]
    TruncatedUdh,

    #[error("short message length {0} exceeds 255 octets")]
    ShortMessageTooLong(usize),

    #[error("cannot encode PDU: {0}")]
    Unencodable(&'static str),
}

/// Read a null-terminated string from the cursor.
pub(crate) fn get_cstring(buf: &mut Cursor<&[u8]>) -> Result<String, CodecError> {
    let start = buf.position() as usize;
    let slice = *buf.get_ref();
    let nul = slice[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(CodecError::UnterminatedCString)?;
    let s = std::str::from_utf8(&slice[start..start + nul])
        .map_err(|_| CodecError::NonUtf8CString)?
        .to_owned();
    buf.set_position((start + nul + 1) as u64);
    Ok(s)
}

/// Write a string followed by the null terminator.
pub(crate) fn put_cstring(buf: &mut BytesMut, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.put_u8(0);
}

// Sequence numbers are drawn from one process-wide counter so that every
// request PDU created anywhere in the process gets a distinct number.
// Valid range is 1..=0x7FFFFFFF; the counter wraps inside it.
static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Allocate the next PDU sequence number.
pub fn next_sequence_number() -> u32 {
    (SEQUENCE.fetch_add(1, Ordering::Relaxed) % 0x7FFF_FFFF) + 1
}
