use crate::codec::{get_cstring, put_cstring, CodecError};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// An SMPP address triple: type-of-number, numbering-plan indicator and the
/// address digits. Used for both source and destination of a short message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub ton: u8,
    pub npi: u8,
    pub address: String,
}

impl Address {
    pub fn new(ton: u8, npi: u8, address: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            address: address.into(),
        }
    }

    /// International ISDN numbering, the common case for MSISDNs.
    pub fn international(address: impl Into<String>) -> Self {
        Self::new(0x01, 0x01, address)
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&[self.ton, self.npi]);
        put_cstring(buf, &self.address);
    }

    pub(crate) fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 2 {
            return Err(CodecError::Incomplete);
        }
        let ton = buf.get_u8();
        let npi = buf.get_u8();
        let address = get_cstring(buf)?;
        Ok(Self { ton, npi, address })
    }
}
