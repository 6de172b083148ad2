use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Standard TLV tags used in submit_sm / deliver_sm optional parameters.
pub mod tags {
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const SAR_MSG_REF_NUM: u16 = 0x020E;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020F;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x0210;
    pub const MORE_MESSAGES_TO_SEND: u16 = 0x0426;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const MESSAGE_STATE: u16 = 0x0427;
}

/// One optional parameter in tag-length-value form.
///
/// The length on the wire is derived from the value; it is not stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.tag);
        buf.put_u16(self.value.len() as u16);
        buf.extend_from_slice(&self.value);
    }

    pub(crate) fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::Incomplete);
        }
        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::Incomplete);
        }
        let value = buf.copy_to_bytes(length);
        Ok(Self { tag, value })
    }

    /// Decode TLVs until the cursor reaches `end`.
    pub(crate) fn decode_all(
        buf: &mut Cursor<&[u8]>,
        end: usize,
    ) -> Result<Vec<Tlv>, CodecError> {
        let mut tlvs = Vec::new();
        while (buf.position() as usize) < end {
            tlvs.push(Tlv::decode(buf)?);
        }
        Ok(tlvs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let tlv = Tlv::new(tags::RECEIPTED_MESSAGE_ID, &b"abc123\0"[..]);
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf);
        assert_eq!(buf.len(), 4 + 7);

        let bytes = buf.freeze();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(Tlv::decode(&mut cursor).unwrap(), tlv);
    }

    #[test]
    fn truncated_value_is_incomplete() {
        let data = [0x02, 0x04, 0x00, 0x08, 0x01]; // claims 8 bytes, has 1
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Tlv::decode(&mut cursor),
            Err(CodecError::Incomplete)
        ));
    }
}
