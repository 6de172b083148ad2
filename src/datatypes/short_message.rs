// ABOUTME: The short_message body fragment carried inside submit_sm / deliver_sm
// ABOUTME: Owns encoding, optional UDH and the splitting of long texts into linked segments

use crate::codec::CodecError;
use crate::datatypes::udh::{InformationElement, Udh};
use crate::encoding::{self, TextEncoding};
use crate::error::{SmppError, SmppResult};
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};

/// Hard ceiling for the short_message field on the wire.
pub const MAX_SHORT_MESSAGE_OCTETS: usize = 254;

/// Octets a concatenation UDH occupies in each segment.
const CONCAT_UDH_OCTETS: usize = 6;

// All segments of one long message share a reference drawn from this
// counter; only the low 8 bits travel in the UDH.
static CONCAT_REF: AtomicU32 = AtomicU32::new(0);

fn next_concat_reference() -> u32 {
    CONCAT_REF.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// A short message body: encoded payload plus the metadata octets that
/// surround it (`data_coding`, `sm_default_msg_id`, optional UDH).
///
/// When embedded in container PDUs that carry the data_coding elsewhere,
/// `without_data_coding` suppresses that octet on the wire.
#[derive(Clone)]
pub struct ShortMessage {
    pub sm_default_msg_id: u8,
    data_coding: u8,
    message: String,
    enc: &'static dyn TextEncoding,
    udh: Option<Udh>,
    message_data: Vec<u8>,
    without_data_coding: bool,
}

impl Default for ShortMessage {
    fn default() -> Self {
        Self {
            sm_default_msg_id: 0,
            data_coding: encoding::GSM7.data_coding(),
            message: String::new(),
            enc: &encoding::GSM7,
            udh: None,
            message_data: Vec::new(),
            without_data_coding: false,
        }
    }
}

impl ShortMessage {
    /// Text message in the GSM 7-bit default alphabet.
    pub fn new(message: &str) -> SmppResult<Self> {
        Self::with_encoding(message, &encoding::GSM7)
    }

    /// Text message in a chosen encoding.
    pub fn with_encoding(message: &str, enc: &'static dyn TextEncoding) -> SmppResult<Self> {
        let mut sm = Self::default();
        sm.set_message_with_encoding(message, enc)?;
        Ok(sm)
    }

    /// Raw binary payload, 8-bit data coding.
    pub fn binary(message_data: Vec<u8>) -> Self {
        Self::binary_with_data_coding(message_data, encoding::BINARY.data_coding())
    }

    /// Raw binary payload with an explicit data_coding byte.
    pub fn binary_with_data_coding(message_data: Vec<u8>, data_coding: u8) -> Self {
        let mut sm = Self::default();
        sm.message_data = message_data;
        sm.set_data_coding(data_coding);
        sm
    }

    /// Long text message, pre-split into concatenated segments.
    pub fn long_message(message: &str) -> SmppResult<Vec<Self>> {
        Self::long_message_with_encoding(message, &encoding::GSM7)
    }

    /// Long text message in a chosen encoding, pre-split into concatenated
    /// segments.
    pub fn long_message_with_encoding(
        message: &str,
        enc: &'static dyn TextEncoding,
    ) -> SmppResult<Vec<Self>> {
        let sm = Self {
            message: message.to_owned(),
            enc,
            data_coding: enc.data_coding(),
            ..Self::default()
        };
        sm.split()
    }

    /// Replace the message text, re-encoding it with `enc`. Fails when the
    /// encoded form does not fit a single wire field.
    pub fn set_message_with_encoding(
        &mut self,
        message: &str,
        enc: &'static dyn TextEncoding,
    ) -> SmppResult<()> {
        let encoded = enc.encode(message)?;
        if encoded.len() > MAX_SHORT_MESSAGE_OCTETS {
            return Err(SmppError::ShortMessageLengthTooLarge);
        }
        self.message_data = encoded;
        self.message = message.to_owned();
        self.enc = enc;
        self.data_coding = enc.data_coding();
        Ok(())
    }

    pub fn data_coding(&self) -> u8 {
        self.data_coding
    }

    /// Set the data_coding byte and rebind the encoding strategy from the
    /// registry.
    pub fn set_data_coding(&mut self, data_coding: u8) {
        self.data_coding = data_coding;
        self.enc = encoding::from_data_coding(data_coding);
    }

    pub fn encoding(&self) -> &'static dyn TextEncoding {
        self.enc
    }

    pub fn udh(&self) -> Option<&Udh> {
        self.udh.as_ref()
    }

    pub fn set_udh(&mut self, udh: Udh) {
        self.udh = Some(udh);
    }

    /// Whether the data_coding octet is emitted when marshalled.
    pub fn without_data_coding(&self) -> bool {
        self.without_data_coding
    }

    pub fn set_without_data_coding(&mut self, without: bool) {
        self.without_data_coding = without;
    }

    /// Raw payload including any UDH prefix left in place by unmarshalling.
    pub fn raw_message_data(&self) -> &[u8] {
        &self.message_data
    }

    pub fn set_message_data(&mut self, message_data: Vec<u8>) {
        self.message_data = message_data;
    }

    fn udhl(&self) -> usize {
        self.udh.as_ref().map_or(0, Udh::udhl)
    }

    /// Payload octets with the UDH prefix skipped.
    pub fn message_data(&self) -> SmppResult<&[u8]> {
        if self.message_data.is_empty() {
            return Ok(&[]);
        }
        let skip = self.udhl();
        if skip >= self.message_data.len() {
            return Err(SmppError::UdhTooLong);
        }
        Ok(&self.message_data[skip..])
    }

    /// Payload decoded with the message's own encoding.
    pub fn message(&self) -> SmppResult<String> {
        self.message_with_encoding(self.enc)
    }

    /// Payload decoded with an explicit encoding.
    pub fn message_with_encoding(&self, enc: &dyn TextEncoding) -> SmppResult<String> {
        enc.decode(self.message_data()?)
    }

    /// Split into concatenated segments per 3GPP TS 23.040 9.2.3.24.1.
    ///
    /// Returns a single segment when the encoding has no splitting
    /// capability or the text already fits; otherwise every segment carries
    /// a concatenation UDH with a shared reference number.
    pub fn split(mut self) -> SmppResult<Vec<Self>> {
        let enc = self.enc;
        let splitter = match enc.splitter() {
            Some(splitter) if splitter.should_split(&self.message) => splitter,
            _ => {
                // Binary payloads carry no source text; leave them untouched.
                if !self.message.is_empty() || self.message_data.is_empty() {
                    let message = std::mem::take(&mut self.message);
                    self.set_message_with_encoding(&message, enc)?;
                }
                return Ok(vec![self]);
            }
        };

        // Reserve room for the 6-octet concatenation UDH in every segment.
        let octet_limit = enc.max_single_segment_octets() - CONCAT_UDH_OCTETS;
        let segments = splitter.encode_split(&self.message, octet_limit)?;

        let reference = next_concat_reference() as u8;
        let total = segments.len() as u8;
        let multi = segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| Self {
                sm_default_msg_id: 0,
                enc,
                data_coding: enc.data_coding(),
                message: String::new(),
                message_data: seg,
                without_data_coding: self.without_data_coding,
                udh: Some(Udh::new(InformationElement::concatenated_message(
                    reference,
                    total,
                    i as u8 + 1,
                ))),
            })
            .collect();
        Ok(multi)
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let mut udh_bytes = BytesMut::new();
        if let Some(udh) = &self.udh {
            udh.encode(&mut udh_bytes);
        }

        let sm_length = self.message_data.len() + udh_bytes.len();
        if sm_length > 255 {
            return Err(CodecError::ShortMessageTooLong(sm_length));
        }

        if !self.without_data_coding {
            buf.put_u8(self.data_coding);
        }
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(sm_length as u8);
        buf.extend_from_slice(&udh_bytes);
        buf.extend_from_slice(&self.message_data);
        Ok(())
    }

    /// Decode from the wire. `udhi` is the User-Data-Header-Indicator bit
    /// of the enclosing PDU's esm_class. The UDH prefix is parsed but left
    /// in `message_data`; accessors skip it on read.
    pub(crate) fn decode(
        buf: &mut Cursor<&[u8]>,
        udhi: bool,
        without_data_coding: bool,
    ) -> Result<Self, CodecError> {
        let mut sm = Self {
            without_data_coding,
            ..Self::default()
        };

        if !without_data_coding {
            if buf.remaining() < 1 {
                return Err(CodecError::Incomplete);
            }
            sm.set_data_coding(buf.get_u8());
        }

        if buf.remaining() < 2 {
            return Err(CodecError::Incomplete);
        }
        sm.sm_default_msg_id = buf.get_u8();
        let n = buf.get_u8() as usize;

        if buf.remaining() < n {
            return Err(CodecError::Incomplete);
        }
        let mut data = vec![0u8; n];
        buf.copy_to_slice(&mut data);
        sm.message_data = data;

        // A zero-length short message with UDHI set keeps its header in the
        // message_payload TLV instead; nothing to parse here.
        if udhi && n > 0 {
            let (udh, _) = Udh::parse(&sm.message_data)?;
            sm.udh = Some(udh);
        }

        Ok(sm)
    }
}

impl fmt::Debug for ShortMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortMessage")
            .field("sm_default_msg_id", &self.sm_default_msg_id)
            .field("data_coding", &self.data_coding)
            .field("encoding", &self.enc.name())
            .field("udh", &self.udh)
            .field("message_data_len", &self.message_data.len())
            .field("without_data_coding", &self.without_data_coding)
            .finish()
    }
}

impl PartialEq for ShortMessage {
    fn eq(&self, other: &Self) -> bool {
        self.sm_default_msg_id == other.sm_default_msg_id
            && self.data_coding == other.data_coding
            && self.udh == other.udh
            && self.message_data == other.message_data
            && self.without_data_coding == other.without_data_coding
    }
}
