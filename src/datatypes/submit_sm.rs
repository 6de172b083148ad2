// ABOUTME: submit_sm / submit_sm_resp - ESME-originated short message submission
// ABOUTME: Mandatory parameters plus generic TLVs; the message body is a ShortMessage

use crate::codec::{get_cstring, next_sequence_number, put_cstring, CodecError, PduHeader};
use crate::datatypes::{Address, CommandStatus, ShortMessage, Tlv, ESM_CLASS_UDHI};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// submit_sm mandatory parameters (SMPP v3.4 section 4.4.1).
///
/// `data_coding`, `sm_default_msg_id` and `sm_length` travel inside
/// [`ShortMessage`].
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub sequence_number: u32,
    pub service_type: String,
    pub source_addr: Address,
    pub dest_addr: Address,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub message: ShortMessage,
    pub tlvs: Vec<Tlv>,
}

impl SubmitSm {
    pub fn new(source_addr: Address, dest_addr: Address, message: ShortMessage) -> Self {
        let esm_class = if message.udh().is_some() {
            ESM_CLASS_UDHI
        } else {
            0
        };
        Self {
            sequence_number: next_sequence_number(),
            service_type: String::new(),
            source_addr,
            dest_addr,
            esm_class,
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            replace_if_present_flag: 0,
            message,
            tlvs: Vec::new(),
        }
    }

    pub fn has_udhi(&self) -> bool {
        self.esm_class & ESM_CLASS_UDHI != 0
    }

    pub(crate) fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        put_cstring(buf, &self.service_type);
        self.source_addr.encode(buf);
        self.dest_addr.encode(buf);
        buf.put_u8(self.esm_class);
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag);
        put_cstring(buf, &self.schedule_delivery_time);
        put_cstring(buf, &self.validity_period);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        self.message.encode(buf)?;
        for tlv in &self.tlvs {
            tlv.encode(buf);
        }
        Ok(())
    }

    pub(crate) fn decode_body(
        header: &PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, CodecError> {
        let service_type = get_cstring(buf)?;
        let source_addr = Address::decode(buf)?;
        let dest_addr = Address::decode(buf)?;
        if buf.remaining() < 3 {
            return Err(CodecError::Incomplete);
        }
        let esm_class = buf.get_u8();
        let protocol_id = buf.get_u8();
        let priority_flag = buf.get_u8();
        let schedule_delivery_time = get_cstring(buf)?;
        let validity_period = get_cstring(buf)?;
        if buf.remaining() < 2 {
            return Err(CodecError::Incomplete);
        }
        let registered_delivery = buf.get_u8();
        let replace_if_present_flag = buf.get_u8();
        let udhi = esm_class & ESM_CLASS_UDHI != 0;
        let message = ShortMessage::decode(buf, udhi, false)?;
        let tlvs = Tlv::decode_all(buf, header.command_length as usize)?;

        Ok(Self {
            sequence_number: header.sequence_number,
            service_type,
            source_addr,
            dest_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            message,
            tlvs,
        })
    }

    pub fn response(&self) -> SubmitSmResp {
        SubmitSmResp {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            message_id: String::new(),
        }
    }
}

/// submit_sm_resp carrying the SMSC-assigned message id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitSmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl SubmitSmResp {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id);
    }

    pub(crate) fn decode_body(
        header: &PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, CodecError> {
        // Rejecting SMSCs may omit the message_id entirely.
        let message_id = if buf.has_remaining() {
            get_cstring(buf)?
        } else {
            String::new()
        };
        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}
