// ABOUTME: Bind request/response PDUs for the three ESME session roles
// ABOUTME: One request shape parameterized by BindType instead of three near-identical structs

use crate::codec::{get_cstring, next_sequence_number, put_cstring, CodecError, PduHeader};
use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// SMPP v3.4 interface version byte.
pub const INTERFACE_VERSION_34: u8 = 0x34;

/// The role an ESME binds with. Fixed for the lifetime of a session and
/// reused on every rebind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindType {
    Receiver,
    Transmitter,
    Transceiver,
}

impl BindType {
    pub fn request_id(self) -> CommandId {
        match self {
            BindType::Receiver => CommandId::BindReceiver,
            BindType::Transmitter => CommandId::BindTransmitter,
            BindType::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_id(self) -> CommandId {
        match self {
            BindType::Receiver => CommandId::BindReceiverResp,
            BindType::Transmitter => CommandId::BindTransmitterResp,
            BindType::Transceiver => CommandId::BindTransceiverResp,
        }
    }
}

/// bind_receiver / bind_transmitter / bind_transceiver request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindRequest {
    pub bind_type: BindType,
    pub sequence_number: u32,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
}

impl BindRequest {
    pub fn new(bind_type: BindType) -> Self {
        Self {
            bind_type,
            sequence_number: next_sequence_number(),
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: INTERFACE_VERSION_34,
            addr_ton: 0,
            addr_npi: 0,
            address_range: String::new(),
        }
    }

    pub(crate) fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id);
        put_cstring(buf, &self.password);
        put_cstring(buf, &self.system_type);
        buf.put_u8(self.interface_version);
        buf.put_u8(self.addr_ton);
        buf.put_u8(self.addr_npi);
        put_cstring(buf, &self.address_range);
    }

    pub(crate) fn decode_body(
        header: &PduHeader,
        bind_type: BindType,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, CodecError> {
        let system_id = get_cstring(buf)?;
        let password = get_cstring(buf)?;
        let system_type = get_cstring(buf)?;
        if buf.remaining() < 3 {
            return Err(CodecError::Incomplete);
        }
        let interface_version = buf.get_u8();
        let addr_ton = buf.get_u8();
        let addr_npi = buf.get_u8();
        let address_range = get_cstring(buf)?;
        Ok(Self {
            bind_type,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }

    pub fn response(&self, system_id: impl Into<String>) -> BindResponse {
        BindResponse {
            bind_type: self.bind_type,
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            system_id: system_id.into(),
        }
    }
}

/// bind_*_resp carrying the SMSC's own system_id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindResponse {
    pub bind_type: BindType,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
}

impl BindResponse {
    pub(crate) fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id);
    }

    pub(crate) fn decode_body(
        header: &PduHeader,
        bind_type: BindType,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, CodecError> {
        // Some SMSCs send an empty body on a rejected bind.
        let system_id = if buf.has_remaining() {
            get_cstring(buf)?
        } else {
            String::new()
        };
        Ok(Self {
            bind_type,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
        })
    }
}
