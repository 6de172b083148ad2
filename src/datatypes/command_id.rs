// ABOUTME: SMPP v3.4 command identifiers for the PDU types this runtime handles
// ABOUTME: Bit 31 of the command_id distinguishes responses from requests

use num_enum::TryFromPrimitive;

/// SMPP v3.4 command identifiers (specification Table 4-1).
///
/// Only the operations an ESME session runtime exchanges are listed; any
/// other value on the wire is surfaced as a codec error and tears down the
/// reader.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// generic_nack - error response for an unintelligible PDU
    GenericNack = 0x8000_0000,

    /// bind_receiver - open a receive-only session
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    /// bind_transmitter - open a transmit-only session
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    /// bind_transceiver - open a duplex session
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,

    /// submit_sm - submit a short message to the SMSC
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    /// deliver_sm - SMSC delivers a short message to the ESME
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,

    /// unbind - graceful session termination
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,

    /// enquire_link - liveness probe, either direction
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
}

impl CommandId {
    /// True when bit 31 is set, i.e. this identifies a response PDU.
    pub fn is_response(self) -> bool {
        (self as u32) & 0x8000_0000 != 0
    }

    /// Short protocol name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            CommandId::GenericNack => "generic_nack",
            CommandId::BindReceiver => "bind_receiver",
            CommandId::BindReceiverResp => "bind_receiver_resp",
            CommandId::BindTransmitter => "bind_transmitter",
            CommandId::BindTransmitterResp => "bind_transmitter_resp",
            CommandId::BindTransceiver => "bind_transceiver",
            CommandId::BindTransceiverResp => "bind_transceiver_resp",
            CommandId::SubmitSm => "submit_sm",
            CommandId::SubmitSmResp => "submit_sm_resp",
            CommandId::DeliverSm => "deliver_sm",
            CommandId::DeliverSmResp => "deliver_sm_resp",
            CommandId::Unbind => "unbind",
            CommandId::UnbindResp => "unbind_resp",
            CommandId::EnquireLink => "enquire_link",
            CommandId::EnquireLinkResp => "enquire_link_resp",
        }
    }
}
