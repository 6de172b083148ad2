use crate::datatypes::CommandStatus;

/// generic_nack: the peer could not make sense of a PDU. Body is empty;
/// the interesting parts live in the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericNack {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}
