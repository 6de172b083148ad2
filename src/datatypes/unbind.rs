use crate::codec::next_sequence_number;
use crate::datatypes::CommandStatus;

/// unbind request, sent best-effort on graceful close and honoured when the
/// peer initiates it. Body is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unbind {
    pub sequence_number: u32,
}

impl Unbind {
    pub fn new() -> Self {
        Self {
            sequence_number: next_sequence_number(),
        }
    }

    pub fn response(&self) -> UnbindResp {
        UnbindResp {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        }
    }
}

/// unbind_resp echoing the request's sequence number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnbindResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}
