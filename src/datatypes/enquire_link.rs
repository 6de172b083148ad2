use crate::codec::next_sequence_number;

/// enquire_link liveness probe; body is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnquireLink {
    pub sequence_number: u32,
}

impl EnquireLink {
    pub fn new() -> Self {
        Self {
            sequence_number: next_sequence_number(),
        }
    }

    pub fn response(&self) -> EnquireLinkResp {
        EnquireLinkResp {
            sequence_number: self.sequence_number,
        }
    }
}

/// enquire_link_resp echoing the probe's sequence number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnquireLinkResp {
    pub sequence_number: u32,
}
