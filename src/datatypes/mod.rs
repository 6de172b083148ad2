mod address;
mod bind;
mod command_id;
mod command_status;
mod deliver_sm;
mod enquire_link;
mod generic_nack;
mod short_message;
mod submit_sm;
mod tlv;
mod udh;
mod unbind;

pub use address::Address;
pub use bind::{BindRequest, BindResponse, BindType, INTERFACE_VERSION_34};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use deliver_sm::{DeliverSm, DeliverSmResp};
pub use enquire_link::{EnquireLink, EnquireLinkResp};
pub use generic_nack::GenericNack;
pub use short_message::{ShortMessage, MAX_SHORT_MESSAGE_OCTETS};
pub use submit_sm::{SubmitSm, SubmitSmResp};
pub use tlv::{tags, Tlv};
pub use udh::{InformationElement, Udh, IE_CONCATENATED_MESSAGE};
pub use unbind::{Unbind, UnbindResp};

/// User-Data-Header-Indicator bit in esm_class (bit 6).
pub const ESM_CLASS_UDHI: u8 = 0x40;
