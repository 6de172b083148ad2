// ABOUTME: The Pdu enum - one framed SMPP message, with frame check, parse and encode
// ABOUTME: Also pairs requests with their responses for the reader's auto-respond path

use crate::codec::{CodecError, PduHeader, MAX_PDU_SIZE};
use crate::datatypes::{
    BindRequest, BindResponse, BindType, CommandId, CommandStatus, DeliverSm, DeliverSmResp,
    EnquireLink, EnquireLinkResp, GenericNack, SubmitSm, SubmitSmResp, Unbind, UnbindResp,
};
use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;

/// One SMPP protocol data unit.
///
/// The large submit/deliver bodies are boxed so the enum stays cheap to
/// move through channels.
#[derive(Clone, Debug, PartialEq)]
pub enum Pdu {
    BindRequest(BindRequest),
    BindResponse(BindResponse),
    Unbind(Unbind),
    UnbindResp(UnbindResp),
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResp),
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResp),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResp),
    GenericNack(GenericNack),
}

impl Pdu {
    /// Verify that `src` holds one complete, sane frame. Advances the
    /// cursor past it on success. Returns [`CodecError::Incomplete`] when
    /// more data is needed.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), CodecError> {
        if src.remaining() < 4 {
            return Err(CodecError::Incomplete);
        }
        let start = src.position() as usize;
        let slice = *src.get_ref();
        let command_length = u32::from_be_bytes([
            slice[start],
            slice[start + 1],
            slice[start + 2],
            slice[start + 3],
        ]);
        if command_length < PduHeader::SIZE as u32 || command_length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }
        if src.remaining() < command_length as usize {
            return Err(CodecError::Incomplete);
        }
        src.set_position((start + command_length as usize) as u64);
        Ok(())
    }

    /// Parse one frame from the start of the cursor. The caller has already
    /// run [`Pdu::check`], so a full frame is present.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Pdu, CodecError> {
        let start = src.position() as usize;
        let mut header_cursor = Cursor::new(&src.get_ref()[start..]);
        let header = PduHeader::decode(&mut header_cursor)?;
        let len = header.command_length as usize;

        // Body cursor scoped to exactly this frame, positioned after the
        // header, so trailing-TLV arithmetic sees frame-relative offsets.
        let frame = &src.get_ref()[start..start + len];
        let mut body = Cursor::new(frame);
        body.set_position(PduHeader::SIZE as u64);

        let pdu = match header.command_id {
            CommandId::BindReceiver => Pdu::BindRequest(BindRequest::decode_body(
                &header,
                BindType::Receiver,
                &mut body,
            )?),
            CommandId::BindTransmitter => Pdu::BindRequest(BindRequest::decode_body(
                &header,
                BindType::Transmitter,
                &mut body,
            )?),
            CommandId::BindTransceiver => Pdu::BindRequest(BindRequest::decode_body(
                &header,
                BindType::Transceiver,
                &mut body,
            )?),
            CommandId::BindReceiverResp => Pdu::BindResponse(BindResponse::decode_body(
                &header,
                BindType::Receiver,
                &mut body,
            )?),
            CommandId::BindTransmitterResp => Pdu::BindResponse(BindResponse::decode_body(
                &header,
                BindType::Transmitter,
                &mut body,
            )?),
            CommandId::BindTransceiverResp => Pdu::BindResponse(BindResponse::decode_body(
                &header,
                BindType::Transceiver,
                &mut body,
            )?),
            CommandId::Unbind => Pdu::Unbind(Unbind {
                sequence_number: header.sequence_number,
            }),
            CommandId::UnbindResp => Pdu::UnbindResp(UnbindResp {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
            }),
            CommandId::EnquireLink => Pdu::EnquireLink(EnquireLink {
                sequence_number: header.sequence_number,
            }),
            CommandId::EnquireLinkResp => Pdu::EnquireLinkResp(EnquireLinkResp {
                sequence_number: header.sequence_number,
            }),
            CommandId::SubmitSm => {
                Pdu::SubmitSm(Box::new(SubmitSm::decode_body(&header, &mut body)?))
            }
            CommandId::SubmitSmResp => {
                Pdu::SubmitSmResp(SubmitSmResp::decode_body(&header, &mut body)?)
            }
            CommandId::DeliverSm => {
                Pdu::DeliverSm(Box::new(DeliverSm::decode_body(&header, &mut body)?))
            }
            CommandId::DeliverSmResp => {
                Pdu::DeliverSmResp(DeliverSmResp::decode_body(&header, &mut body)?)
            }
            CommandId::GenericNack => Pdu::GenericNack(GenericNack {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
            }),
        };

        src.set_position((start + len) as u64);
        Ok(pdu)
    }

    pub fn command_id(&self) -> CommandId {
        match self {
            Pdu::BindRequest(p) => p.bind_type.request_id(),
            Pdu::BindResponse(p) => p.bind_type.response_id(),
            Pdu::Unbind(_) => CommandId::Unbind,
            Pdu::UnbindResp(_) => CommandId::UnbindResp,
            Pdu::EnquireLink(_) => CommandId::EnquireLink,
            Pdu::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Pdu::SubmitSm(_) => CommandId::SubmitSm,
            Pdu::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Pdu::DeliverSm(_) => CommandId::DeliverSm,
            Pdu::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Pdu::GenericNack(_) => CommandId::GenericNack,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Pdu::BindRequest(p) => p.sequence_number,
            Pdu::BindResponse(p) => p.sequence_number,
            Pdu::Unbind(p) => p.sequence_number,
            Pdu::UnbindResp(p) => p.sequence_number,
            Pdu::EnquireLink(p) => p.sequence_number,
            Pdu::EnquireLinkResp(p) => p.sequence_number,
            Pdu::SubmitSm(p) => p.sequence_number,
            Pdu::SubmitSmResp(p) => p.sequence_number,
            Pdu::DeliverSm(p) => p.sequence_number,
            Pdu::DeliverSmResp(p) => p.sequence_number,
            Pdu::GenericNack(p) => p.sequence_number,
        }
    }

    pub fn command_status(&self) -> CommandStatus {
        match self {
            Pdu::BindResponse(p) => p.command_status,
            Pdu::UnbindResp(p) => p.command_status,
            Pdu::SubmitSmResp(p) => p.command_status,
            Pdu::DeliverSmResp(p) => p.command_status,
            Pdu::GenericNack(p) => p.command_status,
            _ => CommandStatus::Ok,
        }
    }

    /// Whether this PDU is a request the core can answer mechanically.
    pub fn can_response(&self) -> bool {
        matches!(
            self,
            Pdu::BindRequest(_) | Pdu::Unbind(_) | Pdu::EnquireLink(_) | Pdu::SubmitSm(_)
                | Pdu::DeliverSm(_)
        )
    }

    /// The mechanical response for a request PDU, echoing its sequence
    /// number.
    pub fn response(&self) -> Option<Pdu> {
        match self {
            Pdu::BindRequest(p) => Some(Pdu::BindResponse(p.response(""))),
            Pdu::Unbind(p) => Some(Pdu::UnbindResp(p.response())),
            Pdu::EnquireLink(p) => Some(Pdu::EnquireLinkResp(p.response())),
            Pdu::SubmitSm(p) => Some(Pdu::SubmitSmResp(p.response())),
            Pdu::DeliverSm(p) => Some(Pdu::DeliverSmResp(p.response())),
            _ => None,
        }
    }

    /// Marshal to wire form; the command_length is patched in after the
    /// body is laid down.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        let header = PduHeader {
            command_length: 0,
            command_id: self.command_id(),
            command_status: self.command_status(),
            sequence_number: self.sequence_number(),
        };
        header.encode(&mut buf);

        match self {
            Pdu::BindRequest(p) => p.encode_body(&mut buf),
            Pdu::BindResponse(p) => p.encode_body(&mut buf),
            Pdu::SubmitSm(p) => p.encode_body(&mut buf)?,
            Pdu::SubmitSmResp(p) => p.encode_body(&mut buf),
            Pdu::DeliverSm(p) => p.encode_body(&mut buf)?,
            Pdu::DeliverSmResp(p) => p.encode_body(&mut buf),
            // Empty bodies: unbind pair, enquire_link pair, generic_nack.
            Pdu::Unbind(_)
            | Pdu::UnbindResp(_)
            | Pdu::EnquireLink(_)
            | Pdu::EnquireLinkResp(_)
            | Pdu::GenericNack(_) => {}
        }

        let length = buf.len() as u32;
        buf[0..4].copy_from_slice(&length.to_be_bytes());
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{Address, ShortMessage};

    fn parse_bytes(bytes: &[u8]) -> Result<Pdu, CodecError> {
        let mut cursor = Cursor::new(bytes);
        Pdu::check(&mut cursor)?;
        cursor.set_position(0);
        Pdu::parse(&mut cursor)
    }

    #[test]
    fn enquire_link_round_trip() {
        let pdu = Pdu::EnquireLink(EnquireLink::new());
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(parse_bytes(&bytes).unwrap(), pdu);
    }

    #[test]
    fn bind_request_round_trip() {
        let mut req = BindRequest::new(BindType::Transceiver);
        req.system_id = "sys".into();
        req.password = "secret".into();
        req.system_type = "vma".into();
        let pdu = Pdu::BindRequest(req);
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(parse_bytes(&bytes).unwrap(), pdu);
    }

    #[test]
    fn submit_sm_round_trip() {
        let submit = SubmitSm::new(
            Address::international("84900000001"),
            Address::international("84900000002"),
            ShortMessage::new("hello").unwrap(),
        );
        let pdu = Pdu::SubmitSm(Box::new(submit));
        let bytes = pdu.to_bytes().unwrap();
        let parsed = parse_bytes(&bytes).unwrap();
        assert_eq!(parsed, pdu);

        let Pdu::SubmitSm(parsed) = parsed else {
            panic!("wrong variant");
        };
        assert_eq!(parsed.message.message().unwrap(), "hello");
    }

    #[test]
    fn check_reports_incomplete_frames() {
        let pdu = Pdu::Unbind(Unbind::new());
        let bytes = pdu.to_bytes().unwrap();
        let mut cursor = Cursor::new(&bytes[..bytes.len() - 1]);
        assert!(matches!(
            Pdu::check(&mut cursor),
            Err(CodecError::Incomplete)
        ));
    }

    #[test]
    fn check_rejects_absurd_lengths() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(
            Pdu::check(&mut cursor),
            Err(CodecError::InvalidPduLength { .. })
        ));
    }

    #[test]
    fn responses_echo_sequence_numbers() {
        let enquire = Pdu::EnquireLink(EnquireLink {
            sequence_number: 77,
        });
        let resp = enquire.response().unwrap();
        assert_eq!(resp.command_id(), CommandId::EnquireLinkResp);
        assert_eq!(resp.sequence_number(), 77);

        let unbind = Pdu::Unbind(Unbind {
            sequence_number: 42,
        });
        let resp = unbind.response().unwrap();
        assert_eq!(resp.command_id(), CommandId::UnbindResp);
        assert_eq!(resp.sequence_number(), 42);

        assert!(Pdu::GenericNack(GenericNack {
            command_status: CommandStatus::SystemError,
            sequence_number: 1,
        })
        .response()
        .is_none());
    }

    #[test]
    fn deliver_sm_is_auto_respondable() {
        let deliver = DeliverSm::new(
            Address::international("84900000001"),
            Address::international("84900000002"),
            ShortMessage::new("inbound").unwrap(),
        );
        let pdu = Pdu::DeliverSm(Box::new(deliver));
        assert!(pdu.can_response());
        let resp = pdu.response().unwrap();
        assert_eq!(resp.command_id(), CommandId::DeliverSmResp);
        assert_eq!(resp.sequence_number(), pdu.sequence_number());
    }
}
