// ABOUTME: User-Data Header handling for concatenated short messages
// ABOUTME: Serializes/parses the UDHL-prefixed information element list

use crate::codec::CodecError;
use bytes::{BufMut, BytesMut};

/// Information element tag for 8-bit concatenation (3GPP TS 23.040
/// section 9.2.3.24.1).
pub const IE_CONCATENATED_MESSAGE: u8 = 0x00;

/// One information element: a tag, then a length octet, then the value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InformationElement {
    pub id: u8,
    pub data: Vec<u8>,
}

impl InformationElement {
    /// Concatenation info linking one segment of a long message:
    /// shared reference, total segment count and this segment's 1-based
    /// index.
    pub fn concatenated_message(reference: u8, total: u8, sequence: u8) -> Self {
        Self {
            id: IE_CONCATENATED_MESSAGE,
            data: vec![reference, total, sequence],
        }
    }

    fn encoded_len(&self) -> usize {
        2 + self.data.len()
    }
}

/// An ordered list of information elements.
///
/// The serialized form is one UDHL octet (the combined size of the
/// elements) followed by the elements themselves. [`Udh::udhl`] reports the
/// full serialized size including the UDHL octet, which is exactly the
/// prefix a payload accessor has to skip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Udh {
    elements: Vec<InformationElement>,
}

impl Udh {
    pub fn new(element: InformationElement) -> Self {
        Self {
            elements: vec![element],
        }
    }

    pub fn elements(&self) -> &[InformationElement] {
        &self.elements
    }

    pub fn push(&mut self, element: InformationElement) {
        self.elements.push(element);
    }

    /// Total serialized size in octets, including the leading UDHL octet.
    /// Zero for an empty header.
    pub fn udhl(&self) -> usize {
        if self.elements.is_empty() {
            0
        } else {
            1 + self
                .elements
                .iter()
                .map(InformationElement::encoded_len)
                .sum::<usize>()
        }
    }

    /// The (reference, total, sequence) triple of the first concatenation
    /// element, if one is present.
    pub fn concatenation(&self) -> Option<(u8, u8, u8)> {
        self.elements
            .iter()
            .find(|ie| ie.id == IE_CONCATENATED_MESSAGE && ie.data.len() == 3)
            .map(|ie| (ie.data[0], ie.data[1], ie.data[2]))
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        if self.elements.is_empty() {
            return;
        }
        let inner: usize = self
            .elements
            .iter()
            .map(InformationElement::encoded_len)
            .sum();
        buf.put_u8(inner as u8);
        for ie in &self.elements {
            buf.put_u8(ie.id);
            buf.put_u8(ie.data.len() as u8);
            buf.extend_from_slice(&ie.data);
        }
    }

    /// Parse a UDH from the head of `data`. Returns the header and the
    /// number of octets consumed.
    pub(crate) fn parse(data: &[u8]) -> Result<(Udh, usize), CodecError> {
        let Some((&udhl, rest)) = data.split_first() else {
            return Err(CodecError::TruncatedUdh);
        };
        let udhl = udhl as usize;
        if rest.len() < udhl {
            return Err(CodecError::TruncatedUdh);
        }

        let mut elements = Vec::new();
        let mut body = &rest[..udhl];
        while !body.is_empty() {
            if body.len() < 2 {
                return Err(CodecError::TruncatedUdh);
            }
            let id = body[0];
            let len = body[1] as usize;
            if body.len() < 2 + len {
                return Err(CodecError::TruncatedUdh);
            }
            elements.push(InformationElement {
                id,
                data: body[2..2 + len].to_vec(),
            });
            body = &body[2 + len..];
        }

        Ok((Udh { elements }, 1 + udhl))
    }
}
