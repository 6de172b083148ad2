use super::{Splitter, TextEncoding};
use crate::error::SmppError;

/// IA5/ASCII, data_coding 0x01.
#[derive(Clone, Copy, Debug)]
pub struct Ascii;

const MAX_SINGLE_SEGMENT_OCTETS: usize = 140;

impl TextEncoding for Ascii {
    fn name(&self) -> &'static str {
        "ASCII"
    }

    fn data_coding(&self) -> u8 {
        0x01
    }

    fn max_single_segment_octets(&self) -> usize {
        MAX_SINGLE_SEGMENT_OCTETS
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>, SmppError> {
        if !message.is_ascii() {
            return Err(SmppError::Unencodable {
                encoding: self.name(),
            });
        }
        Ok(message.as_bytes().to_vec())
    }

    fn decode(&self, payload: &[u8]) -> Result<String, SmppError> {
        if !payload.is_ascii() {
            return Err(SmppError::MalformedPayload {
                encoding: self.name(),
            });
        }
        Ok(String::from_utf8_lossy(payload).into_owned())
    }

    fn splitter(&self) -> Option<&dyn Splitter> {
        Some(self)
    }
}

impl Splitter for Ascii {
    fn should_split(&self, message: &str) -> bool {
        message.len() > MAX_SINGLE_SEGMENT_OCTETS
    }

    fn encode_split(
        &self,
        message: &str,
        octet_limit: usize,
    ) -> Result<Vec<Vec<u8>>, SmppError> {
        let encoded = self.encode(message)?;
        Ok(encoded
            .chunks(octet_limit.max(1))
            .map(<[u8]>::to_vec)
            .collect())
    }
}
