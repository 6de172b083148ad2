// ISO-8859-1: code points 0x00-0xFF map straight onto single octets.

use super::{Splitter, TextEncoding};
use crate::error::SmppError;

#[derive(Clone, Copy, Debug)]
pub struct Latin1;

const MAX_SINGLE_SEGMENT_OCTETS: usize = 140;

impl TextEncoding for Latin1 {
    fn name(&self) -> &'static str {
        "Latin-1"
    }

    fn data_coding(&self) -> u8 {
        0x03
    }

    fn max_single_segment_octets(&self) -> usize {
        MAX_SINGLE_SEGMENT_OCTETS
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>, SmppError> {
        message
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| SmppError::Unencodable {
                    encoding: self.name(),
                })
            })
            .collect()
    }

    fn decode(&self, payload: &[u8]) -> Result<String, SmppError> {
        Ok(payload.iter().map(|&b| char::from(b)).collect())
    }

    fn splitter(&self) -> Option<&dyn Splitter> {
        Some(self)
    }
}

impl Splitter for Latin1 {
    fn should_split(&self, message: &str) -> bool {
        message.chars().count() > MAX_SINGLE_SEGMENT_OCTETS
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
