use super::TextEncoding;
use crate::error::SmppError;

/// 8-bit binary "encoding": payloads pass through untouched. Used for
/// data_coding 0x02/0x04 and as the fallback for unknown codings. Carries
/// no splitter; binary payloads are not text-segmentable.
#[derive(Clone, Copy, Debug)]
pub struct Binary;

impl TextEncoding for Binary {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn data_coding(&self) -> u8 {
        0x04
    }

    fn max_single_segment_octets(&self) -> usize {
        140
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>, SmppError> {
        Ok(message.as_bytes().to_vec())
    }

    fn decode(&self, payload: &[u8]) -> Result<String, SmppError> {
        String::from_utf8(payload.to_vec()).map_err(|_| SmppError::MalformedPayload {
            encoding: self.name(),
        })
    }
}
