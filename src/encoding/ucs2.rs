// UCS-2 (in practice UTF-16BE, as deployed SMSCs accept surrogate pairs).

use super::{Splitter, TextEncoding};
use crate::error::SmppError;

#[derive(Clone, Copy, Debug)]
pub struct Ucs2;

const MAX_SINGLE_SEGMENT_UNITS: usize = 70;

impl Ucs2 {
    fn units(message: &str) -> usize {
        message.encode_utf16().count()
    }
}

impl TextEncoding for Ucs2 {
    fn name(&self) -> &'static str {
        "UCS-2"
    }

    fn data_coding(&self) -> u8 {
        0x08
    }

    fn max_single_segment_octets(&self) -> usize {
        MAX_SINGLE_SEGMENT_UNITS * 2
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>, SmppError> {
        let mut out = Vec::with_capacity(message.len() * 2);
        for unit in message.encode_utf16() {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<String, SmppError> {
        if payload.len() % 2 != 0 {
            return Err(SmppError::MalformedPayload {
                encoding: self.name(),
            });
        }
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| SmppError::MalformedPayload {
            encoding: self.name(),
        })
    }

    fn splitter(&self) -> Option<&dyn Splitter> {
        Some(self)
    }
}

impl Splitter for Ucs2 {
    fn should_split(&self, message: &str) -> bool {
        Self::units(message) > MAX_SINGLE_SEGMENT_UNITS
    }

    fn encode_split(
        &self,
        message: &str,
        octet_limit: usize,
    ) -> Result<Vec<Vec<u8>>, SmppError> {
        // Guard against degenerate limits; 134 octets is the concatenated
        // default.
        let octet_limit = if octet_limit < 64 { 134 } else { octet_limit };
        let unit_budget = octet_limit / 2;
        let units: Vec<u16> = message.encode_utf16().collect();

        let mut chunks = Vec::new();
        let mut from = 0;
        while from < units.len() {
            let mut to = usize::min(from + unit_budget, units.len());
            // A high surrogate at the cut would orphan its partner.
            if to < units.len() && (0xD800..0xDC00).contains(&units[to - 1]) {
                to -= 1;
            }
            let mut chunk = Vec::with_capacity((to - from) * 2);
            for &unit in &units[from..to] {
                chunk.extend_from_slice(&unit.to_be_bytes());
            }
            chunks.push(chunk);
            from = to;
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::super::UCS2;
    use super::*;

    #[test]
    fn round_trip() {
        let text = "xin chào thế giới 😀";
        let bytes = UCS2.encode(text).unwrap();
        assert_eq!(UCS2.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn rejects_odd_length_payloads() {
        assert!(matches!(
            UCS2.decode(&[0x00, 0x68, 0x00]),
            Err(SmppError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn should_split_at_70_units() {
        assert!(!UCS2.should_split(&"à".repeat(70)));
        assert!(UCS2.should_split(&"à".repeat(71)));
    }

    #[test]
    fn split_chunks_hold_67_units() {
        let text = "ا".repeat(200);
        let chunks = UCS2.encode_split(&text, 134).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 134);
        assert_eq!(chunks[1].len(), 134);
        assert_eq!(chunks[2].len(), (200 - 2 * 67) * 2);
    }

    #[test]
    fn split_keeps_surrogate_pairs_together() {
        // Each emoji is two code units; an odd unit budget forces the
        // boundary adjustment on every chunk.
        let text = "😀".repeat(40);
        let chunks = UCS2.encode_split(&text, 134).unwrap();
        let mut rebuilt = String::new();
        for chunk in &chunks {
            assert!(chunk.len() % 4 == 0, "chunk split a surrogate pair");
            rebuilt.push_str(&UCS2.decode(chunk).unwrap());
        }
        assert_eq!(rebuilt, text);
    }
}
