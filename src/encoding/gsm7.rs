// GSM 03.38 default alphabet, in both unpacked (one septet per octet) and
// packed (7-bit, LSB-first) renditions. The packed form is what travels in
// a TPDU; SMSCs speaking SMPP usually expect the unpacked form in
// short_message, so the registry default is unpacked.

use super::{Splitter, TextEncoding};
use crate::error::SmppError;

const ESCAPE: u8 = 0x1B;

/// Basic character set, indexed by septet value. Index 0x1B is the escape
/// marker and never produced by lookup.
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

/// Extension table, reached through the escape septet.
const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{c}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

fn basic_septet(c: char) -> Option<u8> {
    BASIC
        .iter()
        .position(|&b| b == c)
        .filter(|&i| i != ESCAPE as usize)
        .map(|i| i as u8)
}

fn extension_septet(c: char) -> Option<u8> {
    EXTENSION.iter().find(|&&(_, e)| e == c).map(|&(s, _)| s)
}

fn extension_char(septet: u8) -> Option<char> {
    EXTENSION.iter().find(|&&(s, _)| s == septet).map(|&(_, c)| c)
}

/// GSM 7-bit default alphabet codec.
#[derive(Clone, Copy, Debug)]
pub struct Gsm7 {
    packed: bool,
}

impl Gsm7 {
    pub const fn unpacked() -> Self {
        Self { packed: false }
    }

    pub const fn packed() -> Self {
        Self { packed: true }
    }

    /// Septet cost of `message`, or None when a character has no GSM 03.38
    /// representation.
    fn septet_len(message: &str) -> Option<usize> {
        let mut len = 0;
        for c in message.chars() {
            if basic_septet(c).is_some() {
                len += 1;
            } else if extension_septet(c).is_some() {
                len += 2;
            } else {
                return None;
            }
        }
        Some(len)
    }

    fn to_septets(&self, message: &str) -> Result<Vec<u8>, SmppError> {
        let mut septets = Vec::with_capacity(message.len());
        for c in message.chars() {
            if let Some(s) = basic_septet(c) {
                septets.push(s);
            } else if let Some(s) = extension_septet(c) {
                septets.push(ESCAPE);
                septets.push(s);
            } else {
                return Err(SmppError::Unencodable {
                    encoding: self.name(),
                });
            }
        }
        Ok(septets)
    }

    fn from_septets(&self, septets: &[u8]) -> Result<String, SmppError> {
        let mut out = String::with_capacity(septets.len());
        let mut iter = septets.iter();
        while let Some(&s) = iter.next() {
            if s > 0x7F {
                return Err(SmppError::MalformedPayload {
                    encoding: self.name(),
                });
            }
            if s == ESCAPE {
                let &ext = iter.next().ok_or(SmppError::MalformedPayload {
                    encoding: self.name(),
                })?;
                let c = extension_char(ext).ok_or(SmppError::MalformedPayload {
                    encoding: self.name(),
                })?;
                out.push(c);
            } else {
                out.push(BASIC[s as usize]);
            }
        }
        Ok(out)
    }

    fn pack(septets: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(septets.len() * 7 / 8 + 1);
        let mut acc: u16 = 0;
        let mut bits = 0;
        for &s in septets {
            acc |= u16::from(s) << bits;
            bits += 7;
            while bits >= 8 {
                out.push((acc & 0xFF) as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            out.push((acc & 0xFF) as u8);
        }
        out
    }

    fn unpack(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() * 8 / 7);
        let mut acc: u16 = 0;
        let mut bits = 0;
        for &b in data {
            acc |= u16::from(b) << bits;
            bits += 8;
            while bits >= 7 {
                out.push((acc & 0x7F) as u8);
                acc >>= 7;
                bits -= 7;
            }
        }
        // 8*n bits divide evenly into septets when n % 7 == 0; a trailing
        // zero septet there is deadbit padding, not an '@'.
        if data.len() % 7 == 0 && out.last() == Some(&0) {
            out.pop();
        }
        out
    }

    fn octets_for(&self, septets: usize) -> usize {
        if self.packed {
            (septets * 7).div_ceil(8)
        } else {
            septets
        }
    }

    fn septet_budget(&self, octet_limit: usize) -> usize {
        if self.packed {
            octet_limit * 8 / 7
        } else {
            octet_limit
        }
    }
}

impl TextEncoding for Gsm7 {
    fn name(&self) -> &'static str {
        "GSM 7-bit"
    }

    fn data_coding(&self) -> u8 {
        0x00
    }

    fn max_single_segment_octets(&self) -> usize {
        // 160 septets either way; packed they occupy 140 octets.
        self.octets_for(160)
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>, SmppError> {
        let septets = self.to_septets(message)?;
        Ok(if self.packed {
            Self::pack(&septets)
        } else {
            septets
        })
    }

    fn decode(&self, payload: &[u8]) -> Result<String, SmppError> {
        if self.packed {
            self.from_septets(&Self::unpack(payload))
        } else {
            self.from_septets(payload)
        }
    }

    fn splitter(&self) -> Option<&dyn Splitter> {
        Some(self)
    }
}

impl Splitter for Gsm7 {
    fn should_split(&self, message: &str) -> bool {
        // Unencodable text is not this check's problem; encode reports it.
        Gsm7::septet_len(message).is_some_and(|len| len > 160)
    }

    fn encode_split(
        &self,
        message: &str,
        octet_limit: usize,
    ) -> Result<Vec<Vec<u8>>, SmppError> {
        let budget = self.septet_budget(octet_limit.max(2));
        let mut chunks = Vec::new();
        let mut chunk = String::new();
        let mut used = 0;

        for c in message.chars() {
            // An escaped character costs two septets and must stay whole.
            let cost = if basic_septet(c).is_some() {
                1
            } else if extension_septet(c).is_some() {
                2
            } else {
                return Err(SmppError::Unencodable {
                    encoding: self.name(),
                });
            };

            if used + cost > budget && !chunk.is_empty() {
                chunks.push(self.encode(&chunk)?);
                chunk.clear();
                used = 0;
            }
            chunk.push(c);
            used += cost;
        }
        if !chunk.is_empty() {
            chunks.push(self.encode(&chunk)?);
        }
        Ok(chunks)
    }
}
