// ABOUTME: Character encoding strategies for short message payloads
// ABOUTME: Maps SMPP data_coding bytes to codecs and exposes the splitting capability

mod ascii;
mod binary;
mod gsm7;
mod latin1;
mod ucs2;

pub use ascii::Ascii;
pub use binary::Binary;
pub use gsm7::Gsm7;
pub use latin1::Latin1;
pub use ucs2::Ucs2;

use crate::error::SmppError;

/// A character encoding usable as a short-message payload codec.
///
/// Implementations are stateless singletons; a `ShortMessage` keeps a
/// `&'static dyn TextEncoding` to the strategy it was built with.
pub trait TextEncoding: Send + Sync {
    /// Human-readable name, used in error reporting.
    fn name(&self) -> &'static str;

    /// The data_coding byte advertised for this encoding.
    fn data_coding(&self) -> u8;

    /// Largest payload, in octets, that fits one unsegmented short message
    /// under this encoding.
    fn max_single_segment_octets(&self) -> usize;

    fn encode(&self, message: &str) -> Result<Vec<u8>, SmppError>;

    fn decode(&self, payload: &[u8]) -> Result<String, SmppError>;

    /// Capability probe: encodings that know how to break a long message
    /// into concatenation-safe chunks return their splitter here.
    fn splitter(&self) -> Option<&dyn Splitter> {
        None
    }
}

/// Splitting capability for text encodings.
///
/// `encode_split` must cut on character boundaries; for GSM7 that includes
/// keeping escape sequences whole, for UCS-2 keeping surrogate pairs whole.
pub trait Splitter {
    /// Whether `message` needs more than one segment under this encoding.
    fn should_split(&self, message: &str) -> bool;

    /// Encode `message` into chunks of at most `octet_limit` octets each.
    fn encode_split(&self, message: &str, octet_limit: usize)
        -> Result<Vec<Vec<u8>>, SmppError>;
}

pub static GSM7: Gsm7 = Gsm7::unpacked();
pub static GSM7_PACKED: Gsm7 = Gsm7::packed();
pub static ASCII: Ascii = Ascii;
pub static LATIN1: Latin1 = Latin1;
pub static UCS2: Ucs2 = Ucs2;
pub static BINARY: Binary = Binary;

/// Resolve a wire data_coding byte to an encoding strategy.
///
/// Unknown codings fall back to the 8-bit binary codec, which round-trips
/// any payload untouched.
pub fn from_data_coding(data_coding: u8) -> &'static dyn TextEncoding {
    match data_coding {
        0x00 => &GSM7,
        0x01 => &ASCII,
        0x02 | 0x04 => &BINARY,
        0x03 => &LATIN1,
        0x08 => &UCS2,
        _ => &BINARY,
    }
}
