//! Payload decoding: walks the mode segments of the corrected data codewords.

use tracing::trace;

use super::modes::alphanumeric::AlphanumericDecoder;
use super::modes::byte::ByteDecoder;
use super::modes::eci::{self, CharacterSet};
use super::modes::kanji::KanjiDecoder;
use super::modes::numeric::NumericDecoder;
use super::modes::{BitReader, Mode};
use crate::error::StageError;
use crate::models::{StructuredAppend, Version};

/// Decoded content of one symbol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Text of all segments, decoded per their character sets
    pub text: String,
    /// Raw segment bytes
    pub bytes: Vec<u8>,
    /// Structured append header, when present
    pub structured_append: Option<StructuredAppend>,
    /// FNC1 in first position was seen
    pub gs1: bool,
}

/// Decode the data codewords of a symbol of the given version.
///
/// The walk ends at a terminator or when fewer than four bits remain.
pub fn decode_payload(data: &[u8], version: Version) -> Result<Payload, StageError> {
    let mut reader = BitReader::new(data);
    let mut payload = Payload::default();
    let mut charset = CharacterSet::Guess;
    let mut fnc1 = false;

    while reader.available() >= 4 {
        let bits = reader.read(4)?;
        let mode = Mode::from_bits(bits).ok_or(StageError::MalformedPayload("unknown mode"))?;
        trace!(?mode, remaining = reader.available(), "segment");

        match mode {
            Mode::Terminator => break,
            Mode::Fnc1First => {
                fnc1 = true;
                payload.gs1 = true;
            }
            Mode::Fnc1Second => {
                fnc1 = true;
                // Application indicator
                reader.read(8)?;
            }
            Mode::StructuredAppend => {
                let index = reader.read(4)? as u8;
                let total = reader.read(4)? as u8 + 1;
                let parity = reader.read(8)? as u8;
                payload.structured_append = Some(StructuredAppend {
                    index,
                    total,
                    parity,
                });
            }
            Mode::Eci => {
                let value = eci::read_designator(&mut reader)?;
                charset = CharacterSet::from_eci(value)
                    .ok_or(StageError::MalformedPayload("unsupported ECI"))?;
            }
            Mode::Numeric | Mode::Alphanumeric | Mode::Byte | Mode::Kanji => {
                let count = reader.read(mode.char_count_bits(version))? as usize;
                let mut segment = Vec::new();
                let segment_charset = match mode {
                    Mode::Numeric => {
                        NumericDecoder::decode(&mut reader, count, &mut segment)?;
                        CharacterSet::Latin1
                    }
                    Mode::Alphanumeric => {
                        AlphanumericDecoder::decode(&mut reader, count, fnc1, &mut segment)?;
                        CharacterSet::Latin1
                    }
                    Mode::Byte => {
                        ByteDecoder::decode(&mut reader, count, &mut segment)?;
                        charset
                    }
                    _ => {
                        KanjiDecoder::decode(&mut reader, count, &mut segment)?;
                        CharacterSet::ShiftJis
                    }
                };
                payload.text.push_str(&segment_charset.decode(&segment));
                payload.bytes.extend_from_slice(&segment);
            }
        }
    }

    Ok(payload)
}
