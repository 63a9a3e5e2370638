//! Kanji mode decoder (Mode 1000): 13-bit compacted Shift-JIS

use super::BitReader;
use crate::error::StageError;

/// Decoder for Kanji segments
pub struct KanjiDecoder;

impl KanjiDecoder {
    /// Decode `count` characters, appending their two Shift-JIS bytes to `out`
    pub fn decode(
        reader: &mut BitReader<'_>,
        count: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), StageError> {
        if count * 13 > reader.available() {
            return Err(StageError::MalformedPayload("kanji segment overruns stream"));
        }
        for _ in 0..count {
            let value = reader.read(13)?;
            let assembled = ((value / 0xC0) << 8) | (value % 0xC0);
            let sjis = if assembled < 0x1F00 {
                assembled + 0x8140
            } else {
                assembled + 0xC140
            };
            out.push((sjis >> 8) as u8);
            out.push(sjis as u8);
        }
        Ok(())
    }
}

/// Compact a Shift-JIS double-byte character into 13 bits
pub fn compact(sjis: u16) -> Option<u32> {
    let base: u32 = match sjis {
        0x8140..=0x9FFC => (sjis - 0x8140).into(),
        0xE040..=0xEBBF => (sjis - 0xC140).into(),
        _ => return None,
    };
    Some((base >> 8) * 0xC0 + (base & 0xFF))
}
