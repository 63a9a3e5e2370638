//! Extended Channel Interpretation: designator parsing and text decoding.

use encoding_rs::Encoding;

use super::BitReader;
use crate::error::StageError;

/// ECI assignment for UTF-8
pub const ECI_UTF8: u32 = 26;

/// Character set a byte segment is interpreted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    /// No ECI seen: UTF-8 when valid, otherwise ISO-8859-1
    Guess,
    /// ISO-8859-1, ECI 1 and 3
    Latin1,
    /// ECI 26
    Utf8,
    /// ECI 20
    ShiftJis,
    /// Any other assignment `encoding_rs` knows
    Other(&'static Encoding),
}

impl CharacterSet {
    /// Character set for an ECI assignment number
    pub fn from_eci(value: u32) -> Option<Self> {
        let encoding = match value {
            1 | 3 => return Some(CharacterSet::Latin1),
            20 => return Some(CharacterSet::ShiftJis),
            26 => return Some(CharacterSet::Utf8),
            4 => encoding_rs::ISO_8859_2,
            5 => encoding_rs::ISO_8859_3,
            6 => encoding_rs::ISO_8859_4,
            7 => encoding_rs::ISO_8859_5,
            8 => encoding_rs::ISO_8859_6,
            9 => encoding_rs::ISO_8859_7,
            10 => encoding_rs::ISO_8859_8,
            11 => encoding_rs::WINDOWS_1254,
            12 => encoding_rs::ISO_8859_10,
            13 => encoding_rs::WINDOWS_874,
            15 => encoding_rs::ISO_8859_13,
            16 => encoding_rs::ISO_8859_14,
            17 => encoding_rs::ISO_8859_15,
            18 => encoding_rs::ISO_8859_16,
            21 => encoding_rs::WINDOWS_1250,
            22 => encoding_rs::WINDOWS_1251,
            23 => encoding_rs::WINDOWS_1252,
            24 => encoding_rs::WINDOWS_1256,
            25 => encoding_rs::UTF_16BE,
            27 | 170 => return Some(CharacterSet::Latin1),
            28 => encoding_rs::BIG5,
            29 => encoding_rs::GB18030,
            30 => encoding_rs::EUC_KR,
            _ => return None,
        };
        Some(CharacterSet::Other(encoding))
    }

    /// Decode bytes to text in this character set
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            CharacterSet::Guess => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_owned(),
                Err(_) => latin1(bytes),
            },
            CharacterSet::Latin1 => latin1(bytes),
            CharacterSet::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            CharacterSet::ShiftJis => decode_with(encoding_rs::SHIFT_JIS, bytes),
            CharacterSet::Other(encoding) => decode_with(encoding, bytes),
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Read an ECI designator (one to three bytes)
pub fn read_designator(reader: &mut BitReader<'_>) -> Result<u32, StageError> {
    let first = reader.read(8)?;
    if first & 0x80 == 0 {
        Ok(first & 0x7F)
    } else if first & 0xC0 == 0x80 {
        Ok(((first & 0x3F) << 8) | reader.read(8)?)
    } else if first & 0xE0 == 0xC0 {
        Ok(((first & 0x1F) << 16) | reader.read(16)?)
    } else {
        Err(StageError::MalformedPayload("invalid ECI designator"))
    }
}
