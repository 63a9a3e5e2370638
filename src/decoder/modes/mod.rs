//! QR data mode decoders
//!
//! - Numeric: digits packed three per 10 bits
//! - Alphanumeric: 45-character set packed two per 11 bits
//! - Byte: raw 8-bit data, text charset chosen by ECI or guessed
//! - Kanji: 13-bit compacted Shift-JIS
//! - ECI: character set designators for byte segments

pub mod alphanumeric;
pub mod byte;
pub mod eci;
pub mod kanji;
pub mod numeric;

use crate::error::StageError;
use crate::models::Version;

/// Segment mode indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// End of data
    Terminator,
    /// Digits
    Numeric,
    /// Uppercase letters, digits and nine symbols
    Alphanumeric,
    /// Sequence header of a multi-symbol message
    StructuredAppend,
    /// 8-bit data
    Byte,
    /// GS1 formatted data follows
    Fnc1First,
    /// Character set designator
    Eci,
    /// Double-byte Shift-JIS
    Kanji,
    /// AIM application indicator follows
    Fnc1Second,
}

impl Mode {
    /// Mode for a 4-bit indicator
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b0000 => Some(Mode::Terminator),
            0b0001 => Some(Mode::Numeric),
            0b0010 => Some(Mode::Alphanumeric),
            0b0011 => Some(Mode::StructuredAppend),
            0b0100 => Some(Mode::Byte),
            0b0101 => Some(Mode::Fnc1First),
            0b0111 => Some(Mode::Eci),
            0b1000 => Some(Mode::Kanji),
            0b1001 => Some(Mode::Fnc1Second),
            _ => None,
        }
    }

    /// 4-bit indicator of this mode
    pub fn bits(&self) -> u32 {
        match self {
            Mode::Terminator => 0b0000,
            Mode::Numeric => 0b0001,
            Mode::Alphanumeric => 0b0010,
            Mode::StructuredAppend => 0b0011,
            Mode::Byte => 0b0100,
            Mode::Fnc1First => 0b0101,
            Mode::Eci => 0b0111,
            Mode::Kanji => 0b1000,
            Mode::Fnc1Second => 0b1001,
        }
    }

    /// Width of the character count field; 0 for modes without one
    pub fn char_count_bits(&self, version: Version) -> usize {
        let range = match version.number() {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        let widths = match self {
            Mode::Numeric => [10, 12, 14],
            Mode::Alphanumeric => [9, 11, 13],
            Mode::Byte => [8, 16, 16],
            Mode::Kanji => [8, 10, 12],
            _ => [0, 0, 0],
        };
        widths[range]
    }
}

/// MSB-first reader over data codewords
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    /// Reader positioned at the first bit of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Bits left to read
    pub fn available(&self) -> usize {
        8 * (self.data.len() - self.byte_offset) - self.bit_offset
    }

    /// Read `n` bits (at most 32) as an unsigned value
    pub fn read(&mut self, n: usize) -> Result<u32, StageError> {
        if n > 32 || n > self.available() {
            return Err(StageError::MalformedPayload("bit stream overrun"));
        }
        let mut value = 0u32;
        let mut remaining = n;
        while remaining > 0 {
            let left_in_byte = 8 - self.bit_offset;
            let take = left_in_byte.min(remaining);
            let shift = left_in_byte - take;
            let chunk = (self.data[self.byte_offset] >> shift) & ((1u16 << take) - 1) as u8;
            value = (value << take) | chunk as u32;
            remaining -= take;
            self.bit_offset += take;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_offset += 1;
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_reader() {
        let data = [0b1010_0011, 0b1100_0101, 0xFF];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(4), Ok(0b1010));
        assert_eq!(reader.read(6), Ok(0b0011_11));
        assert_eq!(reader.available(), 14);
        assert_eq!(reader.read(14), Ok(0b00_0101_1111_1111));
        assert!(reader.read(1).is_err());
    }

    #[test]
    fn test_char_count_widths() {
        let v = |n| Version::new(n).unwrap();
        assert_eq!(Mode::Numeric.char_count_bits(v(9)), 10);
        assert_eq!(Mode::Alphanumeric.char_count_bits(v(10)), 11);
        assert_eq!(Mode::Byte.char_count_bits(v(27)), 16);
        assert_eq!(Mode::Kanji.char_count_bits(v(40)), 12);
        assert_eq!(Mode::Eci.char_count_bits(v(1)), 0);
    }

    #[test]
    fn test_mode_bits_round_trip() {
        for bits in 0..16 {
            if let Some(mode) = Mode::from_bits(bits) {
                assert_eq!(mode.bits(), bits);
            }
        }
        assert_eq!(Mode::from_bits(0b0110), None);
    }
}
