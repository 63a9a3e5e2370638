//! Numeric mode decoder (Mode 0001)
//! Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits

use super::BitReader;
use crate::error::StageError;

/// Decoder for numeric segments
pub struct NumericDecoder;

impl NumericDecoder {
    /// Decode `count` digits, appending ASCII to `out`
    pub fn decode(
        reader: &mut BitReader<'_>,
        count: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), StageError> {
        let mut remaining = count;
        while remaining > 0 {
            let group = remaining.min(3);
            let (bits, limit) = match group {
                3 => (10, 1000),
                2 => (7, 100),
                _ => (4, 10),
            };
            let value = reader.read(bits)?;
            if value >= limit {
                return Err(StageError::MalformedPayload("numeric group out of range"));
            }
            let digits = format!("{value:0width$}", width = group);
            out.extend_from_slice(digits.as_bytes());
            remaining -= group;
        }
        Ok(())
    }
}
