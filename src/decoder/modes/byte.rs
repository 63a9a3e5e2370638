//! Byte mode decoder (Mode 0100) for 8-bit data

use super::BitReader;
use crate::error::StageError;

/// Decoder for byte segments
pub struct ByteDecoder;

impl ByteDecoder {
    /// Append `count` raw bytes to `out`
    pub fn decode(
        reader: &mut BitReader<'_>,
        count: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), StageError> {
        if count * 8 > reader.available() {
            return Err(StageError::MalformedPayload("byte segment overruns stream"));
        }
        for _ in 0..count {
            out.push(reader.read(8)? as u8);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_decode() {
        let data = [0x48, 0x49, 0x00];
        let mut out = Vec::new();
        ByteDecoder::decode(&mut BitReader::new(&data), 2, &mut out).unwrap();
        assert_eq!(out, b"HI");
    }

    #[test]
    fn test_count_overrun() {
        let mut out = Vec::new();
        assert!(ByteDecoder::decode(&mut BitReader::new(&[1, 2]), 3, &mut out).is_err());
        assert!(out.is_empty());
    }
}
