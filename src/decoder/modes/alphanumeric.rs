//! Alphanumeric mode decoder (Mode 0010)
//! Pairs = 11 bits, single = 6 bits

use super::BitReader;
use crate::error::StageError;

/// Alphanumeric character set: 0-9, A-Z, space, $%*+-./:
pub const ALPHANUMERIC_TABLE: [u8; 45] = *b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Index of `c` in the alphanumeric table
pub fn alphanumeric_index(c: char) -> Option<u32> {
    ALPHANUMERIC_TABLE
        .iter()
        .position(|&b| b as char == c)
        .map(|i| i as u32)
}

/// Decoder for alphanumeric segments
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Decode `count` characters, appending ASCII to `out`.
    ///
    /// In FNC1 (GS1) mode `%` stands for the GS separator and `%%` for a
    /// literal percent sign.
    pub fn decode(
        reader: &mut BitReader<'_>,
        count: usize,
        fnc1: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), StageError> {
        let start = out.len();
        let mut remaining = count;
        while remaining > 0 {
            if remaining >= 2 {
                let value = reader.read(11)? as usize;
                if value >= 45 * 45 {
                    return Err(StageError::MalformedPayload("alphanumeric pair out of range"));
                }
                out.push(ALPHANUMERIC_TABLE[value / 45]);
                out.push(ALPHANUMERIC_TABLE[value % 45]);
                remaining -= 2;
            } else {
                let value = reader.read(6)? as usize;
                let &c = ALPHANUMERIC_TABLE
                    .get(value)
                    .ok_or(StageError::MalformedPayload("alphanumeric value out of range"))?;
                out.push(c);
                remaining -= 1;
            }
        }

        if fnc1 {
            let segment = out.split_off(start);
            let mut iter = segment.into_iter().peekable();
            while let Some(c) = iter.next() {
                if c == b'%' {
                    if iter.peek() == Some(&b'%') {
                        iter.next();
                        out.push(b'%');
                    } else {
                        out.push(0x1D);
                    }
                } else {
                    out.push(c);
                }
            }
        }
        Ok(())
    }
}
