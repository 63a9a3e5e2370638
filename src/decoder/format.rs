//! Format information: EC level and mask, stored twice around the finders.

use tracing::trace;

use super::bch::{format_code, nearest_format};
use crate::error::StageError;
use crate::models::{ECLevel, MaskPattern, SymbolGrid};

/// Errors a single copy can carry and still be trusted on its own
const MAX_COPY_DISTANCE: u32 = 3;
/// Summed distance over both copies accepted when neither copy is trusted alone
const MAX_JOINT_DISTANCE: u32 = 8;

/// Decoded format information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask applied by the encoder
    pub mask_pattern: MaskPattern,
    /// Bit errors corrected in the copy that was used
    pub bit_errors: u32,
}

impl FormatInfo {
    /// Build from the five data bits
    pub fn from_data(data: u8) -> Self {
        Self {
            ec_level: ECLevel::from_format_bits(data >> 3),
            mask_pattern: MaskPattern::from_bits(data & 0x07),
            bit_errors: 0,
        }
    }

    /// Five data bits (EC level << 3 | mask)
    pub fn data(&self) -> u8 {
        (self.ec_level.format_bits() << 3) | self.mask_pattern.bits()
    }

    /// Masked 15-bit code word
    pub fn code_word(&self) -> u16 {
        format_code(self.data())
    }

    /// Read and correct the format information of a grid
    pub fn extract(grid: &SymbolGrid) -> Result<Self, StageError> {
        if grid.dimension() < 21 {
            return Err(StageError::MetadataUncorrectable("grid too small"));
        }
        let (first, second) = positions(grid.dimension());
        let copy1 = read_bits(grid, &first);
        let copy2 = read_bits(grid, &second);
        Self::decode(copy1, copy2)
    }

    /// Resolve two raw 15-bit copies.
    ///
    /// A copy within three bit errors of a valid code word decides on its
    /// own. Otherwise the code word with the smallest summed distance over
    /// both copies is used when it is unique and within capacity.
    pub fn decode(copy1: u16, copy2: u16) -> Result<Self, StageError> {
        let (data1, dist1) = nearest_format(copy1);
        let (data2, dist2) = nearest_format(copy2);
        trace!(copy1, dist1, copy2, dist2, "format copies");

        let best = if dist1 <= dist2 { (data1, dist1) } else { (data2, dist2) };
        if best.1 <= MAX_COPY_DISTANCE {
            return Ok(Self {
                bit_errors: best.1,
                ..Self::from_data(best.0)
            });
        }

        let mut joint: Vec<(u8, u32)> = (0u8..32)
            .map(|d| {
                let code = format_code(d);
                (d, (code ^ copy1).count_ones() + (code ^ copy2).count_ones())
            })
            .collect();
        joint.sort_by_key(|&(_, dist)| dist);
        match joint.as_slice() {
            [(data, dist), (_, next), ..] if *dist <= MAX_JOINT_DISTANCE && dist < next => {
                Ok(Self {
                    bit_errors: *dist,
                    ..Self::from_data(*data)
                })
            }
            _ => Err(StageError::MetadataUncorrectable("format information")),
        }
    }
}

/// Module coordinates `(x, y)` of both format copies, most significant bit first
pub fn positions(dimension: usize) -> ([(usize, usize); 15], [(usize, usize); 15]) {
    let mut first = [(0, 0); 15];
    let mut second = [(0, 0); 15];

    // Around the top-left finder: row 8 left to right, then column 8 upwards
    let mut i = 0;
    for x in (0..6).chain([7, 8]) {
        first[i] = (x, 8);
        i += 1;
    }
    first[i] = (8, 7);
    i += 1;
    for y in (0..6).rev() {
        first[i] = (8, y);
        i += 1;
    }

    // Beside the bottom-left finder upwards, then under the top-right finder
    let mut i = 0;
    for y in ((dimension - 7)..dimension).rev() {
        second[i] = (8, y);
        i += 1;
    }
    for x in (dimension - 8)..dimension {
        second[i] = (x, 8);
        i += 1;
    }

    (first, second)
}

fn read_bits(grid: &SymbolGrid, coords: &[(usize, usize); 15]) -> u16 {
    coords
        .iter()
        .fold(0u16, |acc, &(x, y)| (acc << 1) | grid.get(x, y) as u16)
}
