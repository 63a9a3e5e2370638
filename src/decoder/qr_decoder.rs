//! Grid-level QR decoding: metadata, unmasking, error correction, payload.

use tracing::debug;

use crate::decoder::bitstream::extract_codewords;
use crate::decoder::codewords::{correct_blocks, deinterleave};
use crate::decoder::format::FormatInfo;
use crate::decoder::function_mask::FunctionMask;
use crate::decoder::payload::{Payload, decode_payload};
use crate::decoder::tables::block_layout;
use crate::decoder::unmask::apply_mask;
use crate::decoder::version;
use crate::error::StageError;
use crate::models::{QrMetadata, SymbolGrid};

/// A QR symbol decoded from a sampled grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedQr {
    /// Decoded segments
    pub payload: Payload,
    /// Version, level, mask and sequence information
    pub metadata: QrMetadata,
    /// Codewords repaired across all blocks
    pub error_count: usize,
}

/// Main QR decoder for rectified module grids
pub struct QrDecoder;

impl QrDecoder {
    /// Decode a grid whose dimension agrees with its version.
    ///
    /// When the direct reading fails the transposed grid is tried, which is
    /// how a mirrored symbol presents after sampling. The error of the
    /// direct reading is reported if both fail.
    pub fn decode(grid: &SymbolGrid) -> Result<DecodedQr, StageError> {
        match Self::decode_oriented(grid, false) {
            Ok(decoded) => Ok(decoded),
            Err(err) => {
                debug!(%err, "direct reading failed, trying mirrored");
                Self::decode_oriented(&grid.transposed(), true).map_err(|_| err)
            }
        }
    }

    fn decode_oriented(grid: &SymbolGrid, mirrored: bool) -> Result<DecodedQr, StageError> {
        let format = FormatInfo::extract(grid)?;
        let version = version::extract(grid)?;
        if version.dimension() != grid.dimension() {
            return Err(StageError::SamplingFailed("dimension disagrees with version"));
        }

        let func = FunctionMask::new(version);
        let mut unmasked = grid.clone();
        apply_mask(&mut unmasked, format.mask_pattern, &func);

        let raw = extract_codewords(&unmasked, &func);
        let layout = block_layout(version, format.ec_level);
        let blocks = deinterleave(&raw, &layout)?;
        let (data, error_count) = correct_blocks(blocks, layout.ecc_per_block)?;
        let payload = decode_payload(&data, version)?;

        debug!(
            version = version.number(),
            ec_level = %format.ec_level,
            mask = format.mask_pattern.bits(),
            error_count,
            mirrored,
            "grid decoded"
        );

        Ok(DecodedQr {
            metadata: QrMetadata {
                version,
                ec_level: format.ec_level,
                mask: format.mask_pattern,
                mirrored,
                structured_append: payload.structured_append,
                gs1: payload.gs1,
            },
            payload,
            error_count,
        })
    }
}
