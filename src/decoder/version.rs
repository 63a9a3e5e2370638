//! Version information for versions 7-40: two 6x3 blocks next to the
//! top-right and bottom-left finders.

use tracing::trace;

use super::bch::{nearest_version, version_code};
use crate::error::StageError;
use crate::models::{SymbolGrid, Version};

const MAX_VERSION_DISTANCE: u32 = 3;

/// Module coordinates `(x, y)` of bit `i` (0 = least significant) in each block
pub fn positions(dimension: usize, i: usize) -> ((usize, usize), (usize, usize)) {
    let a = dimension - 11 + i % 3;
    let b = i / 3;
    ((a, b), (b, a))
}

/// Version of a sampled grid.
///
/// Below dimension 45 the dimension alone decides. Above it the nearer of
/// the two version blocks is used if it is within three bit errors; the
/// result may disagree with the grid dimension, which the caller handles
/// by resampling.
pub fn extract(grid: &SymbolGrid) -> Result<Version, StageError> {
    let dimension = grid.dimension();
    let provisional =
        Version::from_dimension(dimension).ok_or(StageError::SamplingFailed("invalid dimension"))?;
    if !provisional.has_version_info() {
        return Ok(provisional);
    }

    let mut top_right = 0u32;
    let mut bottom_left = 0u32;
    for i in (0..18).rev() {
        let (tr, bl) = positions(dimension, i);
        top_right = (top_right << 1) | grid.get(tr.0, tr.1) as u32;
        bottom_left = (bottom_left << 1) | grid.get(bl.0, bl.1) as u32;
    }

    let (v1, d1) = nearest_version(top_right);
    let (v2, d2) = nearest_version(bottom_left);
    trace!(top_right, d1, bottom_left, d2, "version blocks");
    let (number, distance) = if d1 <= d2 { (v1, d1) } else { (v2, d2) };
    if distance > MAX_VERSION_DISTANCE {
        return Err(StageError::MetadataUncorrectable("version information"));
    }
    Version::new(number).ok_or(StageError::MetadataUncorrectable("version information"))
}

/// Write both version blocks into a grid (no-op below version 7)
pub fn write(grid: &mut SymbolGrid, version: Version) {
    if !version.has_version_info() {
        return;
    }
    let code = version_code(version.number());
    for i in 0..18 {
        let bit = (code >> i) & 1 == 1;
        let (tr, bl) = positions(grid.dimension(), i);
        grid.set(tr.0, tr.1, bit);
        grid.set(bl.0, bl.1, bit);
    }
}
