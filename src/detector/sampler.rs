//! Grid sampling: module-space to image-space mapping and majority-vote reads.
//!
//! The three finder centres sit at module coordinates `(3.5, 3.5)`,
//! `(dim - 3.5, 3.5)` and `(3.5, dim - 3.5)`. The fourth reference point is
//! the bottom-right alignment pattern when one is found, otherwise the
//! corner extrapolated from the finder parallelogram.

use tracing::trace;

use super::alignment::find_alignment;
use crate::error::StageError;
use crate::models::{BitMatrix, Point, SymbolGrid, Version};
use crate::utils::geometry::PerspectiveTransform;

/// A grid read from the image together with its geometry
#[derive(Debug, Clone)]
pub struct SampledGrid {
    /// Module values, `true` = dark
    pub grid: SymbolGrid,
    /// Module space to image space
    pub transform: PerspectiveTransform,
    /// Symbol corners in the image: top-left, top-right, bottom-right, bottom-left
    pub position: [Point; 4],
    /// Whether an alignment pattern anchored the transform
    pub aligned: bool,
}

/// Dimension implied by the finder spacing, snapped to `17 + 4v`.
///
/// `None` when the estimate falls outside versions 1..=40.
pub fn estimate_dimension(
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    module_size: f32,
) -> Option<usize> {
    if module_size <= 0.0 || !module_size.is_finite() {
        return None;
    }
    let across = top_left.distance(top_right) / module_size;
    let down = top_left.distance(bottom_left) / module_size;
    let raw = ((across + down) / 2.0).round() as i64 + 7;
    let dimension = match raw.rem_euclid(4) {
        0 => raw + 1,
        2 => raw - 1,
        3 => raw - 2,
        _ => raw,
    };
    let dimension = usize::try_from(dimension).ok()?;
    Version::from_dimension(dimension).map(|_| dimension)
}

/// Module size measured across the finders along the symbol's own axes.
///
/// Run widths taken along image rows overstate the module size of a rotated
/// symbol; measuring on the lines between finder centres does not.
pub fn measure_module_size(
    matrix: &BitMatrix,
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
) -> Option<f32> {
    let across = finder_width_between(matrix, top_left, top_right);
    let down = finder_width_between(matrix, top_left, bottom_left);
    match (across, down) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

/// Mean finder width along the line joining two finder centres, in modules of 1/7
fn finder_width_between(matrix: &BitMatrix, from: &Point, to: &Point) -> Option<f32> {
    let one = finder_width_along(matrix, from, to)?;
    let two = finder_width_along(matrix, to, from)?;
    Some((one + two) / 14.0)
}

/// Width of the finder centred at `center`, measured through it toward `toward`
fn finder_width_along(matrix: &BitMatrix, center: &Point, toward: &Point) -> Option<f32> {
    let length = center.distance(toward);
    if length < 1.0 {
        return None;
    }
    let dir = Point::new((toward.x - center.x) / length, (toward.y - center.y) / length);
    let forward = dark_light_dark_run(matrix, center, dir, length)?;
    let back = dark_light_dark_run(matrix, center, Point::new(-dir.x, -dir.y), length)?;
    Some(forward + back - 1.0)
}

/// Distance from the dark centre through one light and one dark run
fn dark_light_dark_run(matrix: &BitMatrix, from: &Point, dir: Point, max_len: f32) -> Option<f32> {
    let mut state = 0;
    let mut t = 0.0f32;
    while t <= max_len {
        let x = (from.x + dir.x * t).floor();
        let y = (from.y + dir.y * t).floor();
        if x < 0.0 || y < 0.0 || x >= matrix.width() as f32 || y >= matrix.height() as f32 {
            return (state == 2).then_some(t);
        }
        let dark = matrix.get(x as usize, y as usize);
        match (state, dark) {
            (0, false) => state = 1,
            (1, true) => state = 2,
            (2, false) => return Some(t),
            _ => {}
        }
        t += 1.0;
    }
    None
}

/// Sample the symbol anchored on three finder centres at `dimension` modules
pub fn sample_qr(
    matrix: &BitMatrix,
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    module_size: f32,
    dimension: usize,
) -> Result<SampledGrid, StageError> {
    let version =
        Version::from_dimension(dimension).ok_or(StageError::SamplingFailed("invalid dimension"))?;
    let d = dimension as f32;

    let bottom_right = Point::new(
        top_right.x + bottom_left.x - top_left.x,
        top_right.y + bottom_left.y - top_left.y,
    );
    let mut src = [
        Point::new(3.5, 3.5),
        Point::new(d - 3.5, 3.5),
        Point::new(d - 3.5, d - 3.5),
        Point::new(3.5, d - 3.5),
    ];
    let mut dst = [*top_left, *top_right, bottom_right, *bottom_left];
    let coarse = PerspectiveTransform::from_points(&src, &dst)
        .ok_or(StageError::SamplingFailed("singular transform"))?;

    let mut transform = coarse;
    let mut aligned = false;
    if version.number() >= 2 {
        let align_src = Point::new(d - 6.5, d - 6.5);
        if let Some(found) = find_alignment(matrix, &coarse, align_src, module_size) {
            src[2] = align_src;
            dst[2] = found;
            if let Some(refined) = PerspectiveTransform::from_points(&src, &dst) {
                transform = refined;
                aligned = true;
            }
        } else {
            trace!(version = version.number(), "alignment pattern not found, using extrapolated corner");
        }
    }

    let grid = sample_grid(matrix, &transform, dimension)?;
    let corner = |x: f32, y: f32| {
        transform
            .transform(&Point::new(x, y))
            .ok_or(StageError::SamplingFailed("corner at infinity"))
    };
    let position = [
        corner(0.0, 0.0)?,
        corner(d, 0.0)?,
        corner(d, d)?,
        corner(0.0, d)?,
    ];

    Ok(SampledGrid {
        grid,
        transform,
        position,
        aligned,
    })
}

/// Widest majority-vote window, in pixels either side of the centre
const MAX_VOTE_RADIUS: i32 = 2;

/// Read every module centre through `transform` with a majority vote.
///
/// The vote window spans a third of the smallest module pitch on each side
/// of the centre, so modules under 3 px read their centre pixel alone.
/// Fails when any module centre projects outside the image.
pub fn sample_grid(
    matrix: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
) -> Result<SymbolGrid, StageError> {
    let (width, height) = (matrix.width() as f64, matrix.height() as f64);
    let radius = vote_radius(transform, dimension);
    let mut grid = SymbolGrid::new(dimension);

    for y in 0..dimension {
        for x in 0..dimension {
            let (px, py) = transform
                .transform_f64(x as f64 + 0.5, y as f64 + 0.5)
                .ok_or(StageError::SamplingFailed("module centre at infinity"))?;
            if !(0.0..width).contains(&px) || !(0.0..height).contains(&py) {
                return Err(StageError::SamplingFailed("module centre outside image"));
            }
            let (ix, iy) = (px.floor() as i32, py.floor() as i32);

            let mut dark = 0;
            let mut total = 0;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (sx, sy) = (ix + dx, iy + dy);
                    if sx < 0 || sy < 0 || sx as f64 >= width || sy as f64 >= height {
                        continue;
                    }
                    total += 1;
                    if matrix.get(sx as usize, sy as usize) {
                        dark += 1;
                    }
                }
            }
            grid.set(x, y, dark * 2 > total);
        }
    }

    Ok(grid)
}

/// Vote radius from the smallest module pitch at the four symbol corners
fn vote_radius(transform: &PerspectiveTransform, dimension: usize) -> i32 {
    let far = dimension as f64 - 0.5;
    let mut pitch = f64::INFINITY;
    for (x, y) in [(0.5, 0.5), (far, 0.5), (far, far), (0.5, far)] {
        let step_x = if x < 1.0 { 1.0 } else { -1.0 };
        let step_y = if y < 1.0 { 1.0 } else { -1.0 };
        let (Some(centre), Some(across), Some(down)) = (
            transform.transform_f64(x, y),
            transform.transform_f64(x + step_x, y),
            transform.transform_f64(x, y + step_y),
        ) else {
            return 0;
        };
        let distance = |(ax, ay): (f64, f64)| (ax - centre.0).hypot(ay - centre.1);
        pitch = pitch.min(distance(across)).min(distance(down));
    }
    if pitch.is_finite() {
        ((pitch / 3.0).floor() as i32).clamp(0, MAX_VOTE_RADIUS)
    } else {
        0
    }
}
