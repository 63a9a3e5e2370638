/// Alignment pattern search for QR versions 2+
use crate::models::{BitMatrix, Point};
use crate::utils::geometry::PerspectiveTransform;

/// Largest number of the 25 sampled modules allowed to disagree
const MAX_MISMATCH: usize = 3;

/// Locate the alignment pattern whose centre module sits at `center` in
/// module space, searching around where `transform` predicts it.
///
/// The 5x5 pattern is sampled through the transform so that rotation and
/// skew are followed. Returns the image-space centre, averaged over equally
/// good positions next to the best one.
pub fn find_alignment(
    matrix: &BitMatrix,
    transform: &PerspectiveTransform,
    center: Point,
    module_size: f32,
) -> Option<Point> {
    let predicted = transform.transform(&center)?;
    if !predicted.x.is_finite() || !predicted.y.is_finite() || module_size < 1.0 {
        return None;
    }

    // Expected colour and image-space offset of each module of the pattern
    let mut offsets = Vec::with_capacity(25);
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let expected_dark = dx.abs() == 2 || dy.abs() == 2 || (dx == 0 && dy == 0);
            let at = transform.transform(&Point::new(center.x + dx as f32, center.y + dy as f32))?;
            offsets.push((predicted.to(&at), expected_dark));
        }
    }

    let radius = (module_size * 4.0).max(4.0);
    let step = (module_size / 3.0).floor().max(1.0);
    let steps = (radius / step).ceil() as i32;

    let mut best_mismatch = usize::MAX;
    let mut best: Vec<Point> = Vec::new();
    for sy in -steps..=steps {
        for sx in -steps..=steps {
            let candidate = Point::new(
                predicted.x + sx as f32 * step,
                predicted.y + sy as f32 * step,
            );
            let Some(mismatch) = mismatch_at(matrix, &candidate, &offsets) else {
                continue;
            };
            if mismatch < best_mismatch {
                best_mismatch = mismatch;
                best.clear();
                best.push(candidate);
            } else if mismatch == best_mismatch {
                best.push(candidate);
            }
        }
    }

    if best_mismatch > MAX_MISMATCH {
        return None;
    }
    let first = *best.first()?;
    let near: Vec<&Point> = best
        .iter()
        .filter(|p| p.distance(&first) <= module_size * 1.5)
        .collect();
    let n = near.len() as f32;
    let (sx, sy) = near.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

fn mismatch_at(matrix: &BitMatrix, center: &Point, offsets: &[(Point, bool)]) -> Option<usize> {
    let mut mismatches = 0usize;
    for (offset, expected_dark) in offsets {
        let x = (center.x + offset.x).floor();
        let y = (center.y + offset.y).floor();
        if x < 0.0 || y < 0.0 || x >= matrix.width() as f32 || y >= matrix.height() as f32 {
            return None;
        }
        if matrix.get(x as usize, y as usize) != *expected_dark {
            mismatches += 1;
        }
    }
    Some(mismatches)
}
