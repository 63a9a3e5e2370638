//! Finder triples: size binning, ordering and geometric scoring.

use tracing::trace;

use super::finder::FinderPattern;
use super::sampler::{estimate_dimension, measure_module_size};
use crate::models::{BitMatrix, CandidateKind, FinderCandidate, Point};
use crate::utils::geometry::corner_cosine;

/// Finder sizes within this ratio share a bin
const BIN_RATIO: f32 = 1.25;

/// A triple with its corners identified
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedTriple {
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    module_size: f32,
}

/// Label the right-angle corner top-left; the cross product decides the rest.
///
/// The module size is measured between the finders when the matrix allows,
/// since row runs overstate it for rotated symbols. Rejects triples whose
/// implied module size disagrees with the finders'.
fn order_finder_patterns(
    matrix: &BitMatrix,
    a: &FinderPattern,
    b: &FinderPattern,
    c: &FinderPattern,
) -> Option<OrderedTriple> {
    let patterns = [a, b, c];
    if patterns.iter().any(|p| p.module_size < 1.0) {
        return None;
    }

    let best_idx = (0..3).min_by(|&i, &j| {
        let cos = |k: usize| {
            corner_cosine(
                &patterns[k].center,
                &patterns[(k + 1) % 3].center,
                &patterns[(k + 2) % 3].center,
            )
            .abs()
        };
        cos(i).total_cmp(&cos(j))
    })?;

    let tl = patterns[best_idx];
    let p1 = patterns[(best_idx + 1) % 3];
    let p2 = patterns[(best_idx + 2) % 3];
    let v1 = tl.center.to(&p1.center);
    let v2 = tl.center.to(&p2.center);
    let cross = v1.x * v2.y - v1.y * v2.x;
    let (tr, bl) = if cross > 0.0 { (p1, p2) } else { (p2, p1) };

    let avg_module = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
    let measured = measure_module_size(matrix, &tl.center, &tr.center, &bl.center)
        .filter(|m| *m >= 1.0)
        .unwrap_or(avg_module);
    let dim = estimate_dimension(&tl.center, &tr.center, &bl.center, measured)?;
    let d_tr = tl.center.distance(&tr.center);
    let d_bl = tl.center.distance(&bl.center);
    let module_size = (d_tr + d_bl) / 2.0 / (dim as f32 - 7.0);
    let module_ratio = module_size / avg_module;
    if !(0.5..=1.5).contains(&module_ratio) {
        return None;
    }

    Some(OrderedTriple {
        top_left: tl.center,
        top_right: tr.center,
        bottom_left: bl.center,
        module_size,
    })
}

/// Sort finder indices by module size and cut into bins of similar size
fn size_bins(patterns: &[FinderPattern]) -> Vec<Vec<usize>> {
    let mut indexed: Vec<(usize, f32)> = patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.module_size))
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut bins: Vec<Vec<usize>> = Vec::new();
    let mut bin_min = 0.0f32;
    for (idx, size) in indexed {
        match bins.last_mut() {
            Some(current) if size <= bin_min * BIN_RATIO => current.push(idx),
            _ => {
                bins.push(vec![idx]);
                bin_min = size;
            }
        }
    }
    bins
}

/// Ranking of a triple, lower is better, plus its tie-breakers
fn triple_score(patterns: [&FinderPattern; 3], ordered: &OrderedTriple) -> (f32, f32, f32) {
    let sizes = patterns.map(|p| p.module_size);
    let min_size = sizes.iter().copied().fold(f32::INFINITY, f32::min);
    let max_size = sizes.iter().copied().fold(0.0f32, f32::max);
    let size_ratio = max_size / min_size;

    let d_tr = ordered.top_left.distance(&ordered.top_right);
    let d_bl = ordered.top_left.distance(&ordered.bottom_left);
    let spacing = (d_tr - d_bl).abs() / d_tr.max(d_bl);
    let right_angle =
        corner_cosine(&ordered.top_left, &ordered.top_right, &ordered.bottom_left).abs();

    let contrast = patterns.iter().map(|p| p.contrast).sum::<f32>() / 3.0;
    let ratio_error = patterns.iter().map(|p| p.ratio_error).sum::<f32>() / 3.0;
    (
        (size_ratio - 1.0) * 2.0 + spacing + right_angle,
        -contrast,
        ratio_error,
    )
}

/// Build ranked QR candidates from finder squares, best first.
///
/// Every compatible triple becomes a candidate, so one finder may take part
/// in several. At most `limit` candidates are returned.
pub fn group_finder_patterns(
    matrix: &BitMatrix,
    patterns: &[FinderPattern],
    try_harder: bool,
    limit: usize,
) -> Vec<FinderCandidate> {
    if patterns.len() < 3 {
        return Vec::new();
    }

    let max_cos = if try_harder { 0.5 } else { 0.4 };
    let bins = if try_harder {
        vec![(0..patterns.len()).collect()]
    } else {
        size_bins(patterns)
    };

    let mut seen = std::collections::HashSet::new();
    let mut scored: Vec<((f32, f32, f32), FinderCandidate)> = Vec::new();
    for (b, bin) in bins.iter().enumerate() {
        // A bin together with its neighbour tolerates a slight size mismatch
        let mut indices = bin.clone();
        if let Some(next) = bins.get(b + 1) {
            indices.extend_from_slice(next);
        }
        indices.sort_unstable();

        for (x, &i) in indices.iter().enumerate() {
            for (y, &j) in indices.iter().enumerate().skip(x + 1) {
                for &k in indices.iter().skip(y + 1) {
                    if !seen.insert((i, j, k)) {
                        continue;
                    }
                    let triple = [&patterns[i], &patterns[j], &patterns[k]];
                    if let Some(candidate) = evaluate_triple(matrix, triple, max_cos) {
                        scored.push(candidate);
                    }
                }
            }
        }
    }

    scored.sort_by(|a, b| {
        a.0.0
            .total_cmp(&b.0.0)
            .then(a.0.1.total_cmp(&b.0.1))
            .then(a.0.2.total_cmp(&b.0.2))
    });
    trace!(
        finders = patterns.len(),
        triples = scored.len(),
        limit,
        "finder triples ranked"
    );
    scored.truncate(limit);
    scored.into_iter().map(|(_, candidate)| candidate).collect()
}

fn evaluate_triple(
    matrix: &BitMatrix,
    triple: [&FinderPattern; 3],
    max_cos: f32,
) -> Option<((f32, f32, f32), FinderCandidate)> {
    let sizes = triple.map(|p| p.module_size);
    let min_size = sizes.iter().copied().fold(f32::INFINITY, f32::min);
    let max_size = sizes.iter().copied().fold(0.0f32, f32::max);
    if max_size / min_size > 2.0 {
        return None;
    }

    let ordered = order_finder_patterns(matrix, triple[0], triple[1], triple[2])?;
    let d_tr = ordered.top_left.distance(&ordered.top_right);
    let d_bl = ordered.top_left.distance(&ordered.bottom_left);
    // Version 1 finder centres are 14 modules apart
    if d_tr.min(d_bl) < ordered.module_size * 10.0 || d_tr.max(d_bl) / d_tr.min(d_bl) > 1.6 {
        return None;
    }
    let cos = corner_cosine(&ordered.top_left, &ordered.top_right, &ordered.bottom_left);
    if cos.abs() > max_cos {
        return None;
    }

    let score = triple_score(triple, &ordered);
    let axis = ordered.top_left.to(&ordered.top_right);
    let candidate = FinderCandidate {
        kind: CandidateKind::Qr {
            top_left: ordered.top_left,
            top_right: ordered.top_right,
            bottom_left: ordered.bottom_left,
        },
        center: ordered.top_right.midpoint(&ordered.bottom_left),
        module_size: ordered.module_size,
        orientation: axis.y.atan2(axis.x),
        score: score.0,
    };
    Some((score, candidate))
}
