//! Symbol location and grid sampling
//!
//! This module contains all the logic for finding symbols in a binary image:
//! - Finder square detection (the three QR corner markers)
//! - Grouping finder squares into ranked QR candidates
//! - Alignment pattern search (QR versions 2+)
//! - Perspective grid sampling
//! - Scan-line location of 1D start patterns

/// Alignment pattern search for QR versions 2+
pub mod alignment;
/// Finder square detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Finder triples ordered and ranked as QR candidates
pub mod grouping;
/// Start-pattern scanning for Code 128 and EAN
pub mod linear;
/// Module grid sampling through a perspective transform
pub mod sampler;

use crate::config::{DecodeOptions, max_candidates};
use crate::models::{BitMatrix, FinderCandidate, LumaImage, Symbology};

/// Every candidate for the enabled symbologies: QR triples best first, then 1D hits
pub fn locate(
    matrix: &BitMatrix,
    luma: Option<&LumaImage<'_>>,
    options: &DecodeOptions,
) -> Vec<FinderCandidate> {
    let mut candidates = Vec::new();
    if options.allows(Symbology::Qr) {
        let finders = finder::FinderDetector::detect(matrix, luma, options.try_harder);
        let limit = if options.try_harder {
            max_candidates() * 2
        } else {
            max_candidates()
        };
        candidates.extend(grouping::group_finder_patterns(
            matrix,
            &finders,
            options.try_harder,
            limit,
        ));
    }
    if options.wants_linear() {
        candidates.extend(linear::locate(matrix, options));
    }
    candidates
}
