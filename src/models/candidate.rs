use super::{Point, Symbology};

/// What a locator hit refers to
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateKind {
    /// Three ordered QR finder centres
    Qr {
        /// Finder at the symbol's top-left corner
        top_left: Point,
        /// Finder at the top-right corner
        top_right: Point,
        /// Finder at the bottom-left corner
        bottom_left: Point,
    },
    /// A scan line crossing a 1D symbol's start pattern
    Linear {
        /// Symbology whose start pattern matched
        symbology: Symbology,
        /// Row index, or column index when `vertical`
        line: usize,
        /// Scan runs along a column instead of a row
        vertical: bool,
        /// First pixel of the start pattern along the line
        start: usize,
        /// Pixel after the end of the matched pattern along the line
        end: usize,
        /// The symbol reads right-to-left along the line
        reversed: bool,
    },
}

/// Geometric descriptor produced by the locator and consumed by the sampler
#[derive(Debug, Clone, PartialEq)]
pub struct FinderCandidate {
    /// Kind-specific geometry
    pub kind: CandidateKind,
    /// Approximate symbol centre (QR) or start-pattern centre (1D)
    pub center: Point,
    /// Estimated module size in pixels
    pub module_size: f32,
    /// Angle of the symbol's x axis in radians
    pub orientation: f32,
    /// Ranking score, lower is better
    pub score: f32,
}

impl FinderCandidate {
    /// Symbology this candidate is evaluated as
    pub fn symbology(&self) -> Symbology {
        match &self.kind {
            CandidateKind::Qr { .. } => Symbology::Qr,
            CandidateKind::Linear { symbology, .. } => *symbology,
        }
    }
}
