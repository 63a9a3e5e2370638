//! 1D symbologies decoded from the run lengths of a single scan line.
//!
//! - Code 128: code sets A/B/C, SHIFT, FNC1, FNC4
//! - EAN-13, reported as UPC-A when it carries a leading zero and the
//!   options ask for it

pub mod code128;
pub mod ean;

use crate::models::Symbology;

/// Light/dark run lengths of one binarized scan line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanLine {
    widths: Vec<u32>,
    offsets: Vec<usize>,
    first_dark: bool,
    len: usize,
}

impl ScanLine {
    /// Run-length encode a line of module values (`true` = dark)
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut widths = Vec::new();
        let mut offsets = Vec::new();
        let mut current = None;
        for (i, &bit) in bits.iter().enumerate() {
            if current == Some(bit) {
                if let Some(last) = widths.last_mut() {
                    *last += 1;
                }
            } else {
                widths.push(1);
                offsets.push(i);
                current = Some(bit);
            }
        }
        Self {
            widths,
            offsets,
            first_dark: bits.first().copied().unwrap_or(false),
            len: bits.len(),
        }
    }

    /// Number of runs
    pub fn run_count(&self) -> usize {
        self.widths.len()
    }

    /// All run widths, first run first
    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Whether run `index` is a bar
    pub fn is_dark(&self, index: usize) -> bool {
        (index % 2 == 0) == self.first_dark
    }

    /// Pixel offset where run `index` starts; the line length past the last run
    pub fn offset(&self, index: usize) -> usize {
        self.offsets.get(index).copied().unwrap_or(self.len)
    }

    /// Width of run `index`, 0 past either end
    pub fn width(&self, index: usize) -> u32 {
        self.widths.get(index).copied().unwrap_or(0)
    }

    /// Run starting exactly at pixel `offset`
    pub fn run_at(&self, offset: usize) -> Option<usize> {
        self.offsets.binary_search(&offset).ok()
    }

    /// Total pixel width of `count` runs starting at `index`
    pub fn span(&self, index: usize, count: usize) -> u32 {
        self.widths.iter().skip(index).take(count).sum()
    }
}

/// Symbol read from one scan line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearRead {
    /// Code 128, EAN-13 or UPC-A
    pub symbology: Symbology,
    /// Decoded text
    pub text: String,
    /// Decoded bytes; Code 128 FNC1 maps to GS (0x1D)
    pub bytes: Vec<u8>,
    /// First pixel of the start pattern
    pub start: usize,
    /// One past the last pixel of the stop pattern
    pub end: usize,
}

/// Average relative deviation of observed run widths from a module pattern.
///
/// Returns `f32::INFINITY` when any single run deviates by more than
/// `max_individual` modules.
pub fn pattern_match_variance(counters: &[u32], pattern: &[u8], max_individual: f32) -> f32 {
    let total: u32 = counters.iter().sum();
    let pattern_length: u32 = pattern.iter().map(|&p| p as u32).sum();
    if counters.len() != pattern.len() || total < pattern_length || total == 0 {
        return f32::INFINITY;
    }
    let unit = total as f32 / pattern_length as f32;
    let max_individual = max_individual * unit;

    let mut total_variance = 0.0;
    for (&counter, &expected) in counters.iter().zip(pattern) {
        let variance = (counter as f32 - expected as f32 * unit).abs();
        if variance > max_individual {
            return f32::INFINITY;
        }
        total_variance += variance;
    }
    total_variance / total as f32
}

/// [`pattern_match_variance`] after removing a uniform bar gain.
///
/// Ink spread, blur and resampling widen every bar and narrow every space
/// by about the same amount. `counters` must start with a bar. The module
/// width `u` and the gain `g` are solved from the bar and space totals
/// (`bars = Pb*u + nb*g`, `spaces = Ps*u - ns*g`); a gain beyond one module
/// is no match.
pub fn bar_gain_variance(counters: &[u32], pattern: &[u8], max_individual: f32) -> f32 {
    if counters.len() != pattern.len() || counters.len() < 2 {
        return f32::INFINITY;
    }
    let total: u32 = counters.iter().sum();
    if total == 0 {
        return f32::INFINITY;
    }

    let (mut bars, mut spaces) = (0.0f32, 0.0f32);
    let (mut bar_modules, mut space_modules) = (0.0f32, 0.0f32);
    for (i, (&counter, &expected)) in counters.iter().zip(pattern).enumerate() {
        if i % 2 == 0 {
            bars += counter as f32;
            bar_modules += expected as f32;
        } else {
            spaces += counter as f32;
            space_modules += expected as f32;
        }
    }
    let bar_runs = counters.len().div_ceil(2) as f32;
    let space_runs = (counters.len() / 2) as f32;

    let unit = (bars * space_runs + spaces * bar_runs)
        / (bar_modules * space_runs + space_modules * bar_runs);
    if unit <= 0.0 || !unit.is_finite() {
        return f32::INFINITY;
    }
    let gain = (bars - bar_modules * unit) / bar_runs;
    if gain.abs() > unit {
        return f32::INFINITY;
    }

    let max_individual = max_individual * unit;
    let mut total_variance = 0.0;
    for (i, (&counter, &expected)) in counters.iter().zip(pattern).enumerate() {
        let gain = if i % 2 == 0 { gain } else { -gain };
        let variance = (counter as f32 - expected as f32 * unit - gain).abs();
        if variance > max_individual {
            return f32::INFINITY;
        }
        total_variance += variance;
    }
    total_variance / total as f32
}

/// Best matching pattern index and its score under `score`
pub(crate) fn best_match<const N: usize>(
    counters: &[u32],
    patterns: &[[u8; N]],
    score: impl Fn(&[u32], &[u8]) -> f32,
) -> Option<(usize, f32)> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (i, score(counters, p)))
        .filter(|(_, v)| v.is_finite())
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
