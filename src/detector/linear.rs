//! Scan-line locator for 1D symbols.
//!
//! Rows are visited from the middle of the image outward; with `try_rotate`
//! the columns are visited the same way. Each line is run-length encoded
//! and searched forwards and reversed for Code 128 start patterns and EAN
//! start guards.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::config::DecodeOptions;
use crate::models::{BitMatrix, CandidateKind, FinderCandidate, Point, Symbology};
use crate::oned::{ScanLine, code128, ean};

/// Start patterns reported per symbology, line and direction
const MAX_HITS_PER_LINE: usize = 4;
const MAX_LINES: usize = 15;

/// Line indices to scan, middle first, alternating outward
pub fn line_order(extent: usize, try_harder: bool) -> Vec<usize> {
    if extent == 0 {
        return Vec::new();
    }
    let step = (extent >> if try_harder { 8 } else { 5 }).max(1);
    let max_lines = if try_harder { extent } else { MAX_LINES };
    let middle = extent / 2;

    let mut lines = Vec::new();
    for x in 0..max_lines {
        let steps = (x + 1) / 2;
        let offset = step * steps;
        let line = if x % 2 == 0 {
            middle.checked_add(offset).filter(|&l| l < extent)
        } else {
            middle.checked_sub(offset)
        };
        match line {
            Some(l) => lines.push(l),
            None => break,
        }
    }
    lines
}

/// Module values along a row or column, optionally reversed
pub fn line_bits(matrix: &BitMatrix, line: usize, vertical: bool, reversed: bool) -> Vec<bool> {
    let mut bits = Vec::new();
    if vertical {
        matrix.column_into(line, &mut bits);
    } else {
        matrix.row_into(line, &mut bits);
    }
    if reversed {
        bits.reverse();
    }
    bits
}

/// Image point at `offset` pixels along a scan line, on its leading edge
pub fn line_point(
    matrix: &BitMatrix,
    line: usize,
    vertical: bool,
    reversed: bool,
    offset: f32,
) -> Point {
    let length = if vertical {
        matrix.height()
    } else {
        matrix.width()
    } as f32;
    let along = if reversed { length - offset } else { offset };
    if vertical {
        Point::new(line as f32, along)
    } else {
        Point::new(along, line as f32)
    }
}

fn orientation(vertical: bool, reversed: bool) -> f32 {
    match (vertical, reversed) {
        (false, false) => 0.0,
        (false, true) => PI,
        (true, false) => FRAC_PI_2,
        (true, true) => -FRAC_PI_2,
    }
}

/// Start-pattern hits for every enabled linear symbology, nearest the image middle first
pub fn locate(matrix: &BitMatrix, options: &DecodeOptions) -> Vec<FinderCandidate> {
    let want_code128 = options.allows(Symbology::Code128);
    let want_ean = options.allows(Symbology::Ean13) || options.allows(Symbology::UpcA);
    if !want_code128 && !want_ean {
        return Vec::new();
    }

    let mut passes = vec![false];
    if options.try_rotate {
        passes.push(true);
    }

    let mut candidates = Vec::new();
    for vertical in passes {
        let extent = if vertical {
            matrix.width()
        } else {
            matrix.height()
        };
        for line in line_order(extent, options.try_harder) {
            for reversed in [false, true] {
                let scan = ScanLine::from_bits(&line_bits(matrix, line, vertical, reversed));
                let mut hits = [0usize; 2];
                for index in 0..scan.run_count() {
                    let found = if want_code128
                        && hits[0] < MAX_HITS_PER_LINE
                        && code128::is_start(&scan, index)
                    {
                        hits[0] += 1;
                        Some((Symbology::Code128, 6, 11.0))
                    } else if want_ean && hits[1] < MAX_HITS_PER_LINE && ean::is_start(&scan, index)
                    {
                        hits[1] += 1;
                        Some((Symbology::Ean13, 3, 3.0))
                    } else {
                        None
                    };
                    let Some((symbology, runs, modules)) = found else {
                        continue;
                    };

                    let start = scan.offset(index);
                    let end = scan.offset(index + runs);
                    let mid = (start + end) as f32 / 2.0;
                    candidates.push(FinderCandidate {
                        kind: CandidateKind::Linear {
                            symbology,
                            line,
                            vertical,
                            start,
                            end,
                            reversed,
                        },
                        center: line_point(matrix, line, vertical, reversed, mid),
                        module_size: (end - start) as f32 / modules,
                        orientation: orientation(vertical, reversed),
                        score: candidates.len() as f32,
                    });
                }
            }
        }
    }
    candidates
}
