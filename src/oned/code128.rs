//! Code 128 decoding from run lengths.
//!
//! Symbols are matched by width variance after removing the uniform bar
//! gain of print spread or resampling, the mod-103 checksum is checked and
//! the values are walked through the code set state machine.

use super::{LinearRead, ScanLine, bar_gain_variance, best_match};
use crate::error::StageError;
use crate::models::Symbology;

const MAX_AVG_VARIANCE: f32 = 0.25;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

/// Start in code set A
pub const START_A: usize = 103;
/// Start in code set B
pub const START_B: usize = 104;
/// Start in code set C
pub const START_C: usize = 105;
/// Latch to code set A (FNC4 in set A)
pub const CODE_A: usize = 101;
/// Latch to code set B (FNC4 in set B)
pub const CODE_B: usize = 100;
/// Latch to code set C
pub const CODE_C: usize = 99;
/// Switch between sets A and B for one character
pub const SHIFT: usize = 98;
/// GS1 marker, or GS inside data
pub const FNC1: usize = 102;
/// Message append; ignored
pub const FNC2: usize = 97;
/// Reader initialisation; ignored
pub const FNC3: usize = 96;
/// FNC4 shares its value with CODE_A in set B and CODE_B in set A
pub const FNC4_A: usize = 101;
/// FNC4 value while in set B
pub const FNC4_B: usize = 100;

/// Bar/space widths of values 0..=105 (six runs, eleven modules each)
pub const CODE_PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2],
];

/// Stop pattern including the final two-module bar
pub const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Whether a start pattern begins at bar run `index`, preceded by a quiet zone
pub fn is_start(line: &ScanLine, index: usize) -> bool {
    if index == 0 || !line.is_dark(index) || index + 6 > line.run_count() {
        return false;
    }
    let counters = &line.widths()[index..index + 6];
    if line.width(index - 1) * 2 < line.span(index, 6) {
        return false;
    }
    (START_A..=START_C).any(|code| symbol_variance(counters, &CODE_PATTERNS[code]) < MAX_AVG_VARIANCE)
}

fn symbol_variance(counters: &[u32], pattern: &[u8]) -> f32 {
    bar_gain_variance(counters, pattern, MAX_INDIVIDUAL_VARIANCE)
}

/// Decode a symbol whose start pattern begins at bar run `start`
pub fn decode_runs(line: &ScanLine, start: usize) -> Result<LinearRead, StageError> {
    if !is_start(line, start) {
        return Err(StageError::NoPatternFound);
    }
    let widths = line.widths();
    let (start_code, _) = best_match(
        &widths[start..start + 6],
        &CODE_PATTERNS[START_A..=START_C],
        symbol_variance,
    )
    .ok_or(StageError::NoPatternFound)?;
    let start_code = START_A + start_code;

    let mut codes = Vec::new();
    let mut run = start + 6;
    loop {
        if run + 7 <= widths.len()
            && symbol_variance(&widths[run..run + 7], &STOP_PATTERN) < MAX_AVG_VARIANCE
        {
            break;
        }
        if run + 6 > widths.len() {
            return Err(StageError::MalformedPayload("code 128 stop pattern missing"));
        }
        let (code, variance) = best_match(&widths[run..run + 6], &CODE_PATTERNS, symbol_variance)
            .ok_or(StageError::MalformedPayload("code 128 symbol unreadable"))?;
        if variance >= MAX_AVG_VARIANCE || code >= START_A {
            return Err(StageError::MalformedPayload("code 128 symbol unreadable"));
        }
        codes.push(code);
        run += 6;
    }

    // Quiet zone after the stop pattern
    let stop_width = line.span(run, 7);
    if run + 7 >= widths.len() || line.width(run + 7) * 2 < stop_width {
        return Err(StageError::MalformedPayload("code 128 trailing quiet zone missing"));
    }

    let (&checksum, data) = codes
        .split_last()
        .ok_or(StageError::MalformedPayload("code 128 symbol empty"))?;
    let sum = data
        .iter()
        .enumerate()
        .fold(start_code, |acc, (i, &code)| acc + (i + 1) * code);
    if sum % 103 != checksum {
        return Err(StageError::MalformedPayload("code 128 checksum mismatch"));
    }

    let bytes = decode_values(data, start_code)?;
    Ok(LinearRead {
        symbology: Symbology::Code128,
        text: bytes.iter().map(|&b| b as char).collect(),
        bytes,
        start: line.offset(start),
        end: line.offset(run + 7),
    })
}

/// Walk the code set state machine
fn decode_values(codes: &[usize], start_code: usize) -> Result<Vec<u8>, StageError> {
    let mut set = match start_code {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        _ => CodeSet::C,
    };
    let mut out = Vec::with_capacity(codes.len() * 2);
    let mut shifted = false;
    let mut fnc4_next = false;
    let mut fnc4_latched = false;

    for (i, &code) in codes.iter().enumerate() {
        let active = match (set, shifted) {
            (CodeSet::A, true) => CodeSet::B,
            (CodeSet::B, true) => CodeSet::A,
            (other, _) => other,
        };
        shifted = false;

        if code == FNC1 {
            // In first position FNC1 flags GS1 data and produces no character
            if i > 0 {
                out.push(0x1D);
            }
            continue;
        }

        match active {
            CodeSet::C => match code {
                0..=99 => {
                    out.push(b'0' + (code / 10) as u8);
                    out.push(b'0' + (code % 10) as u8);
                }
                CODE_B => set = CodeSet::B,
                CODE_A => set = CodeSet::A,
                _ => return Err(StageError::MalformedPayload("invalid code set C value")),
            },
            CodeSet::A | CodeSet::B => {
                let fnc4 = if active == CodeSet::A { FNC4_A } else { FNC4_B };
                match code {
                    0..=95 => {
                        let base = match active {
                            CodeSet::A if code < 64 => b' ' + code as u8,
                            CodeSet::A => (code - 64) as u8,
                            _ => b' ' + code as u8,
                        };
                        let extended = fnc4_latched != fnc4_next;
                        out.push(if extended { base.wrapping_add(128) } else { base });
                        fnc4_next = false;
                    }
                    FNC2 | FNC3 => {}
                    SHIFT => shifted = true,
                    CODE_C => set = CodeSet::C,
                    c if c == fnc4 => {
                        // A second FNC4 in a row toggles the latch
                        if fnc4_next {
                            fnc4_latched = !fnc4_latched;
                            fnc4_next = false;
                        } else {
                            fnc4_next = true;
                        }
                    }
                    _ => {
                        set = if active == CodeSet::A {
                            CodeSet::B
                        } else {
                            CodeSet::A
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::code128::encode;

    /// Scan line of a symbol drawn with `unit` pixels per module and a quiet zone
    fn line_for(widths: &[u8], unit: usize) -> ScanLine {
        let mut bits = vec![false; 10 * unit];
        for (i, &w) in widths.iter().enumerate() {
            bits.extend(std::iter::repeat_n(i % 2 == 0, w as usize * unit));
        }
        bits.extend(std::iter::repeat_n(false, 10 * unit));
        ScanLine::from_bits(&bits)
    }

    #[test]
    fn test_patterns_are_eleven_modules() {
        for pattern in CODE_PATTERNS {
            assert_eq!(pattern.iter().map(|&w| w as u32).sum::<u32>(), 11);
        }
        assert_eq!(STOP_PATTERN.iter().map(|&w| w as u32).sum::<u32>(), 13);
    }

    #[test]
    fn test_decode_set_b() {
        let line = line_for(&encode("Code-128!").unwrap(), 2);
        let read = decode_runs(&line, 1).unwrap();
        assert_eq!(read.text, "Code-128!");
        assert_eq!(read.symbology, Symbology::Code128);
        assert_eq!(read.start, 20);
    }

    #[test]
    fn test_decode_mixed_set_c() {
        let line = line_for(&encode("AB12345678X").unwrap(), 3);
        assert_eq!(decode_runs(&line, 1).unwrap().text, "AB12345678X");
    }

    #[test]
    fn test_set_a_controls_and_fnc1() {
        // START A, FNC1, 'A', TAB (73 = 64 + 9), FNC1, checksum, stop
        let values = [START_A, FNC1, 33, 73, FNC1];
        let checksum = values[1..]
            .iter()
            .enumerate()
            .fold(START_A, |acc, (i, &v)| acc + (i + 1) * v)
            % 103;
        let mut widths: Vec<u8> = values
            .iter()
            .chain(std::iter::once(&checksum))
            .flat_map(|&v| CODE_PATTERNS[v])
            .collect();
        widths.extend(STOP_PATTERN);
        let read = decode_runs(&line_for(&widths, 2), 1).unwrap();
        assert_eq!(read.bytes, b"A\t\x1D");
    }

    #[test]
    fn test_bad_checksum() {
        let mut widths = encode("HELLO").unwrap();
        // Swap the checksum symbol for value 0
        let checksum_at = widths.len() - 7 - 6;
        widths[checksum_at..checksum_at + 6].copy_from_slice(&CODE_PATTERNS[0]);
        let line = line_for(&widths, 2);
        assert_eq!(
            decode_runs(&line, 1),
            Err(StageError::MalformedPayload("code 128 checksum mismatch"))
        );
    }

    #[test]
    fn test_decode_with_bar_gain() {
        // Half a module of spread on each edge: bars one pixel wider, spaces one narrower
        let mut bits = vec![false; 24];
        for (i, &w) in encode("FLIPPED").unwrap().iter().enumerate() {
            let dark = i % 2 == 0;
            let width = if dark { 2 * w as usize + 1 } else { 2 * w as usize - 1 };
            bits.extend(std::iter::repeat_n(dark, width));
        }
        bits.extend(std::iter::repeat_n(false, 24));
        let line = ScanLine::from_bits(&bits);

        let start = &line.widths()[1..7];
        assert!(
            crate::oned::pattern_match_variance(start, &CODE_PATTERNS[START_B], MAX_INDIVIDUAL_VARIANCE)
                >= MAX_AVG_VARIANCE
        );
        let read = decode_runs(&line, 1).unwrap();
        assert_eq!(read.text, "FLIPPED");
        assert_eq!(read.start, 24);
    }

    #[test]
    fn test_not_a_start() {
        let line = ScanLine::from_bits(&[false, true, false, true, false]);
        assert!(!is_start(&line, 1));
        assert!(decode_runs(&line, 1).is_err());
    }
}
