//! EAN-13 / UPC-A decoding from run lengths.

use super::{LinearRead, ScanLine, best_match, pattern_match_variance};
use crate::config::DecodeOptions;
use crate::error::StageError;
use crate::models::Symbology;

const MAX_AVG_VARIANCE: f32 = 0.48;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

/// Bar, space, bar at both ends
pub const START_END_GUARD: [u8; 3] = [1, 1, 1];
/// Space, bar, space, bar, space between the halves
pub const MIDDLE_GUARD: [u8; 5] = [1, 1, 1, 1, 1];

/// Odd-parity (L) digit widths; R digits share them with colours inverted
pub const L_PATTERNS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// L patterns followed by the even-parity (G) patterns, which are L reversed
pub const L_AND_G_PATTERNS: [[u8; 4]; 20] = {
    let mut out = [[0u8; 4]; 20];
    let mut i = 0;
    while i < 10 {
        out[i] = L_PATTERNS[i];
        let p = L_PATTERNS[i];
        out[i + 10] = [p[3], p[2], p[1], p[0]];
        i += 1;
    }
    out
};

/// Parity of the six left digits (bit 5 = first, set = G) for leading digit 0..=9
pub const FIRST_DIGIT_ENCODINGS: [u8; 10] = [0x00, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A];

/// Whether a start guard begins at bar run `index` with a quiet zone before it
pub fn is_start(line: &ScanLine, index: usize) -> bool {
    if index == 0 || !line.is_dark(index) || index + 3 > line.run_count() {
        return false;
    }
    let guard = &line.widths()[index..index + 3];
    line.width(index - 1) >= line.span(index, 3)
        && pattern_match_variance(guard, &START_END_GUARD, MAX_INDIVIDUAL_VARIANCE)
            < MAX_AVG_VARIANCE
}

fn digit(line: &ScanLine, run: usize, patterns: &[[u8; 4]]) -> Result<usize, StageError> {
    if run + 4 > line.run_count() {
        return Err(StageError::MalformedPayload("ean symbol truncated"));
    }
    match best_match(&line.widths()[run..run + 4], patterns, |c, p| {
        pattern_match_variance(c, p, MAX_INDIVIDUAL_VARIANCE)
    }) {
        Some((d, variance)) if variance < MAX_AVG_VARIANCE => Ok(d),
        _ => Err(StageError::MalformedPayload("ean digit unreadable")),
    }
}

/// Decode an EAN-13 symbol whose start guard begins at bar run `start`
pub fn decode_runs(line: &ScanLine, start: usize) -> Result<LinearRead, StageError> {
    if !is_start(line, start) {
        return Err(StageError::NoPatternFound);
    }

    let mut digits = Vec::with_capacity(13);
    let mut parity = 0u8;
    let mut run = start + 3;
    for x in 0..6 {
        let d = digit(line, run, &L_AND_G_PATTERNS)?;
        digits.push((d % 10) as u8);
        if d >= 10 {
            parity |= 1 << (5 - x);
        }
        run += 4;
    }

    let first = FIRST_DIGIT_ENCODINGS
        .iter()
        .position(|&p| p == parity)
        .ok_or(StageError::MalformedPayload("ean parity pattern invalid"))?;
    digits.insert(0, first as u8);

    if run + 5 > line.run_count()
        || pattern_match_variance(
            &line.widths()[run..run + 5],
            &MIDDLE_GUARD,
            MAX_INDIVIDUAL_VARIANCE,
        ) >= MAX_AVG_VARIANCE
    {
        return Err(StageError::MalformedPayload("ean middle guard missing"));
    }
    run += 5;

    for _ in 0..6 {
        digits.push(digit(line, run, &L_PATTERNS)? as u8);
        run += 4;
    }

    if run + 3 > line.run_count()
        || pattern_match_variance(
            &line.widths()[run..run + 3],
            &START_END_GUARD,
            MAX_INDIVIDUAL_VARIANCE,
        ) >= MAX_AVG_VARIANCE
    {
        return Err(StageError::MalformedPayload("ean end guard missing"));
    }
    // Quiet zone after the end guard
    if line.width(run + 3) < line.span(run, 3) {
        return Err(StageError::MalformedPayload("ean trailing quiet zone missing"));
    }

    if check_digit(&digits[..12]) != digits[12] {
        return Err(StageError::MalformedPayload("ean check digit mismatch"));
    }

    let text: String = digits.iter().map(|&d| (b'0' + d) as char).collect();
    Ok(LinearRead {
        symbology: Symbology::Ean13,
        bytes: text.clone().into_bytes(),
        text,
        start: line.offset(start),
        end: line.offset(run + 3),
    })
}

/// Mod-10 check digit over the first 12 (EAN-13) or 11 (UPC-A) digits
pub fn check_digit(digits: &[u8]) -> u8 {
    // Weights alternate 3, 1 from the rightmost data digit
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Apply the UPC-A reporting rules to an EAN-13 read.
///
/// `None` when the read's symbology is not allowed.
pub fn classify(mut read: LinearRead, options: &DecodeOptions) -> Option<LinearRead> {
    let ean_allowed = options.allows(Symbology::Ean13);
    let upca_allowed = options.allows(Symbology::UpcA);
    let leading_zero = read.text.starts_with('0');

    let as_upca = leading_zero && upca_allowed && (!ean_allowed || options.report_upca);
    if as_upca {
        read.text.remove(0);
        read.bytes.remove(0);
        read.symbology = Symbology::UpcA;
        Some(read)
    } else if ean_allowed {
        Some(read)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ean::{encode_ean13, encode_upca};

    fn line_for(widths: &[u8], unit: usize) -> ScanLine {
        let mut bits = vec![false; 9 * unit];
        for (i, &w) in widths.iter().enumerate() {
            bits.extend(std::iter::repeat_n(i % 2 == 0, w as usize * unit));
        }
        bits.extend(std::iter::repeat_n(false, 9 * unit));
        ScanLine::from_bits(&bits)
    }

    #[test]
    fn test_check_digit() {
        let digits: Vec<u8> = "400638133393".bytes().map(|b| b - b'0').collect();
        assert_eq!(check_digit(&digits), 1);
        let upc: Vec<u8> = "03600029145".bytes().map(|b| b - b'0').collect();
        assert_eq!(check_digit(&upc), 2);
    }

    #[test]
    fn test_decode_ean13() {
        let line = line_for(&encode_ean13("4006381333931").unwrap(), 2);
        let read = decode_runs(&line, 1).unwrap();
        assert_eq!(read.text, "4006381333931");
        assert_eq!(read.start, 18);
        assert_eq!(read.end, 18 + 95 * 2);
    }

    #[test]
    fn test_upca_classification() {
        let line = line_for(&encode_upca("036000291452").unwrap(), 3);
        let read = decode_runs(&line, 1).unwrap();
        assert_eq!(read.text, "0036000291452");

        let defaults = DecodeOptions::default();
        let kept = classify(read.clone(), &defaults).unwrap();
        assert_eq!(kept.symbology, Symbology::Ean13);

        let upca = classify(read.clone(), &defaults.clone().with_report_upca(true)).unwrap();
        assert_eq!(upca.symbology, Symbology::UpcA);
        assert_eq!(upca.text, "036000291452");

        let only_upc = defaults.clone().with_symbologies([Symbology::UpcA]);
        assert_eq!(classify(read.clone(), &only_upc).unwrap().symbology, Symbology::UpcA);

        let only_qr = defaults.with_symbologies([Symbology::Qr]);
        assert!(classify(read, &only_qr).is_none());
    }

    #[test]
    fn test_corrupted_digit_fails_check() {
        let mut widths = encode_ean13("4006381333931").unwrap();
        // Replace the last right-hand digit (1) with a 7
        let at = widths.len() - 3 - 4;
        widths[at..at + 4].copy_from_slice(&L_PATTERNS[7]);
        assert_eq!(
            decode_runs(&line_for(&widths, 2), 1),
            Err(StageError::MalformedPayload("ean check digit mismatch"))
        );
    }
}
