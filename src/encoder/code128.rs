//! Code 128 synthesis: code set B with code set C for digit runs.

use crate::error::EncodeError;
use crate::oned::code128::{CODE_B, CODE_C, CODE_PATTERNS, START_B, START_C, STOP_PATTERN};

/// Digit run length that switches to code set C
const MIN_SET_C_RUN: usize = 4;

/// Symbol values for `text`, start code first, checksum and stop excluded
pub fn encode_values(text: &str) -> Result<Vec<usize>, EncodeError> {
    if let Some(c) = text.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(EncodeError::UnsupportedCharacter(c));
    }
    if text.is_empty() {
        return Err(EncodeError::InvalidLength {
            expected: "at least 1",
            actual: 0,
        });
    }

    let bytes = text.as_bytes();
    let mut values = Vec::with_capacity(bytes.len() + 2);
    let mut in_set_c = None;
    let mut i = 0;
    while i < bytes.len() {
        let run = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
        if run >= MIN_SET_C_RUN {
            match in_set_c {
                None => values.push(START_C),
                Some(false) => values.push(CODE_C),
                Some(true) => {}
            }
            in_set_c = Some(true);
            let even = run & !1;
            for pair in bytes[i..i + even].chunks(2) {
                values.push(((pair[0] - b'0') * 10 + (pair[1] - b'0')) as usize);
            }
            i += even;
        } else {
            match in_set_c {
                None => values.push(START_B),
                Some(true) => values.push(CODE_B),
                Some(false) => {}
            }
            in_set_c = Some(false);
            values.push((bytes[i] - b' ') as usize);
            i += 1;
        }
    }
    Ok(values)
}

/// Module widths (bar first) of the full symbol: start, data, checksum, stop
pub fn encode(text: &str) -> Result<Vec<u8>, EncodeError> {
    let values = encode_values(text)?;
    let checksum = values
        .iter()
        .enumerate()
        .skip(1)
        .fold(values[0], |acc, (i, &v)| acc + i * v)
        % 103;

    let mut widths: Vec<u8> = values
        .iter()
        .chain(std::iter::once(&checksum))
        .flat_map(|&v| CODE_PATTERNS[v])
        .collect();
    widths.extend(STOP_PATTERN);
    Ok(widths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_selection() {
        assert_eq!(encode_values("AB").unwrap(), vec![START_B, 33, 34]);
        assert_eq!(encode_values("123456").unwrap(), vec![START_C, 12, 34, 56]);
        // Odd run: pairs in C, the tail digit back in B
        assert_eq!(
            encode_values("12345").unwrap(),
            vec![START_C, 12, 34, CODE_B, 21]
        );
        assert_eq!(
            encode_values("X1234").unwrap(),
            vec![START_B, 56, CODE_C, 12, 34]
        );
    }

    #[test]
    fn test_rejects_non_printable() {
        assert_eq!(
            encode("tab\there"),
            Err(EncodeError::UnsupportedCharacter('\t'))
        );
        assert_eq!(encode("é"), Err(EncodeError::UnsupportedCharacter('é')));
        assert!(encode("").is_err());
    }

    #[test]
    fn test_total_modules() {
        // start + 3 data + checksum at 11 modules each, stop 13
        let widths = encode("abc").unwrap();
        let modules: u32 = widths.iter().map(|&w| w as u32).sum();
        assert_eq!(modules, 5 * 11 + 13);
    }
}
