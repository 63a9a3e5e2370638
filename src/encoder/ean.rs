//! EAN-13 and UPC-A synthesis.

use crate::error::EncodeError;
use crate::oned::ean::{
    FIRST_DIGIT_ENCODINGS, L_AND_G_PATTERNS, L_PATTERNS, MIDDLE_GUARD, START_END_GUARD,
    check_digit,
};

fn parse_digits(digits: &str) -> Result<Vec<u8>, EncodeError> {
    digits
        .chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or(EncodeError::UnsupportedCharacter(c))
        })
        .collect()
}

/// Complete a 12-digit body with its check digit, or verify a 13th
fn with_check_digit(mut digits: Vec<u8>, data_len: usize) -> Result<Vec<u8>, EncodeError> {
    let check = check_digit(&digits[..data_len]);
    if digits.len() == data_len {
        digits.push(check);
    } else if digits[data_len] != check {
        return Err(EncodeError::InvalidCheckDigit);
    }
    Ok(digits)
}

/// Module widths (bar first) for 12 or 13 EAN-13 digits
pub fn encode_ean13(digits: &str) -> Result<Vec<u8>, EncodeError> {
    let parsed = parse_digits(digits)?;
    if !(12..=13).contains(&parsed.len()) {
        return Err(EncodeError::InvalidLength {
            expected: "12 or 13",
            actual: parsed.len(),
        });
    }
    let digits = with_check_digit(parsed, 12)?;

    let parity = FIRST_DIGIT_ENCODINGS[digits[0] as usize];
    let mut widths = Vec::with_capacity(59);
    widths.extend(START_END_GUARD);
    for (x, &d) in digits[1..7].iter().enumerate() {
        let even = parity & (1 << (5 - x)) != 0;
        let index = d as usize + if even { 10 } else { 0 };
        widths.extend(L_AND_G_PATTERNS[index]);
    }
    widths.extend(MIDDLE_GUARD);
    for &d in &digits[7..] {
        widths.extend(L_PATTERNS[d as usize]);
    }
    widths.extend(START_END_GUARD);
    Ok(widths)
}

/// Module widths for 11 or 12 UPC-A digits (EAN-13 with a leading zero)
pub fn encode_upca(digits: &str) -> Result<Vec<u8>, EncodeError> {
    let parsed = parse_digits(digits)?;
    if !(11..=12).contains(&parsed.len()) {
        return Err(EncodeError::InvalidLength {
            expected: "11 or 12",
            actual: parsed.len(),
        });
    }
    let digits = with_check_digit(parsed, 11)?;
    let ean: String = std::iter::once('0')
        .chain(digits.iter().map(|&d| (b'0' + d) as char))
        .collect();
    encode_ean13(&ean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let widths = encode_ean13("400638133393").unwrap();
        assert_eq!(widths.len(), 3 + 24 + 5 + 24 + 3);
        assert_eq!(widths.iter().map(|&w| w as u32).sum::<u32>(), 95);
    }

    #[test]
    fn test_check_digit_handling() {
        assert_eq!(
            encode_ean13("4006381333931").unwrap(),
            encode_ean13("400638133393").unwrap()
        );
        assert_eq!(
            encode_ean13("4006381333932"),
            Err(EncodeError::InvalidCheckDigit)
        );
        assert_eq!(
            encode_upca("03600029145").unwrap(),
            encode_ean13("0036000291452").unwrap()
        );
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            encode_ean13("12345"),
            Err(EncodeError::InvalidLength {
                expected: "12 or 13",
                actual: 5
            })
        );
        assert_eq!(
            encode_upca("0360002914X"),
            Err(EncodeError::UnsupportedCharacter('X'))
        );
    }
}
