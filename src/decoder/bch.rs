//! BCH codes protecting QR format (15,5) and version (18,6) information.

/// Format generator x^10 + x^8 + x^5 + x^4 + x^2 + x + 1
const FORMAT_GENERATOR: u32 = 0x537;
/// Version generator x^12 + x^11 + x^10 + x^9 + x^8 + x^5 + x^2 + 1
const VERSION_GENERATOR: u32 = 0x1F25;
/// XOR applied to format information so it is never all-zero
pub const FORMAT_MASK: u16 = 0x5412;

/// Remainder of `data * x^degree` divided by `generator`
fn remainder(data: u32, generator: u32, degree: u32) -> u32 {
    let mut value = data << degree;
    let top = 32 - generator.leading_zeros() - 1;
    while value != 0 && 32 - value.leading_zeros() - 1 >= top {
        let shift = (32 - value.leading_zeros() - 1) - top;
        value ^= generator << shift;
    }
    value
}

/// Masked 15-bit format code word for 5 data bits (EC level << 3 | mask)
pub fn format_code(data: u8) -> u16 {
    let data = (data & 0x1F) as u32;
    (((data << 10) | remainder(data, FORMAT_GENERATOR, 10)) as u16) ^ FORMAT_MASK
}

/// 18-bit version code word
pub fn version_code(version: u8) -> u32 {
    let v = (version & 0x3F) as u32;
    (v << 12) | remainder(v, VERSION_GENERATOR, 12)
}

/// Data bits of the valid format code word nearest to `received`, with its distance
pub fn nearest_format(received: u16) -> (u8, u32) {
    (0u8..32)
        .map(|d| (d, (format_code(d) ^ received).count_ones()))
        .min_by_key(|&(_, dist)| dist)
        .unwrap_or((0, u32::MAX))
}

/// Version whose code word is nearest to `received`, with its distance
pub fn nearest_version(received: u32) -> (u8, u32) {
    (7u8..=40)
        .map(|v| (v, (version_code(v) ^ received).count_ones()))
        .min_by_key(|&(_, dist)| dist)
        .unwrap_or((0, u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_code_words() {
        // ISO/IEC 18004 Annex C examples
        assert_eq!(format_code(0b00000), 0x5412);
        assert_eq!(format_code(0b00001), 0x5125);
        assert_eq!(format_code(0b01000), 0x77C4);
        assert_eq!(version_code(7), 0x07C94);
        assert_eq!(version_code(40), 0x28C69);
    }

    #[test]
    fn test_nearest_corrects_three_bits() {
        let code = format_code(0b10110);
        assert_eq!(nearest_format(code ^ 0b100_0000_0100_0001), (0b10110, 3));
        let code = version_code(23);
        assert_eq!(nearest_version(code ^ 0b10_0000_0000_0001_0001), (23, 3));
    }

    #[test]
    fn test_format_codes_are_far_apart() {
        for a in 0u8..32 {
            for b in (a + 1)..32 {
                assert!((format_code(a) ^ format_code(b)).count_ones() >= 7);
            }
        }
    }
}
