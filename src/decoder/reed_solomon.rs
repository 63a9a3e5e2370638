//! Reed-Solomon coding over GF(256).
//!
//! QR uses the primitive polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D) and a
//! generator polynomial with roots alpha^0 .. alpha^(n-1). Codewords are
//! stored highest-degree coefficient first.

use thiserror::Error;

const PRIMITIVE: u16 = 0x11D;

const fn build_tables() -> ([u8; 512], [u8; 256]) {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    // Doubled so that exp[log a + log b] never needs a modulo
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    (exp, log)
}

const TABLES: ([u8; 512], [u8; 256]) = build_tables();
static EXP_TABLE: [u8; 512] = TABLES.0;
static LOG_TABLE: [u8; 256] = TABLES.1;

/// GF(256) field operations using log/exp tables
pub struct Gf256;

impl Gf256 {
    /// alpha^n
    #[inline]
    pub fn exp(n: usize) -> u8 {
        EXP_TABLE[n % 255]
    }

    /// Field product
    #[inline]
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        EXP_TABLE[LOG_TABLE[a as usize] as usize + LOG_TABLE[b as usize] as usize]
    }

    /// `a / b`; `b` must be non-zero
    #[inline]
    pub fn div(a: u8, b: u8) -> u8 {
        debug_assert!(b != 0, "division by zero in GF(256)");
        if a == 0 || b == 0 {
            return 0;
        }
        EXP_TABLE[LOG_TABLE[a as usize] as usize + 255 - LOG_TABLE[b as usize] as usize]
    }

    /// `a^n`
    #[inline]
    pub fn pow(a: u8, n: usize) -> u8 {
        if n == 0 {
            return 1;
        }
        if a == 0 {
            return 0;
        }
        EXP_TABLE[(LOG_TABLE[a as usize] as usize * (n % 255)) % 255]
    }
}

/// Evaluate a polynomial stored highest-degree first (Horner)
fn eval_high_first(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0u8, |acc, &c| Gf256::mul(acc, x) ^ c)
}

/// Evaluate a polynomial stored lowest-degree first
fn eval_low_first(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0u8, |acc, &c| Gf256::mul(acc, x) ^ c)
}

/// Generator polynomial of degree `ecc_len`, highest-degree first, leading 1
pub fn generator_poly(ecc_len: usize) -> Vec<u8> {
    let mut g = vec![1u8];
    for i in 0..ecc_len {
        let root = Gf256::exp(i);
        let mut next = vec![0u8; g.len() + 1];
        for (j, &c) in g.iter().enumerate() {
            next[j] ^= c;
            next[j + 1] ^= Gf256::mul(c, root);
        }
        g = next;
    }
    g
}

/// Compute the `ecc_len` EC codewords for `data`
pub fn encode(data: &[u8], ecc_len: usize) -> Vec<u8> {
    if ecc_len == 0 {
        return Vec::new();
    }
    let generator = generator_poly(ecc_len);
    let mut remainder = vec![0u8; ecc_len];
    for &d in data {
        let factor = d ^ remainder.first().copied().unwrap_or(0);
        remainder.rotate_left(1);
        if let Some(last) = remainder.last_mut() {
            *last = 0;
        }
        for (r, &g) in remainder.iter_mut().zip(&generator[1..]) {
            *r ^= Gf256::mul(g, factor);
        }
    }
    remainder
}

/// The block holds more errors than its EC codewords can correct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("uncorrectable block ({ecc_len} EC codewords)")]
pub struct Uncorrectable {
    /// EC codewords in the block
    pub ecc_len: usize,
}

/// Reed-Solomon decoder for QR codes
pub struct ReedSolomonDecoder {
    num_ecc_codewords: usize,
}

impl ReedSolomonDecoder {
    /// Decoder for blocks carrying `num_ecc_codewords` EC codewords
    pub fn new(num_ecc_codewords: usize) -> Self {
        Self { num_ecc_codewords }
    }

    /// Correct `received` (data followed by EC codewords) in place.
    ///
    /// Returns the number of corrected codewords. Up to `ecc / 2` errors are
    /// corrected; anything beyond that is reported, never silently accepted.
    pub fn decode(&self, received: &mut [u8]) -> Result<usize, Uncorrectable> {
        let fail = Uncorrectable {
            ecc_len: self.num_ecc_codewords,
        };
        let n = received.len();
        if n > 255 || n <= self.num_ecc_codewords {
            return Err(fail);
        }

        let syndrome = self.calculate_syndrome(received);
        if syndrome.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let sigma = self.find_error_locator(&syndrome).ok_or(fail)?;
        let positions = Self::find_error_positions(&sigma, n).ok_or(fail)?;
        let values = Self::find_error_values(&sigma, &syndrome, &positions, n).ok_or(fail)?;

        for (&pos, &value) in positions.iter().zip(&values) {
            received[pos] ^= value;
        }

        if self.calculate_syndrome(received).iter().any(|&s| s != 0) {
            return Err(fail);
        }
        Ok(positions.len())
    }

    fn calculate_syndrome(&self, received: &[u8]) -> Vec<u8> {
        (0..self.num_ecc_codewords)
            .map(|i| eval_high_first(received, Gf256::exp(i)))
            .collect()
    }

    /// Berlekamp-Massey; error locator lowest-degree first
    fn find_error_locator(&self, syndrome: &[u8]) -> Option<Vec<u8>> {
        let mut sigma = vec![1u8];
        let mut prev = vec![1u8];
        let mut prev_discrepancy = 1u8;
        let mut len = 0usize;
        let mut shift = 1usize;

        for k in 0..syndrome.len() {
            let mut delta = syndrome[k];
            for i in 1..=len.min(sigma.len() - 1) {
                delta ^= Gf256::mul(sigma[i], syndrome[k - i]);
            }
            if delta == 0 {
                shift += 1;
                continue;
            }

            let coef = Gf256::div(delta, prev_discrepancy);
            let snapshot = sigma.clone();
            if sigma.len() < prev.len() + shift {
                sigma.resize(prev.len() + shift, 0);
            }
            for (j, &b) in prev.iter().enumerate() {
                sigma[j + shift] ^= Gf256::mul(coef, b);
            }

            if 2 * len <= k {
                len = k + 1 - len;
                prev = snapshot;
                prev_discrepancy = delta;
                shift = 1;
            } else {
                shift += 1;
            }
        }

        while sigma.len() > 1 && sigma.last() == Some(&0) {
            sigma.pop();
        }
        if 2 * len > syndrome.len() || sigma.len() - 1 != len {
            return None;
        }
        Some(sigma)
    }

    /// Chien search: position `i` is in error when sigma(alpha^-(n-1-i)) == 0
    fn find_error_positions(sigma: &[u8], n: usize) -> Option<Vec<usize>> {
        let positions: Vec<usize> = (0..n)
            .filter(|&i| eval_low_first(sigma, Gf256::exp(255 - (n - 1 - i) % 255)) == 0)
            .collect();
        (positions.len() == sigma.len() - 1).then_some(positions)
    }

    /// Forney: e_k = X_k * omega(X_k^-1) / sigma'(X_k^-1)
    fn find_error_values(
        sigma: &[u8],
        syndrome: &[u8],
        positions: &[usize],
        n: usize,
    ) -> Option<Vec<u8>> {
        // omega = syndrome * sigma mod x^(2t)
        let mut omega = vec![0u8; syndrome.len()];
        for (i, o) in omega.iter_mut().enumerate() {
            for j in 0..=i.min(sigma.len() - 1) {
                *o ^= Gf256::mul(sigma[j], syndrome[i - j]);
            }
        }

        // Formal derivative keeps the odd terms
        let derivative: Vec<u8> = sigma
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
            .collect();

        positions
            .iter()
            .map(|&pos| {
                let x = Gf256::exp((n - 1 - pos) % 255);
                let x_inv = Gf256::div(1, x);
                let denominator = eval_low_first(&derivative, x_inv);
                if denominator == 0 {
                    return None;
                }
                let numerator = eval_low_first(&omega, x_inv);
                Some(Gf256::mul(x, Gf256::div(numerator, denominator)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codeword(data: &[u8], num_ecc: usize) -> Vec<u8> {
        let mut out = data.to_vec();
        out.extend(encode(data, num_ecc));
        out
    }

    #[test]
    fn test_gf256_basic() {
        assert_eq!(Gf256::mul(0, 5), 0);
        assert_eq!(Gf256::mul(5, 0), 0);
        assert_eq!(Gf256::div(0, 5), 0);
        assert_eq!(Gf256::div(7, 7), 1);
        assert_eq!(Gf256::div(Gf256::mul(123, 45), 45), 123);
        assert_eq!(Gf256::exp(8), 29);
    }

    #[test]
    fn test_gf256_pow() {
        assert_eq!(Gf256::pow(2, 255), 1);
        assert_eq!(Gf256::pow(2, 256), 2);
        assert_eq!(Gf256::pow(2, 260), Gf256::pow(2, 5));
        assert_eq!(Gf256::pow(0, 10), 0);
        assert_eq!(Gf256::pow(0, 0), 1);
    }

    #[test]
    fn test_known_ec_codewords() {
        // "HELLO WORLD" at 1-M
        let data = [
            32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17,
        ];
        assert_eq!(
            encode(&data, 10),
            vec![196, 35, 39, 119, 235, 215, 231, 226, 93, 23]
        );
    }

    #[test]
    fn test_rs_encode_decode_no_errors() {
        let data = vec![0x10, 0x20, 0x30, 0x40, 0x50, 0x60];
        let mut cw = codeword(&data, 10);
        assert_eq!(ReedSolomonDecoder::new(10).decode(&mut cw), Ok(0));
        assert_eq!(&cw[..data.len()], &data);
    }

    #[test]
    fn test_rs_correct_multiple_errors() {
        let data = vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let mut cw = codeword(&data, 10);
        cw[0] ^= 0xFF;
        cw[4] ^= 0x42;
        cw[7] ^= 0x13;
        cw[17] ^= 0x01;
        cw[12] ^= 0x80;

        assert_eq!(ReedSolomonDecoder::new(10).decode(&mut cw), Ok(5));
        assert_eq!(&cw[..data.len()], &data);
    }

    #[test]
    fn test_rs_correct_errors_at_end() {
        let data = vec![0x01, 0x02, 0x03, 0x04, 0x05];
        let mut cw = codeword(&data, 8);
        let total = cw.len();
        cw[total - 1] ^= 0xFF;
        cw[total - 2] ^= 0x33;

        assert_eq!(ReedSolomonDecoder::new(8).decode(&mut cw), Ok(2));
        assert_eq!(&cw[..data.len()], &data);
    }

    #[test]
    fn test_too_many_errors_reported() {
        let data: Vec<u8> = (0..20).collect();
        // Six errors against a capacity of five
        let mut cw = codeword(&data, 10);
        for (i, pos) in [0usize, 3, 6, 9, 14, 27].iter().enumerate() {
            cw[*pos] ^= 0x5A + i as u8;
        }
        assert_eq!(
            ReedSolomonDecoder::new(10).decode(&mut cw),
            Err(Uncorrectable { ecc_len: 10 })
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn corrects_up_to_half_the_ec_codewords(
                data in proptest::collection::vec(any::<u8>(), 1..60),
                ecc in 2usize..30,
                errors in proptest::collection::btree_map(0usize..89, 1u8..=255, 0..15),
            ) {
                let original = codeword(&data, ecc);
                let mut cw = original.clone();
                let mut injected = 0;
                for (&pos, &value) in errors.iter() {
                    if pos < cw.len() && injected < ecc / 2 {
                        cw[pos] ^= value;
                        injected += 1;
                    }
                }
                let corrected = ReedSolomonDecoder::new(ecc).decode(&mut cw);
                prop_assert_eq!(corrected, Ok(injected));
                prop_assert_eq!(cw, original);
            }

            #[test]
            fn never_returns_a_wrong_codeword_as_clean(
                data in proptest::collection::vec(any::<u8>(), 1..40),
                ecc in 2usize..20,
                errors in proptest::collection::btree_map(0usize..59, 1u8..=255, 1..30),
            ) {
                let original = codeword(&data, ecc);
                let mut cw = original.clone();
                for (&pos, &value) in errors.iter() {
                    if pos < cw.len() {
                        cw[pos] ^= value;
                    }
                }
                if let Ok(count) = ReedSolomonDecoder::new(ecc).decode(&mut cw) {
                    // Whatever comes back is a valid codeword within capacity
                    prop_assert!(count <= ecc / 2);
                    let data_len = data.len();
                    prop_assert_eq!(encode(&cw[..data_len], ecc), cw[data_len..].to_vec());
                }
            }
        }
    }
}
