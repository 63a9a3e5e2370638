use std::fmt;

/// Row-padded bit matrix, `true` = dark.
///
/// Each row starts on a fresh 32-bit word so that row scans and inversion
/// work a word at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    row_words: usize,
    bits: Vec<u32>,
}

impl BitMatrix {
    /// Create an all-light matrix
    pub fn new(width: usize, height: usize) -> Self {
        let row_words = width.div_ceil(32);
        Self {
            width,
            height,
            row_words,
            bits: vec![0; row_words * height],
        }
    }

    /// Create a square all-light matrix
    pub fn square(dimension: usize) -> Self {
        Self::new(dimension, dimension)
    }

    /// Build a matrix from a predicate over `(x, y)`
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut matrix = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        matrix
    }

    /// Matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn locate(&self, x: usize, y: usize) -> (usize, u32) {
        (y * self.row_words + x / 32, 1 << (x % 32))
    }

    /// Get bit at (x, y); out-of-range reads are light
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (word, mask) = self.locate(x, y);
        self.bits[word] & mask != 0
    }

    /// Signed-coordinate read used by samplers; negative coordinates are light
    #[inline]
    pub fn get_i(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && self.get(x as usize, y as usize)
    }

    /// Set bit at (x, y); out-of-range writes are ignored
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (word, mask) = self.locate(x, y);
        if value {
            self.bits[word] |= mask;
        } else {
            self.bits[word] &= !mask;
        }
    }

    /// Flip bit at (x, y)
    #[inline]
    pub fn toggle(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (word, mask) = self.locate(x, y);
        self.bits[word] ^= mask;
    }

    /// Set every bit in the rectangle `[left, left + w) x [top, top + h)`
    pub fn set_region(&mut self, left: usize, top: usize, w: usize, h: usize) {
        for y in top..(top + h).min(self.height) {
            for x in left..(left + w).min(self.width) {
                self.set(x, y, true);
            }
        }
    }

    /// Copy row `y` into `out` as booleans
    pub fn row_into(&self, y: usize, out: &mut Vec<bool>) {
        out.clear();
        out.extend((0..self.width).map(|x| self.get(x, y)));
    }

    /// Copy column `x` into `out` as booleans
    pub fn column_into(&self, x: usize, out: &mut Vec<bool>) {
        out.clear();
        out.extend((0..self.height).map(|y| self.get(x, y)));
    }

    /// Invert every bit in place
    pub fn invert(&mut self) {
        let tail_bits = self.width % 32;
        let tail_mask = if tail_bits == 0 {
            u32::MAX
        } else {
            (1u32 << tail_bits) - 1
        };
        for row in self.bits.chunks_mut(self.row_words.max(1)) {
            for word in row.iter_mut() {
                *word = !*word;
            }
            if let Some(last) = row.last_mut() {
                *last &= tail_mask;
            }
        }
    }

    /// Mirror across the main diagonal
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.height, self.width, |x, y| self.get(y, x))
    }

    /// Number of dark bits
    pub fn count_dark(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Reset every bit to light
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "##" } else { "  " })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(40, 3);
        assert_eq!(matrix.width(), 40);
        assert_eq!(matrix.height(), 3);

        matrix.set(35, 2, true);
        assert!(matrix.get(35, 2));
        assert!(!matrix.get(35, 1));

        matrix.toggle(35, 2);
        assert!(!matrix.get(35, 2));

        matrix.set_region(0, 0, 2, 2);
        assert_eq!(matrix.count_dark(), 4);
        matrix.clear();
        assert_eq!(matrix.count_dark(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true);
        assert!(!matrix.get(10, 10));
        assert!(!matrix.get_i(-1, 3));
    }

    #[test]
    fn test_invert_keeps_padding_clear() {
        let mut matrix = BitMatrix::new(33, 2);
        matrix.set(0, 0, true);
        matrix.invert();
        assert!(!matrix.get(0, 0));
        assert!(matrix.get(32, 1));
        assert_eq!(matrix.count_dark(), 33 * 2 - 1);
    }

    #[test]
    fn test_transpose() {
        let matrix = BitMatrix::from_fn(3, 2, |x, y| x == 2 && y == 0);
        let t = matrix.transpose();
        assert_eq!((t.width(), t.height()), (2, 3));
        assert!(t.get(0, 2));
    }
}
