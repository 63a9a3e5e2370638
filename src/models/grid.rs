use super::{BitMatrix, Version};

/// Rectified square module grid, `true` = dark module.
///
/// Indexed `(x, y)` = (column, row) with the top-left finder at the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolGrid {
    modules: BitMatrix,
}

impl SymbolGrid {
    /// All-light grid of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            modules: BitMatrix::square(dimension),
        }
    }

    /// Wrap a square matrix; `None` if it is not square
    pub fn from_matrix(modules: BitMatrix) -> Option<Self> {
        (modules.width() == modules.height()).then_some(Self { modules })
    }

    /// Grid from rows of booleans
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let dimension = rows.len();
        if rows.iter().any(|r| r.len() != dimension) {
            return None;
        }
        Some(Self {
            modules: BitMatrix::from_fn(dimension, dimension, |x, y| rows[y][x]),
        })
    }

    /// Width (= height) in modules
    pub fn dimension(&self) -> usize {
        self.modules.width()
    }

    /// Version implied by the dimension
    pub fn version(&self) -> Option<Version> {
        Version::from_dimension(self.dimension())
    }

    /// Module at column `x`, row `y`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.modules.get(x, y)
    }

    /// Set module at column `x`, row `y`
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, dark: bool) {
        self.modules.set(x, y, dark);
    }

    /// Flip module at column `x`, row `y`
    #[inline]
    pub fn toggle(&mut self, x: usize, y: usize) {
        self.modules.toggle(x, y);
    }

    /// Underlying bit matrix
    pub fn modules(&self) -> &BitMatrix {
        &self.modules
    }

    /// Mirror image across the main diagonal
    pub fn transposed(&self) -> Self {
        Self {
            modules: self.modules.transpose(),
        }
    }

    /// Rotate 90 degrees clockwise
    pub fn rotated_cw(&self) -> Self {
        let n = self.dimension();
        Self {
            modules: BitMatrix::from_fn(n, n, |x, y| self.get(y, n - 1 - x)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_four_times_is_identity() {
        let mut grid = SymbolGrid::new(21);
        grid.set(3, 1, true);
        grid.set(20, 7, true);
        let back = grid.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(back, grid);
        assert!(grid.rotated_cw().get(21 - 1 - 1, 3));
    }

    #[test]
    fn test_version_from_dimension() {
        assert_eq!(SymbolGrid::new(25).version(), Version::new(2));
        assert!(SymbolGrid::from_rows(&[vec![true, false]]).is_none());
    }
}
