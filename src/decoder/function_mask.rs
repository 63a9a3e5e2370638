use crate::decoder::tables::alignment_centers;
use crate::models::{BitMatrix, Version};

/// Function module mask for a specific QR version.
/// true = function module (not data), false = data module.
pub struct FunctionMask {
    mask: BitMatrix,
    version: Version,
}

impl FunctionMask {
    /// Mark finders, separators, timing, alignment, dark module and version blocks
    pub fn new(version: Version) -> Self {
        let size = version.dimension();
        let mut mask = BitMatrix::square(size);

        // Finder patterns + separators (8x8 areas, clipped to bounds)
        mask.set_region(0, 0, 9, 9);
        mask.set_region(size - 8, 0, 8, 9);
        mask.set_region(0, size - 8, 9, 8);

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        // Alignment patterns, skipping the three finder corners
        let centers = alignment_centers(version);
        let last = centers.len().saturating_sub(1);
        for (i, &cy) in centers.iter().enumerate() {
            for (j, &cx) in centers.iter().enumerate() {
                let on_finder = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if on_finder {
                    continue;
                }
                mask.set_region(cx as usize - 2, cy as usize - 2, 5, 5);
            }
        }

        // Dark module (the format areas are covered by the finder regions above)
        mask.set(8, size - 8, true);

        // Version info blocks: 3 wide x 6 tall top-right, 6 wide x 3 tall bottom-left
        if version.has_version_info() {
            mask.set_region(size - 11, 0, 3, 6);
            mask.set_region(0, size - 11, 6, 3);
        }

        Self { mask, version }
    }

    /// Symbol side in modules
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// Version the mask was built for
    pub fn version(&self) -> Version {
        self.version
    }

    /// Whether `(x, y)` holds a function module rather than data
    #[inline]
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Modules left for data and EC codewords
    pub fn data_modules_count(&self) -> usize {
        self.size() * self.size() - self.mask.count_dark()
    }
}
