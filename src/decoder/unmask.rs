//! Data masking. XOR is its own inverse, so the same pass masks and unmasks.
use crate::decoder::function_mask::FunctionMask;
use crate::models::{MaskPattern, SymbolGrid};

/// Toggle every data module selected by `mask_pattern`
pub fn apply_mask(grid: &mut SymbolGrid, mask_pattern: MaskPattern, func: &FunctionMask) {
    let dimension = grid.dimension();
    for y in 0..dimension {
        for x in 0..dimension {
            if !func.is_function(x, y) && mask_pattern.is_masked(y, x) {
                grid.toggle(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;

    #[test]
    fn test_unmask() {
        let mut grid = SymbolGrid::new(21);
        grid.set(10, 10, true);
        grid.set(11, 10, false);

        let func = FunctionMask::new(Version::MIN);
        apply_mask(&mut grid, MaskPattern::Pattern0, &func);

        // Pattern0: (i + j) % 2 == 0
        assert!(!grid.get(10, 10));
        assert!(!grid.get(11, 10));
        // Function modules are never touched
        assert!(!grid.get(0, 0));
    }

    #[test]
    fn test_mask_is_involution() {
        let func = FunctionMask::new(Version::new(3).unwrap());
        let mut grid = SymbolGrid::new(29);
        grid.set(15, 15, true);
        let original = grid.clone();
        for mask in MaskPattern::ALL {
            apply_mask(&mut grid, mask, &func);
            apply_mask(&mut grid, mask, &func);
            assert_eq!(grid, original);
        }
    }
}
