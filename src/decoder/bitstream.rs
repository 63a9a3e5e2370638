//! Codeword placement: the two-column zigzag shared by reading and writing.
use crate::decoder::function_mask::FunctionMask;
use crate::models::SymbolGrid;

/// Data module coordinates `(x, y)` in bit order.
///
/// Columns are walked in pairs from the right edge, skipping the vertical
/// timing column, alternating upward and downward. Function modules are
/// skipped.
pub fn placement_order(func: &FunctionMask) -> Vec<(usize, usize)> {
    let dimension = func.size();
    let mut order = Vec::with_capacity(func.data_modules_count());

    let mut upward = true;
    let mut col = dimension as i32 - 1;
    while col > 0 {
        if col == 6 {
            col -= 1;
        }
        for step in 0..dimension {
            let row = if upward { dimension - 1 - step } else { step };
            for c in [col, col - 1] {
                let x = c as usize;
                if !func.is_function(x, row) {
                    order.push((x, row));
                }
            }
        }
        upward = !upward;
        col -= 2;
    }

    order
}

/// Read the codewords of an unmasked grid. Trailing remainder bits are dropped.
pub fn extract_codewords(grid: &SymbolGrid, func: &FunctionMask) -> Vec<u8> {
    placement_order(func)
        .chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |acc, &(x, y)| (acc << 1) | grid.get(x, y) as u8)
        })
        .collect()
}

/// Write codewords into a grid, most significant bit first; unused modules stay light
pub fn place_codewords(grid: &mut SymbolGrid, func: &FunctionMask, codewords: &[u8]) {
    let bits = codewords
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1));
    for (&(x, y), bit) in placement_order(func).iter().zip(bits) {
        grid.set(x, y, bit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;

    #[test]
    fn test_order_covers_every_data_module_once() {
        for number in [1, 2, 7, 14, 40] {
            let func = FunctionMask::new(Version::new(number).unwrap());
            let mut order = placement_order(&func);
            assert_eq!(order.len(), func.data_modules_count());
            order.sort();
            order.dedup();
            assert_eq!(order.len(), func.data_modules_count());
        }
    }

    #[test]
    fn test_first_modules_are_bottom_right() {
        let func = FunctionMask::new(Version::MIN);
        let order = placement_order(&func);
        assert_eq!(&order[..4], &[(20, 20), (19, 20), (20, 19), (19, 19)]);
    }

    #[test]
    fn test_place_then_extract() {
        let func = FunctionMask::new(Version::new(2).unwrap());
        let codewords: Vec<u8> = (0..44).map(|i| (i * 37 + 11) as u8).collect();
        let mut grid = SymbolGrid::new(25);
        place_codewords(&mut grid, &func, &codewords);
        assert_eq!(extract_codewords(&grid, &func), codewords);
    }
}
