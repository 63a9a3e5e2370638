//! Finder square detection using 1:1:3:1:1 run scanning with cross-checks

use crate::models::{BitMatrix, LumaImage, Point};

/// Keep at most this many finder squares for grouping
const MAX_FINDERS: usize = 24;
const MAX_FINDERS_TRY_HARDER: usize = 48;

/// A confirmed finder square
#[derive(Debug, Clone, PartialEq)]
pub struct FinderPattern {
    /// Centre in image pixels
    pub center: Point,
    /// Estimated module size in pixels
    pub module_size: f32,
    /// Scan rows that confirmed this square
    pub count: usize,
    /// Mean absolute deviation from the ideal run ratios, in modules
    pub ratio_error: f32,
    /// Luminance difference between the light ring and the dark core (0..=1)
    pub contrast: f32,
}

impl FinderPattern {
    /// Square seen once at `(x, y)`
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
            ratio_error: 0.0,
            contrast: 0.0,
        }
    }

    fn about_equals(&self, x: f32, y: f32, module_size: f32) -> bool {
        if (y - self.center.y).abs() > module_size || (x - self.center.x).abs() > module_size {
            return false;
        }
        let diff = (module_size - self.module_size).abs();
        diff <= 1.0 || diff <= self.module_size
    }

    /// Fold another detection in, weighting by the confirmation count
    fn combine(&mut self, other: &FinderPattern) {
        let total = (self.count + other.count) as f32;
        let (a, b) = (self.count as f32, other.count as f32);
        self.center = Point::new(
            (self.center.x * a + other.center.x * b) / total,
            (self.center.y * a + other.center.y * b) / total,
        );
        self.module_size = (self.module_size * a + other.module_size * b) / total;
        self.ratio_error = (self.ratio_error * a + other.ratio_error * b) / total;
        self.count += other.count;
    }
}

/// Row and column run scanner for finder squares
pub struct FinderDetector;

impl FinderDetector {
    /// Find finder squares, best confirmed first.
    ///
    /// Rows are scanned every third line, or every line with `try_harder`.
    /// Contrast is measured on `luma` when it matches the matrix size.
    pub fn detect(
        matrix: &BitMatrix,
        luma: Option<&LumaImage<'_>>,
        try_harder: bool,
    ) -> Vec<FinderPattern> {
        let width = matrix.width();
        let height = matrix.height();
        let row_step = if try_harder { 1 } else { 3 };
        let mut found: Vec<FinderPattern> = Vec::new();
        let mut row = Vec::with_capacity(width);

        for y in (0..height).step_by(row_step) {
            matrix.row_into(y, &mut row);
            if !Self::has_significant_edges(&row) {
                continue;
            }
            for (end_x, lengths) in Self::row_windows(&row) {
                let Some(unit) = Self::check_ratio(&lengths) else {
                    continue;
                };
                let center_x =
                    end_x as f32 - lengths[4] as f32 - lengths[3] as f32 - lengths[2] as f32 / 2.0;
                if let Some(pattern) = Self::confirm(matrix, center_x, y, unit) {
                    match found
                        .iter_mut()
                        .find(|f| f.about_equals(pattern.center.x, pattern.center.y, pattern.module_size))
                    {
                        Some(existing) => existing.combine(&pattern),
                        None => found.push(pattern),
                    }
                }
            }
        }

        if let Some(luma) = luma.filter(|l| l.width() == width && l.height() == height) {
            for pattern in &mut found {
                pattern.contrast = Self::measure_contrast(luma, pattern);
            }
        }

        found.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(a.ratio_error.total_cmp(&b.ratio_error))
        });
        found.truncate(if try_harder {
            MAX_FINDERS_TRY_HARDER
        } else {
            MAX_FINDERS
        });
        found
    }

    /// Sample every 4th pixel; a finder row crosses at least four edges
    fn has_significant_edges(row: &[bool]) -> bool {
        let mut transitions = 0;
        let mut prev = row.first().copied().unwrap_or(false);
        for &color in row.iter().step_by(4) {
            if color != prev {
                transitions += 1;
                prev = color;
                if transitions >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// Every dark-light-dark-light-dark run window in a row, with the pixel index ending it
    fn row_windows(row: &[bool]) -> Vec<(usize, [usize; 5])> {
        let mut runs: Vec<(bool, usize)> = Vec::new();
        let mut windows = Vec::new();
        let mut start = 0usize;
        for x in 1..=row.len() {
            if x < row.len() && row[x] == row[start] {
                continue;
            }
            runs.push((row[start], x - start));
            start = x;
            let n = runs.len();
            if n >= 5 && runs[n - 5].0 {
                let window = &runs[n - 5..];
                windows.push((x, std::array::from_fn(|i| window[i].1)));
            }
        }
        windows
    }

    /// Module size when the runs match 1:1:3:1:1 within half a module each
    fn check_ratio(lengths: &[usize; 5]) -> Option<f32> {
        let total: usize = lengths.iter().sum();
        if total < 7 {
            return None;
        }
        let unit = total as f32 / 7.0;
        let max_variance = unit / 2.0;
        let ok = lengths.iter().enumerate().all(|(i, &len)| {
            let (expected, tolerance) = if i == 2 {
                (3.0 * unit, 3.0 * max_variance)
            } else {
                (unit, max_variance)
            };
            (len as f32 - expected).abs() < tolerance
        });
        ok.then_some(unit)
    }

    fn ratio_error(lengths: &[usize; 5], unit: f32) -> f32 {
        const EXPECTED: [f32; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];
        lengths
            .iter()
            .zip(EXPECTED)
            .map(|(&len, e)| (len as f32 / unit - e).abs())
            .sum::<f32>()
            / 5.0
    }

    /// Vertical then horizontal cross-check through a row hit
    fn confirm(matrix: &BitMatrix, center_x: f32, y: usize, unit: f32) -> Option<FinderPattern> {
        let max_run = (unit * 4.0).ceil() as usize + 2;
        let x = center_x as usize;

        let (v_lengths, center_y) = cross_runs(matrix, x, y, true, max_run)?;
        let v_unit = Self::check_ratio(&v_lengths)?;
        let v_total = v_unit * 7.0;
        if 5.0 * (v_total - unit * 7.0).abs() >= 2.0 * unit * 7.0 {
            return None;
        }

        let (h_lengths, center_x) = cross_runs(matrix, x, center_y as usize, false, max_run)?;
        let h_unit = Self::check_ratio(&h_lengths)?;

        let mut pattern = FinderPattern::new(center_x, center_y, (v_unit + h_unit) / 2.0);
        pattern.ratio_error =
            (Self::ratio_error(&v_lengths, v_unit) + Self::ratio_error(&h_lengths, h_unit)) / 2.0;
        Some(pattern)
    }

    /// Mean ring luminance minus mean core luminance, normalised
    fn measure_contrast(luma: &LumaImage<'_>, pattern: &FinderPattern) -> f32 {
        let at = |dx: f32, dy: f32| {
            let x = (pattern.center.x + dx * pattern.module_size).round();
            let y = (pattern.center.y + dy * pattern.module_size).round();
            let x = x.clamp(0.0, (luma.width() - 1) as f32) as usize;
            let y = y.clamp(0.0, (luma.height() - 1) as f32) as usize;
            luma.get(x, y) as f32
        };
        let core = at(0.0, 0.0);
        let ring = (at(2.0, 0.0) + at(-2.0, 0.0) + at(0.0, 2.0) + at(0.0, -2.0)) / 4.0;
        (ring - core).abs() / 255.0
    }
}

/// Runs through `(x, y)` along a column (`vertical`) or row.
///
/// The point must be dark and sit inside the centre run. Returns the five
/// run lengths and the refined centre coordinate along the scan axis.
fn cross_runs(
    matrix: &BitMatrix,
    x: usize,
    y: usize,
    vertical: bool,
    max_run: usize,
) -> Option<([usize; 5], f32)> {
    let (pos, limit) = if vertical {
        (y as i64, matrix.height() as i64)
    } else {
        (x as i64, matrix.width() as i64)
    };
    let dark = |i: i64| {
        if vertical {
            matrix.get_i(x as i32, i as i32)
        } else {
            matrix.get_i(i as i32, y as i32)
        }
    };
    if !dark(pos) {
        return None;
    }

    let mut counts = [0usize; 5];

    let mut i = pos;
    while i >= 0 && dark(i) {
        counts[2] += 1;
        i -= 1;
    }
    if i < 0 {
        return None;
    }
    while i >= 0 && !dark(i) && counts[1] <= max_run {
        counts[1] += 1;
        i -= 1;
    }
    if i < 0 || counts[1] > max_run {
        return None;
    }
    while i >= 0 && dark(i) && counts[0] <= max_run {
        counts[0] += 1;
        i -= 1;
    }
    if counts[0] > max_run {
        return None;
    }

    let mut i = pos + 1;
    while i < limit && dark(i) {
        counts[2] += 1;
        i += 1;
    }
    if i == limit {
        return None;
    }
    while i < limit && !dark(i) && counts[3] <= max_run {
        counts[3] += 1;
        i += 1;
    }
    if i == limit || counts[3] > max_run {
        return None;
    }
    while i < limit && dark(i) && counts[4] <= max_run {
        counts[4] += 1;
        i += 1;
    }
    if counts[4] > max_run || counts[0] == 0 || counts[4] == 0 {
        return None;
    }

    let center = i as f32 - counts[4] as f32 - counts[3] as f32 - counts[2] as f32 / 2.0;
    Some((counts, center))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_finder(matrix: &mut BitMatrix, left: usize, top: usize, unit: usize) {
        for dy in 0..7 * unit {
            for dx in 0..7 * unit {
                let (mx, my) = (dx / unit, dy / unit);
                let ring = mx == 0 || mx == 6 || my == 0 || my == 6;
                let core = (2..=4).contains(&mx) && (2..=4).contains(&my);
                matrix.set(left + dx, top + dy, ring || core);
            }
        }
    }

    #[test]
    fn test_single_finder() {
        let mut matrix = BitMatrix::new(60, 60);
        draw_finder(&mut matrix, 10, 12, 4);

        let patterns = FinderDetector::detect(&matrix, None, false);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert!((p.center.x - 24.0).abs() < 1.0, "x = {}", p.center.x);
        assert!((p.center.y - 26.0).abs() < 1.0, "y = {}", p.center.y);
        assert!((p.module_size - 4.0).abs() < 0.5);
        assert!(p.count >= 3);
    }

    #[test]
    fn test_check_ratio() {
        assert_eq!(FinderDetector::check_ratio(&[3, 3, 9, 3, 3]), Some(3.0));
        assert!(FinderDetector::check_ratio(&[1, 1, 3, 1, 0]).is_none());
        assert!(FinderDetector::check_ratio(&[3, 3, 3, 3, 3]).is_none());
    }

    #[test]
    fn test_stripes_are_not_finders() {
        // Equal-width stripes pass no 1:1:3:1:1 window
        let matrix = BitMatrix::from_fn(60, 30, |x, _| (x / 3) % 2 == 0);
        assert!(FinderDetector::detect(&matrix, None, true).is_empty());
    }

    #[test]
    fn test_contrast_from_luma() {
        let mut matrix = BitMatrix::new(40, 40);
        draw_finder(&mut matrix, 5, 5, 3);
        let pixels: Vec<u8> = (0..40 * 40)
            .map(|i| if matrix.get(i % 40, i / 40) { 40 } else { 220 })
            .collect();
        let luma = LumaImage::new(&pixels, 40, 40).unwrap();
        let patterns = FinderDetector::detect(&matrix, Some(&luma), true);
        assert!((patterns[0].contrast - 180.0 / 255.0).abs() < 1e-3);
    }
}
