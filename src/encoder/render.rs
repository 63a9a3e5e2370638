//! Rasterize symbols into luminance images and warp them for testing.

use crate::models::{LumaImage, Point, SymbolGrid};
use crate::utils::geometry::PerspectiveTransform;

const LIGHT: u8 = 255;
const DARK: u8 = 0;

/// Render a module grid with `scale` pixels per module and `quiet` light modules around it
pub fn render_grid(grid: &SymbolGrid, scale: usize, quiet: usize) -> LumaImage<'static> {
    let scale = scale.max(1);
    let side = (grid.dimension() + 2 * quiet) * scale;
    let mut image = LumaImage::filled(side, side, LIGHT);
    let pixels = image.pixels_mut();
    for y in 0..grid.dimension() {
        for x in 0..grid.dimension() {
            if !grid.get(x, y) {
                continue;
            }
            let (px, py) = ((x + quiet) * scale, (y + quiet) * scale);
            for row in py..py + scale {
                pixels[row * side + px..row * side + px + scale].fill(DARK);
            }
        }
    }
    image
}

/// Render alternating bar/space widths (bar first) as a 1D symbol `height` pixels tall
pub fn render_bars(widths: &[u8], scale: usize, height: usize, quiet: usize) -> LumaImage<'static> {
    let scale = scale.max(1);
    let modules: usize = widths.iter().map(|&w| w as usize).sum();
    let width = (modules + 2 * quiet) * scale;
    let mut row = vec![LIGHT; width];
    let mut x = quiet * scale;
    for (i, &w) in widths.iter().enumerate() {
        let run = w as usize * scale;
        if i % 2 == 0 {
            row[x..x + run].fill(DARK);
        }
        x += run;
    }

    let mut image = LumaImage::filled(width, height, LIGHT);
    for line in image.pixels_mut().chunks_mut(width) {
        line.copy_from_slice(&row);
    }
    image
}

/// Warp `src` so its corners (top-left, top-right, bottom-right, bottom-left)
/// land on `corners` in a `width` x `height` light canvas.
///
/// Pixels are sampled bilinearly. `None` for a degenerate quadrilateral.
pub fn render_transformed(
    src: &LumaImage<'_>,
    corners: &[Point; 4],
    width: usize,
    height: usize,
) -> Option<LumaImage<'static>> {
    let (w, h) = (src.width() as f32, src.height() as f32);
    let src_corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ];
    let to_src = PerspectiveTransform::from_points(corners, &src_corners)?;

    let mut out = LumaImage::filled(width, height, LIGHT);
    let out_width = out.width();
    for (y, line) in out.pixels_mut().chunks_mut(out_width).enumerate() {
        for (x, pixel) in line.iter_mut().enumerate() {
            if let Some((u, v)) = to_src.transform_f64(x as f64 + 0.5, y as f64 + 0.5) {
                *pixel = sample_bilinear(src, u - 0.5, v - 0.5);
            }
        }
    }
    Some(out)
}

/// Rotate `src` by `degrees` clockwise about its centre on a canvas large enough to hold it.
///
/// Each canvas side takes the parity of the source side it most nearly
/// lies along, so quarter turns land on whole pixels.
pub fn rotate(src: &LumaImage<'_>, degrees: f32) -> Option<LumaImage<'static>> {
    let (w, h) = (src.width() as f32, src.height() as f32);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let side = (w.hypot(h)).ceil() as usize + 2;
    let (along_x, along_y) = if cos.abs() >= sin.abs() {
        (src.width(), src.height())
    } else {
        (src.height(), src.width())
    };
    let width = side + (side + along_x) % 2;
    let height = side + (side + along_y) % 2;

    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| {
        let (dx, dy) = (x - w / 2.0, y - h / 2.0);
        Point::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    });
    render_transformed(src, &corners, width, height)
}

fn sample_bilinear(src: &LumaImage<'_>, x: f64, y: f64) -> u8 {
    let at = |xi: i64, yi: i64| -> f64 {
        if xi < 0 || yi < 0 || xi >= src.width() as i64 || yi >= src.height() as i64 {
            LIGHT as f64
        } else {
            src.get(xi as usize, yi as usize) as f64
        }
    };
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (xi, yi) = (x0 as i64, y0 as i64);
    let top = at(xi, yi) * (1.0 - fx) + at(xi + 1, yi) * fx;
    let bottom = at(xi, yi + 1) * (1.0 - fx) + at(xi + 1, yi + 1) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_grid() {
        let mut grid = SymbolGrid::new(21);
        grid.set(0, 0, true);
        let image = render_grid(&grid, 3, 4);
        assert_eq!(image.width(), 29 * 3);
        assert_eq!(image.get(12, 12), DARK);
        assert_eq!(image.get(14, 14), DARK);
        assert_eq!(image.get(15, 12), LIGHT);
        assert_eq!(image.get(0, 0), LIGHT);
    }

    #[test]
    fn test_render_bars() {
        let image = render_bars(&[1, 2, 3], 2, 5, 1);
        assert_eq!((image.width(), image.height()), (16, 5));
        let row = image.row(3);
        assert_eq!(&row[..4], &[LIGHT, LIGHT, DARK, DARK]);
        assert_eq!(&row[4..8], &[LIGHT; 4]);
        assert_eq!(&row[8..14], &[DARK; 6]);
    }

    #[test]
    fn test_identity_warp() {
        let src = render_bars(&[2, 2, 2], 4, 8, 2);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(src.width() as f32, 0.0),
            Point::new(src.width() as f32, 8.0),
            Point::new(0.0, 8.0),
        ];
        let out = render_transformed(&src, &corners, src.width(), 8).unwrap();
        assert_eq!(out.pixels(), src.pixels());
    }

    #[test]
    fn test_rotate_180_flips() {
        let src = render_bars(&[3, 3], 2, 4, 1);
        let rotated = rotate(&src, 180.0).unwrap();
        // Dark bar moves to the right half of the rotated content
        let y = rotated.height() / 2;
        let row = rotated.row(y);
        let dark: Vec<usize> = (0..row.len()).filter(|&x| row[x] < 128).collect();
        let light_run_left = dark.first().copied().unwrap_or(0);
        assert!(light_run_left > rotated.width() / 2 - 2);
    }

    #[test]
    fn test_quarter_turns_keep_bar_widths() {
        // 26 x 7 source: a square canvas cannot match both parities
        let src = render_bars(&[1, 2, 3, 1], 2, 7, 3);
        for degrees in [90.0, 180.0, 270.0] {
            let rotated = rotate(&src, degrees).unwrap();
            let greys = rotated
                .pixels()
                .iter()
                .filter(|&&p| p != DARK && p != LIGHT)
                .count();
            assert_eq!(greys, 0, "{degrees} degrees");
            let dark = rotated.pixels().iter().filter(|&&p| p == DARK).count();
            assert_eq!(dark, 4 * 2 * 7, "{degrees} degrees");
        }
    }
}
