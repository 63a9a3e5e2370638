//! Colour to luminance conversion
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8

use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Rows handled per rayon task
const PARALLEL_ROWS: usize = 32;

/// Images with at least this many pixels are converted on the rayon pool
const PARALLEL_THRESHOLD: usize = 512 * 512;

#[inline]
fn luma(px: &[u8]) -> u8 {
    let y = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    y.min(255) as u8
}

fn convert_scalar(src: &[u8], dst: &mut [u8], channels: usize) {
    for (out, px) in dst.iter_mut().zip(src.chunks_exact(channels)) {
        *out = luma(px);
    }
}

/// Convert interleaved RGB (`channels == 3`) or RGBA (`channels == 4`) to luminance.
///
/// Large images are split into row bands and converted in parallel.
pub fn to_luma(src: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = vec![0u8; pixel_count];
    if channels < 3 || src.len() < pixel_count * channels {
        return gray;
    }

    if pixel_count >= PARALLEL_THRESHOLD && width > 0 {
        let band = width * PARALLEL_ROWS;
        gray.par_chunks_mut(band)
            .zip(src.par_chunks(band * channels))
            .for_each(|(dst, src)| convert_scalar(src, dst, channels));
    } else {
        convert_scalar(src, &mut gray, channels);
    }
    gray
}

/// Convert RGB image to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_luma(rgb, width, height, 3)
}

/// Convert RGBA image to grayscale (ignores alpha channel)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_luma(rgba, width, height, 4)
}
