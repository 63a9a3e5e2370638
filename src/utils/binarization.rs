//! Luminance to 1-bit conversion.
//!
//! All binarizers return a matrix with exactly the input dimensions,
//! `true` = dark.

use crate::config::Binarizer;
use crate::error::StageError;
use crate::models::{BitMatrix, LumaImage};

const BLOCK_SIZE: usize = 8;
const MIN_DYNAMIC_RANGE: u8 = 24;
/// Hybrid thresholding needs a 5x5 block neighbourhood
const MIN_HYBRID_DIMENSION: usize = BLOCK_SIZE * 5;

/// Binarize with the selected method.
///
/// Fails with [`StageError::ImageDegenerate`] when the image has less than
/// [`MIN_DYNAMIC_RANGE`] levels of contrast overall.
pub fn binarize(image: &LumaImage<'_>, method: Binarizer) -> Result<BitMatrix, StageError> {
    let (min, max) = image
        .pixels()
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    if max.saturating_sub(min) < MIN_DYNAMIC_RANGE {
        return Err(StageError::ImageDegenerate);
    }

    Ok(match method {
        Binarizer::Auto | Binarizer::Hybrid => hybrid_binarize(image),
        Binarizer::GlobalHistogram => otsu_binarize(image),
        Binarizer::Fixed(level) => threshold_binarize(image, level),
    })
}

/// Local block thresholding.
///
/// Each 8x8 block gets a black point; a pixel is dark when it is at or below
/// the mean black point of the surrounding 5x5 blocks. Low-contrast blocks
/// borrow the estimate of their already-visited neighbours so that the
/// interior of large dark or light regions stays consistent.
pub fn hybrid_binarize(image: &LumaImage<'_>) -> BitMatrix {
    let width = image.width();
    let height = image.height();
    if width < MIN_HYBRID_DIMENSION || height < MIN_HYBRID_DIMENSION {
        return otsu_binarize(image);
    }

    let sub_width = width.div_ceil(BLOCK_SIZE);
    let sub_height = height.div_ceil(BLOCK_SIZE);
    let black_points = calculate_black_points(image, sub_width, sub_height);

    let mut binary = BitMatrix::new(width, height);
    for by in 0..sub_height {
        let y_offset = (by * BLOCK_SIZE).min(height - BLOCK_SIZE);
        let top = by.clamp(2, sub_height - 3);
        for bx in 0..sub_width {
            let x_offset = (bx * BLOCK_SIZE).min(width - BLOCK_SIZE);
            let left = bx.clamp(2, sub_width - 3);

            let mut sum = 0u32;
            for row in &black_points[top - 2..=top + 2] {
                sum += row[left - 2..=left + 2].iter().map(|&v| v as u32).sum::<u32>();
            }
            let threshold = (sum / 25) as u8;

            for y in y_offset..y_offset + BLOCK_SIZE {
                let row = image.row(y);
                for x in x_offset..x_offset + BLOCK_SIZE {
                    if row[x] <= threshold {
                        binary.set(x, y, true);
                    }
                }
            }
        }
    }
    binary
}

fn calculate_black_points(image: &LumaImage<'_>, sub_width: usize, sub_height: usize) -> Vec<Vec<u8>> {
    let width = image.width();
    let height = image.height();
    let mut black_points = vec![vec![0u8; sub_width]; sub_height];

    for by in 0..sub_height {
        let y_offset = (by * BLOCK_SIZE).min(height - BLOCK_SIZE);
        for bx in 0..sub_width {
            let x_offset = (bx * BLOCK_SIZE).min(width - BLOCK_SIZE);
            let mut sum = 0u32;
            let mut min = u8::MAX;
            let mut max = u8::MIN;
            for y in y_offset..y_offset + BLOCK_SIZE {
                for &p in &image.row(y)[x_offset..x_offset + BLOCK_SIZE] {
                    sum += p as u32;
                    min = min.min(p);
                    max = max.max(p);
                }
            }

            let mut average = (sum >> 6) as u8;
            if max - min <= MIN_DYNAMIC_RANGE {
                // Flat block: assume background unless the neighbours say otherwise
                average = min / 2;
                if by > 0 && bx > 0 {
                    let neighbours = (black_points[by - 1][bx] as u32
                        + 2 * black_points[by][bx - 1] as u32
                        + black_points[by - 1][bx - 1] as u32)
                        / 4;
                    if (min as u32) < neighbours {
                        average = neighbours as u8;
                    }
                }
            }
            black_points[by][bx] = average;
        }
    }
    black_points
}

/// Convert to binary using Otsu's global threshold
pub fn otsu_binarize(image: &LumaImage<'_>) -> BitMatrix {
    let threshold = calculate_otsu_threshold(image.pixels());
    threshold_binarize(image, threshold)
}

/// Otsu's optimal threshold: pixels below it are dark
pub fn calculate_otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut below_count = 0.0;
    let mut below_sum = 0.0;
    let mut max_variance = 0.0;
    let mut optimal_threshold = 128u8;

    // `threshold` splits [0, threshold) from [threshold, 255]
    for threshold in 1..=255usize {
        below_count += histogram[threshold - 1] as f64;
        below_sum += (threshold - 1) as f64 * histogram[threshold - 1] as f64;
        let above_count = total - below_count;
        if below_count == 0.0 || above_count == 0.0 {
            continue;
        }
        let mean_below = below_sum / below_count;
        let mean_above = (total_sum - below_sum) / above_count;
        let variance = below_count * above_count * (mean_below - mean_above).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization: `p < threshold` is dark
pub fn threshold_binarize(image: &LumaImage<'_>, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(image.width(), image.height());
    for y in 0..image.height() {
        for (x, &p) in image.row(y).iter().enumerate() {
            if p < threshold {
                binary.set(x, y, true);
            }
        }
    }
    binary
}
