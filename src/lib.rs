//! rust_barcode - barcode decoding for still images
//!
//! Reads QR Code (model 2, versions 1-40), Code 128, EAN-13 and UPC-A from
//! luminance images. Each image runs through a fixed pipeline: binarize,
//! locate candidates, sample the module grid, read format and version,
//! correct errors, decode the payload. Candidates are evaluated
//! independently, in parallel on the rayon pool when enabled.
//!
//! ```no_run
//! use rust_barcode::{DecodeOptions, decode_luma};
//!
//! let pixels = vec![255u8; 640 * 480];
//! let results = decode_luma(&pixels, 640, 480, &DecodeOptions::default()).unwrap();
//! for r in results {
//!     println!("{}: {}", r.symbology, r.text);
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Decode options and environment defaults
pub mod config;
/// QR decoding modules (format, version, error correction, payload)
pub mod decoder;
/// Symbol location (finder squares, 1D start patterns) and grid sampling
pub mod detector;
/// Symbol synthesis and rasterization
pub mod encoder;
/// Error types
pub mod error;
/// Core data structures (LumaImage, BitMatrix, SymbolGrid, DecodeResult, etc.)
pub mod models;
/// 1D symbol decoding from scan-line runs
pub mod oned;
/// Per-image orchestration
pub mod pipeline;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;

pub use config::{Binarizer, DecodeOptions};
pub use encoder::qr::QrEncodeOptions;
pub use encoder::render::{render_bars, render_grid};
pub use error::{ConfigError, DecodeError, EncodeError, StageError};
pub use models::{
    BitMatrix, DecodeResult, ECLevel, LumaImage, MaskPattern, Point, QrMetadata, StructuredAppend,
    SymbolGrid, Symbology, Version,
};

use rayon::prelude::*;
use tracing::warn;

/// Decode every symbol in a luminance image
pub fn decode(
    image: &LumaImage<'_>,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, DecodeError> {
    pipeline::decode(image, options)
}

/// Decode from 8-bit luminance bytes (1 byte per pixel, row-major)
///
/// # Errors
/// [`DecodeError::InvalidImage`] when `pixels.len() != width * height` or
/// either dimension is zero.
pub fn decode_luma(
    pixels: &[u8],
    width: usize,
    height: usize,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, DecodeError> {
    let image = LumaImage::new(pixels, width, height)?;
    pipeline::decode(&image, options)
}

/// Decode from packed RGB bytes (3 bytes per pixel)
///
/// Large images are converted to luminance in parallel.
pub fn decode_rgb(
    rgb: &[u8],
    width: usize,
    height: usize,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, DecodeError> {
    let image = LumaImage::from_rgb(rgb, width, height)?;
    pipeline::decode(&image, options)
}

/// Decode an image loaded with the `image` crate
pub fn decode_dynamic(
    image: &image::DynamicImage,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, DecodeError> {
    let luma = LumaImage::from_dynamic(image)?;
    pipeline::decode(&luma, options)
}

/// Decode many images in parallel, one result per image in input order
pub fn decode_batch(
    images: &[LumaImage<'_>],
    options: &DecodeOptions,
) -> Vec<Result<Vec<DecodeResult>, DecodeError>> {
    images
        .par_iter()
        .map(|image| pipeline::decode(image, options))
        .collect()
}

/// Decoder bound to a set of options and, optionally, its own thread pool
pub struct Detector {
    options: DecodeOptions,
    pool: Option<rayon::ThreadPool>,
}

impl Detector {
    /// Detector using the global rayon pool
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            pool: None,
        }
    }

    /// Detector running candidate evaluation on a dedicated pool of `threads` workers.
    ///
    /// Falls back to the global pool if the dedicated one cannot be built.
    pub fn with_threads(options: DecodeOptions, threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("barcode-worker-{i}"))
            .build();
        match pool {
            Ok(pool) => Self {
                options,
                pool: Some(pool),
            },
            Err(err) => {
                warn!(%err, threads, "thread pool unavailable, using the global pool");
                Self::new(options)
            }
        }
    }

    /// Options in use
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode every symbol in `image`
    pub fn decode(&self, image: &LumaImage<'_>) -> Result<Vec<DecodeResult>, DecodeError> {
        match &self.pool {
            Some(pool) => pool.install(|| pipeline::decode(image, &self.options)),
            None => pipeline::decode(image, &self.options),
        }
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

fn encoders_enabled(options: &DecodeOptions) -> Result<(), EncodeError> {
    if options.enable_encoders {
        Ok(())
    } else {
        Err(EncodeError::EncodersDisabled)
    }
}

/// Encode `text` as a QR symbol at the smallest fitting version
pub fn encode_qr(
    text: &str,
    ec_level: ECLevel,
    encode_options: &QrEncodeOptions,
    options: &DecodeOptions,
) -> Result<SymbolGrid, EncodeError> {
    encoders_enabled(options)?;
    encoder::qr::encode(text, ec_level, encode_options)
}

/// Encode `text` as Code 128 bar/space widths in modules, bar first
pub fn encode_code128(text: &str, options: &DecodeOptions) -> Result<Vec<u8>, EncodeError> {
    encoders_enabled(options)?;
    encoder::code128::encode(text)
}

/// Encode 12 or 13 digits as EAN-13 bar/space widths
pub fn encode_ean13(digits: &str, options: &DecodeOptions) -> Result<Vec<u8>, EncodeError> {
    encoders_enabled(options)?;
    encoder::ean::encode_ean13(digits)
}

/// Encode 11 or 12 digits as UPC-A bar/space widths
pub fn encode_upca(digits: &str, options: &DecodeOptions) -> Result<Vec<u8>, EncodeError> {
    encoders_enabled(options)?;
    encoder::ean::encode_upca(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty() {
        let image = vec![0u8; 300];
        let codes = decode_rgb(&image, 10, 10, &DecodeOptions::default()).unwrap();
        assert!(codes.is_empty());
    }

    #[test]
    fn test_invalid_buffer() {
        let err = decode_luma(&[0u8; 10], 4, 4, &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidImage {
                width: 4,
                height: 4,
                len: 10
            }
        );
    }

    #[test]
    fn test_encoders_gated() {
        let off = DecodeOptions::default().with_encoders(false);
        assert_eq!(
            encode_code128("x", &off),
            Err(EncodeError::EncodersDisabled)
        );
        assert!(encode_ean13("400638133393", &DecodeOptions::default()).is_ok());
    }

    #[test]
    fn test_detector_with_threads() {
        let detector = Detector::with_threads(DecodeOptions::default(), 2);
        let image = LumaImage::filled(30, 30, 0);
        assert_eq!(detector.decode(&image), Ok(Vec::new()));
    }
}
