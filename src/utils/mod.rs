//! Image helpers shared by the detector and decoders
//!
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Binarization (hybrid local threshold, global histogram, fixed level)
//! - Geometry (perspective transforms, corner angles)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
