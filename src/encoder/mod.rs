//! Symbol synthesis
//!
//! Used by the `scantool encode` command, the integration tests and the
//! benchmarks to produce images with known content.

/// Code 128 bar widths
pub mod code128;
/// EAN-13 / UPC-A bar widths
pub mod ean;
/// QR module grids
pub mod qr;
/// Rasterization and warping
pub mod render;
