use serde::{Deserialize, Serialize};

use super::{ECLevel, MaskPattern, Point, Symbology, Version};

/// Structural metadata of a decoded QR symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrMetadata {
    /// Symbol version
    pub version: Version,
    /// Error correction level
    pub ec_level: ECLevel,
    /// Mask pattern applied to the data region
    pub mask: MaskPattern,
    /// Symbol was read from a mirrored image
    pub mirrored: bool,
    /// Structured append header, when the symbol is part of a sequence
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub structured_append: Option<StructuredAppend>,
    /// Payload carries an FNC1 (GS1) indicator
    #[serde(default)]
    pub gs1: bool,
}

/// Position of a symbol within a structured append sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAppend {
    /// Zero-based index of this symbol
    pub index: u8,
    /// Number of symbols in the sequence
    pub total: u8,
    /// XOR of all payload bytes of the full message
    pub parity: u8,
}

/// One decoded symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    /// Symbology the symbol was read as
    pub symbology: Symbology,
    /// Decoded text
    pub text: String,
    /// Raw payload bytes
    pub bytes: Vec<u8>,
    /// Codewords repaired by error correction (0 for 1D symbologies)
    pub error_count: usize,
    /// Corners in image coordinates: top-left, top-right, bottom-right, bottom-left
    pub position: [Point; 4],
    /// QR structural metadata
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qr: Option<QrMetadata>,
}

impl DecodeResult {
    /// Centre of the position quadrilateral
    pub fn center(&self) -> Point {
        let (sx, sy) = self
            .position
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }

    /// Length of the shorter diagonal of the position quadrilateral
    pub fn extent(&self) -> f32 {
        let d1 = self.position[0].distance(&self.position[2]);
        let d2 = self.position[1].distance(&self.position[3]);
        d1.min(d2)
    }
}
