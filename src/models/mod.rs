/// Detector candidates handed to the decoders
pub mod candidate;
/// Square module grids
pub mod grid;
/// Borrowed or owned 8-bit luminance images
pub mod image;
/// Bit matrices
pub mod matrix;
/// 2D points
pub mod point;
/// QR version, error correction level and mask
pub mod qr_code;
/// Decode results and their metadata
pub mod result;
/// Supported symbologies
pub mod symbology;

pub use candidate::{CandidateKind, FinderCandidate};
pub use grid::SymbolGrid;
pub use image::LumaImage;
pub use matrix::BitMatrix;
pub use point::Point;
pub use qr_code::{ECLevel, MaskPattern, Version};
pub use result::{DecodeResult, QrMetadata, StructuredAppend};
pub use symbology::Symbology;
