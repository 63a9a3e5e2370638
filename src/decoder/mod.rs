//! QR decoding modules
//!
//! This module contains all the logic for decoding QR symbols after sampling:
//! - Format and version information extraction
//! - Unmasking and codeword extraction
//! - De-interleaving and Reed-Solomon error correction
//! - Payload decoding (numeric, alphanumeric, byte, kanji, ECI)

/// BCH error correction for format and version info
pub mod bch;
/// Codeword placement order in the module grid
pub mod bitstream;
/// Block de-interleaving and per-block correction
pub mod codewords;
/// Format information extraction (mask pattern, EC level)
pub mod format;
/// Function module mask builder (finder/timing/format/alignment/version)
pub mod function_mask;
/// Data mode decoders (numeric, alphanumeric, byte, kanji, ECI)
pub mod modes;
/// Segment walk over corrected data codewords
pub mod payload;
/// Grid-level decoder tying the stages together
pub mod qr_decoder;
/// Reed-Solomon error correction
pub mod reed_solomon;
/// Version and EC level tables (block layouts, alignment centres)
pub mod tables;
/// Mask removal
pub mod unmask;
/// Version information extraction (versions 7-40)
pub mod version;
