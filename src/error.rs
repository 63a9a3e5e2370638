//! Error types.
//!
//! [`StageError`] is local to one candidate and never escapes a decode call;
//! [`DecodeError`] is the only way a decode call itself fails.

use thiserror::Error;

/// Per-candidate pipeline failure. The pipeline logs these and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// Binarizer found no usable contrast
    #[error("image has no usable contrast")]
    ImageDegenerate,
    /// Locator produced no candidate
    #[error("no locator pattern found")]
    NoPatternFound,
    /// Transform singular or module centre outside the image
    #[error("grid sampling failed: {0}")]
    SamplingFailed(&'static str),
    /// Format or version information beyond correction capacity
    #[error("symbol metadata uncorrectable: {0}")]
    MetadataUncorrectable(&'static str),
    /// A codeword block had more errors than it can correct
    #[error("error correction failed in block {block}")]
    ErrorCorrectionFailed {
        /// Index of the failing block
        block: usize,
    },
    /// Mode indicator or segment could not be interpreted
    #[error("malformed payload: {0}")]
    MalformedPayload(&'static str),
}

/// Failure of a whole decode call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Zero dimension or a buffer that does not match the dimensions
    #[error("invalid image: {width}x{height} with {len} bytes")]
    InvalidImage {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
        /// Buffer length actually supplied
        len: usize,
    },
    /// `enable_decoders` is off
    #[error("decoders are disabled by configuration")]
    DecodersDisabled,
}

/// Failure to synthesize a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// `enable_encoders` is off
    #[error("encoders are disabled by configuration")]
    EncodersDisabled,
    /// Payload does not fit the largest symbol
    #[error("data too long: {len} bytes exceeds capacity {capacity}")]
    DataTooLong {
        /// Payload length in bytes
        len: usize,
        /// Largest capacity available
        capacity: usize,
    },
    /// Character cannot be represented in the symbology
    #[error("unsupported character {0:?}")]
    UnsupportedCharacter(char),
    /// Wrong number of digits
    #[error("expected {expected} digits, got {actual}")]
    InvalidLength {
        /// Accepted digit count(s), e.g. "12 or 13"
        expected: &'static str,
        /// Supplied digit count
        actual: usize,
    },
    /// Supplied check digit does not match the computed one
    #[error("check digit mismatch")]
    InvalidCheckDigit,
}

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid JSON for [`crate::DecodeOptions`]
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = StageError::ErrorCorrectionFailed { block: 2 };
        assert_eq!(err.to_string(), "error correction failed in block 2");
        let err = DecodeError::InvalidImage {
            width: 0,
            height: 5,
            len: 0,
        };
        assert_eq!(err.to_string(), "invalid image: 0x5 with 0 bytes");
    }
}
