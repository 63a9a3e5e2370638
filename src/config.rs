//! Decode options and environment-driven defaults.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::Symbology;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

static TRY_HARDER: OnceLock<bool> = OnceLock::new();

pub(crate) fn env_try_harder() -> bool {
    *TRY_HARDER.get_or_init(|| parse_env_bool_u8("BARCODE_TRY_HARDER", false))
}

static PARALLEL: OnceLock<bool> = OnceLock::new();

pub(crate) fn env_parallel() -> bool {
    *PARALLEL.get_or_init(|| parse_env_bool_u8("BARCODE_PARALLEL", true))
}

static MAX_SYMBOLS: OnceLock<usize> = OnceLock::new();

pub(crate) fn env_max_symbols() -> usize {
    *MAX_SYMBOLS.get_or_init(|| parse_env_usize("BARCODE_MAX_SYMBOLS", 0))
}

static MAX_CANDIDATES: OnceLock<usize> = OnceLock::new();

/// Upper bound on QR candidates evaluated per binarized image
pub(crate) fn max_candidates() -> usize {
    *MAX_CANDIDATES.get_or_init(|| parse_env_usize("BARCODE_MAX_CANDIDATES", 48).clamp(1, 1024))
}

/// Thresholding strategy used to binarize the luminance image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binarizer {
    /// Hybrid, with a global-histogram retry when nothing decodes
    #[default]
    Auto,
    /// Local block thresholding
    Hybrid,
    /// Otsu threshold over the whole image
    GlobalHistogram,
    /// Fixed threshold: pixels below the level are dark
    Fixed(u8),
}

impl fmt::Display for Binarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binarizer::Auto => f.write_str("auto"),
            Binarizer::Hybrid => f.write_str("hybrid"),
            Binarizer::GlobalHistogram => f.write_str("otsu"),
            Binarizer::Fixed(level) => write!(f, "{level}"),
        }
    }
}

impl FromStr for Binarizer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Binarizer::Auto),
            "hybrid" => Ok(Binarizer::Hybrid),
            "otsu" | "global" | "global_histogram" => Ok(Binarizer::GlobalHistogram),
            other => other
                .parse::<u8>()
                .map(Binarizer::Fixed)
                .map_err(|_| format!("unknown binarizer '{s}' (auto, hybrid, otsu or 0-255)")),
        }
    }
}

/// Options for a decode call.
///
/// `Default` picks up `BARCODE_TRY_HARDER`, `BARCODE_PARALLEL` and
/// `BARCODE_MAX_SYMBOLS` from the environment. Missing fields in a JSON
/// config take the same defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Run the decoding pipeline at all
    pub enable_decoders: bool,
    /// Allow the encoders (`encode_*` functions)
    pub enable_encoders: bool,
    /// Scan every row, keep more finder combinations, retry with a second binarizer
    pub try_harder: bool,
    /// Symbologies to report
    pub allowed_symbologies: BTreeSet<Symbology>,
    /// Also scan columns for 1D symbols
    pub try_rotate: bool,
    /// Retry on the inverted image when nothing decodes
    pub try_invert: bool,
    /// Thresholding method for the first pass
    pub binarizer: Binarizer,
    /// Stop after this many symbols (0 = unlimited)
    pub max_symbols: usize,
    /// Evaluate candidates on the rayon pool
    pub parallel: bool,
    /// Report EAN-13 symbols with a leading zero as UPC-A
    pub report_upca: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            enable_decoders: true,
            enable_encoders: true,
            try_harder: env_try_harder(),
            allowed_symbologies: Symbology::ALL.into_iter().collect(),
            try_rotate: true,
            try_invert: false,
            binarizer: Binarizer::Auto,
            max_symbols: env_max_symbols(),
            parallel: env_parallel(),
            report_upca: false,
        }
    }
}

impl DecodeOptions {
    /// Load options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set [`Self::try_harder`]
    pub fn with_try_harder(mut self, try_harder: bool) -> Self {
        self.try_harder = try_harder;
        self
    }

    /// Set [`Self::try_invert`]
    pub fn with_try_invert(mut self, try_invert: bool) -> Self {
        self.try_invert = try_invert;
        self
    }

    /// Set [`Self::try_rotate`]
    pub fn with_try_rotate(mut self, try_rotate: bool) -> Self {
        self.try_rotate = try_rotate;
        self
    }

    /// Restrict decoding to the given symbologies
    pub fn with_symbologies(mut self, symbologies: impl IntoIterator<Item = Symbology>) -> Self {
        self.allowed_symbologies = symbologies.into_iter().collect();
        self
    }

    /// Set [`Self::binarizer`]
    pub fn with_binarizer(mut self, binarizer: Binarizer) -> Self {
        self.binarizer = binarizer;
        self
    }

    /// Set [`Self::max_symbols`]; 0 means no limit
    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = max_symbols;
        self
    }

    /// Set [`Self::parallel`]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set [`Self::report_upca`]
    pub fn with_report_upca(mut self, report_upca: bool) -> Self {
        self.report_upca = report_upca;
        self
    }

    /// Enable or disable the decoding pipeline
    pub fn with_decoders(mut self, enabled: bool) -> Self {
        self.enable_decoders = enabled;
        self
    }

    /// Enable or disable the `encode_*` functions
    pub fn with_encoders(mut self, enabled: bool) -> Self {
        self.enable_encoders = enabled;
        self
    }

    /// Whether results of `symbology` may be reported
    pub fn allows(&self, symbology: Symbology) -> bool {
        self.allowed_symbologies.contains(&symbology)
    }

    /// Whether any linear symbology is enabled
    pub fn wants_linear(&self) -> bool {
        self.allowed_symbologies.iter().any(|s| s.is_linear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarizer_parse() {
        assert_eq!("auto".parse(), Ok(Binarizer::Auto));
        assert_eq!("OTSU".parse(), Ok(Binarizer::GlobalHistogram));
        assert_eq!("128".parse(), Ok(Binarizer::Fixed(128)));
        assert!("300".parse::<Binarizer>().is_err());
        assert!("sharp".parse::<Binarizer>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: DecodeOptions =
            serde_json::from_str(r#"{"try_invert": true, "allowed_symbologies": ["qr"]}"#)
                .unwrap();
        assert!(options.try_invert);
        assert!(options.enable_decoders);
        assert!(options.try_rotate);
        assert!(options.allows(Symbology::Qr));
        assert!(!options.allows(Symbology::Code128));
        assert!(!options.wants_linear());
    }

    #[test]
    fn test_json_round_trip() {
        let options = DecodeOptions::default()
            .with_binarizer(Binarizer::Fixed(90))
            .with_max_symbols(3)
            .with_report_upca(true);
        let json = serde_json::to_string(&options).unwrap();
        let back: DecodeOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_missing_file() {
        let err = DecodeOptions::from_json_file("/nonexistent/options.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
