use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Barcode standard a result was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    /// QR Code, model 2
    Qr,
    /// Code 128
    Code128,
    /// EAN-13
    Ean13,
    /// UPC-A (EAN-13 with a leading zero)
    UpcA,
}

impl Symbology {
    /// Every supported symbology
    pub const ALL: [Symbology; 4] = [
        Symbology::Qr,
        Symbology::Code128,
        Symbology::Ean13,
        Symbology::UpcA,
    ];

    /// One-dimensional symbologies are located by scan lines, not finder squares
    pub fn is_linear(&self) -> bool {
        !matches!(self, Symbology::Qr)
    }

    /// Lowercase name used by the CLI and JSON
    pub fn name(&self) -> &'static str {
        match self {
            Symbology::Qr => "qr",
            Symbology::Code128 => "code128",
            Symbology::Ean13 => "ean13",
            Symbology::UpcA => "upca",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Symbology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "qr" | "qrcode" => Ok(Symbology::Qr),
            "code128" => Ok(Symbology::Code128),
            "ean13" => Ok(Symbology::Ean13),
            "upca" => Ok(Symbology::UpcA),
            _ => Err(format!("unknown symbology '{s}'")),
        }
    }
}
