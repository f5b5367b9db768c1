//! Block-transform lossy codec
//!
//! Frames pcm into fixed blocks, runs a DCT, keeps the low-frequency head of
//! each block and quantizes it against a per-block scale factor.

pub mod dct;
pub mod decoder;
pub mod encoder;
pub mod quantizer;

use std::str::FromStr;

use crate::core::{CodecParams, CosaError, CosaResult};

// Re-export main types
pub use dct::{Dct, DctPlanner, Transform};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use quantizer::BlockRecord;

/// Quality presets for lossy encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    /// Long blocks, 10% of coefficients, 6 bits (~27:1)
    /// Speech and previews
    Low,
    /// The codec defaults: 1024 samples, 20%, 8 bits (~10:1)
    Medium,
    /// 35% of coefficients at 10 bits (~4.6:1)
    High,
    /// Half the coefficients at 12 bits (~2.7:1)
    VeryHigh,
    /// Every coefficient at 16 bits, short blocks (~1:1)
    /// Only quantization noise remains
    Transparent,
}

impl QualityPreset {
    /// Block size, keep fraction and quantization bits for this preset
    pub fn settings(self) -> (usize, f64, u8) {
        match self {
            QualityPreset::Low => (2048, 0.1, 6),
            QualityPreset::Medium => (1024, 0.2, 8),
            QualityPreset::High => (1024, 0.35, 10),
            QualityPreset::VeryHigh => (512, 0.5, 12),
            QualityPreset::Transparent => (256, 1.0, 16),
        }
    }

    /// Codec parameters for this preset
    pub fn params(self) -> CodecParams {
        let (block_size, fraction, quant_bits) = self.settings();
        // preset tables are in range by construction
        CodecParams::from_keep_fraction(block_size, fraction, quant_bits).unwrap_or_default()
    }

    /// Estimate compression ratio for this quality level
    pub fn expected_ratio(self) -> f64 {
        self.params().expected_compression_ratio()
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
            QualityPreset::VeryHigh => "veryhigh",
            QualityPreset::Transparent => "transparent",
        }
    }
}

impl FromStr for QualityPreset {
    type Err = CosaError;

    fn from_str(s: &str) -> CosaResult<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            "veryhigh" | "vh" => Ok(QualityPreset::VeryHigh),
            "transparent" | "trans" => Ok(QualityPreset::Transparent),
            _ => Err(CosaError::InvalidParameter(format!(
                "unknown quality preset '{}', use: low, medium, high, veryhigh, transparent",
                s
            ))),
        }
    }
}

impl From<u8> for QualityPreset {
    fn from(v: u8) -> Self {
        match v {
            0 => QualityPreset::Low,
            1 => QualityPreset::Medium,
            2 => QualityPreset::High,
            3 => QualityPreset::VeryHigh,
            _ => QualityPreset::Transparent,
        }
    }
}

impl From<QualityPreset> for u8 {
    fn from(q: QualityPreset) -> u8 {
        match q {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 1,
            QualityPreset::High => 2,
            QualityPreset::VeryHigh => 3,
            QualityPreset::Transparent => 4,
        }
    }
}
