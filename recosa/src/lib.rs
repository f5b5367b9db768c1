//! recosa - converter library for the cosa block-DCT format
//!
//! Reads anything symphonia can decode, encodes mono pcm16 into cosa
//! streams, and turns cosa streams back into WAV.

pub mod audio;

use anyhow::{bail, Context, Result};

pub use libcosa::lossy::QualityPreset;
pub use libcosa::{CodecParams, EncodeStats, ErrorMetrics, StreamInfo};

/// How many DCT coefficients each block keeps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoeffSelection {
    /// An explicit count, `1..=block_size`
    Count(usize),
    /// A share of the block, in `(0, 1]`
    Fraction(f64),
}

/// Encoding options for converting audio to cosa
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Samples per block
    pub block_size: usize,
    /// Retained low-frequency coefficients per block
    pub coeffs: CoeffSelection,
    /// Bits per quantized coefficient
    pub quant_bits: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            block_size: libcosa::core::DEFAULT_BLOCK_SIZE,
            coeffs: CoeffSelection::Fraction(libcosa::core::DEFAULT_KEEP_FRACTION),
            quant_bits: libcosa::core::DEFAULT_QUANT_BITS,
        }
    }
}

impl EncodeOptions {
    /// Start from one of the quality presets
    pub fn preset(preset: QualityPreset) -> Self {
        let (block_size, fraction, quant_bits) = preset.settings();
        Self {
            block_size,
            coeffs: CoeffSelection::Fraction(fraction),
            quant_bits,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Keep exactly `count` coefficients per block
    pub fn with_coeffs(mut self, count: usize) -> Self {
        self.coeffs = CoeffSelection::Count(count);
        self
    }

    /// Keep `fraction` of each block's coefficients
    pub fn with_keep_fraction(mut self, fraction: f64) -> Self {
        self.coeffs = CoeffSelection::Fraction(fraction);
        self
    }

    pub fn with_quant_bits(mut self, quant_bits: u8) -> Self {
        self.quant_bits = quant_bits;
        self
    }

    /// Validate and resolve into codec parameters
    pub fn params(&self) -> Result<CodecParams> {
        let params = match self.coeffs {
            CoeffSelection::Count(n) => CodecParams::new(self.block_size, n, self.quant_bits),
            CoeffSelection::Fraction(f) => {
                CodecParams::from_keep_fraction(self.block_size, f, self.quant_bits)
            }
        };
        params.context("Invalid encoding options")
    }
}

/// Encode audio file bytes to cosa
///
/// # Arguments
/// * `audio_bytes` - Raw bytes of a mono audio file (WAV, FLAC, MP3, ...)
/// * `options` - Encoding options
///
/// # Returns
/// Raw bytes of the cosa stream
pub fn encode_from_audio(audio_bytes: &[u8], options: EncodeOptions) -> Result<Vec<u8>> {
    let audio = audio::read_mono_pcm(audio_bytes).context("Failed to read audio file")?;
    let (data, _) = encode_from_samples(&audio.samples, audio.sample_rate, options)?;
    Ok(data)
}

/// Encode mono pcm16 samples to cosa
///
/// Returns the stream together with what the encoder did.
pub fn encode_from_samples(
    samples: &[i16],
    sample_rate: u32,
    options: EncodeOptions,
) -> Result<(Vec<u8>, EncodeStats)> {
    let params = options.params()?;
    libcosa::encode_with_stats(samples, sample_rate, params).context("Encoding failed")
}

/// Decode a cosa stream to mono pcm16
///
/// # Returns
/// Tuple of (samples, sample_rate)
pub fn decode_to_samples(cosa_bytes: &[u8]) -> Result<(Vec<i16>, u32)> {
    let decoded = libcosa::decode(cosa_bytes).context("Invalid cosa stream")?;
    Ok((decoded.samples, decoded.sample_rate))
}

/// Decode a cosa stream to WAV bytes
pub fn decode_to_wav(cosa_bytes: &[u8]) -> Result<Vec<u8>> {
    let (samples, sample_rate) = decode_to_samples(cosa_bytes)?;
    audio::write_wav_to_bytes(&samples, sample_rate).context("Failed to write WAV data")
}

/// Get information about a cosa stream without decoding its blocks
pub fn get_stream_info(cosa_bytes: &[u8]) -> Result<StreamInfo> {
    libcosa::info(cosa_bytes).context("Failed to read cosa header")
}

/// A stream is valid when its header parses and every block is present
pub fn validate_stream(cosa_bytes: &[u8]) -> Result<bool> {
    Ok(get_stream_info(cosa_bytes)?.complete)
}

/// Compare two mono audio files sample-by-sample
pub fn compare_audio(original_bytes: &[u8], processed_bytes: &[u8]) -> Result<ErrorMetrics> {
    let original = audio::read_mono_pcm(original_bytes).context("Failed to read original")?;
    let processed = audio::read_mono_pcm(processed_bytes).context("Failed to read processed")?;

    if original.sample_rate != processed.sample_rate {
        bail!(
            "sample rates differ: {} Hz vs {} Hz",
            original.sample_rate,
            processed.sample_rate
        );
    }

    libcosa::compare(&original.samples, &processed.samples).context("Cannot compare signals")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_match_codec_defaults() {
        assert_eq!(EncodeOptions::default().params().unwrap(), CodecParams::default());
    }

    #[test]
    fn test_preset_options() {
        let params = EncodeOptions::preset(QualityPreset::High).params().unwrap();
        assert_eq!(params, QualityPreset::High.params());
    }

    #[test]
    fn test_count_overrides_fraction() {
        let params = EncodeOptions::default()
            .with_keep_fraction(0.5)
            .with_coeffs(205)
            .params()
            .unwrap();
        assert_eq!(params.num_coeffs(), 205);
    }

    #[test]
    fn test_invalid_options() {
        assert!(EncodeOptions::default().with_block_size(10).params().is_err());
        assert!(EncodeOptions::default().with_quant_bits(20).params().is_err());
        assert!(EncodeOptions::default()
            .with_keep_fraction(0.0)
            .params()
            .is_err());
    }
}
