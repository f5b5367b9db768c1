//! cosa: a block-DCT lossy audio codec for mono pcm16
//!
//! Stream layout, all fields bit-packed msb first:
//!
//! ```text
//! [sample_rate:32][total_frames:64][block_size:16][num_coeffs:16][quant_bits:8]
//! { [scale_factor:32][level_0:quant_bits] ... [level_{num_coeffs-1}:quant_bits] } *
//! ```
//!
//! The stream is byte aligned only at the very end.

pub mod core;
pub mod lossy;
pub mod reader;
pub mod writer;

use serde::{Deserialize, Serialize};

pub use crate::core::{
    compare, BitReader, BitWriter, CodecParams, CosaError, CosaResult, DecodeStats, EncodeStats,
    ErrorMetrics, PcmSink, PcmSource, SliceSource, StreamHeader, HEADER_BITS,
};
pub use lossy::{BlockRecord, Dct, DctPlanner, Decoder, Encoder, QualityPreset, Transform};
pub use reader::{Reader, StreamInfo};

/// a fully decoded stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// encode mono pcm16 samples into a cosa stream
///
/// # Arguments
/// * `samples` - Mono samples, full 16-bit range
/// * `sample_rate` - Sample rate in Hz (1000..=192000)
/// * `params` - Block size, retained coefficients and quantization bits
///
/// # Returns
/// The complete stream, padded to a whole byte
pub fn encode(samples: &[i16], sample_rate: u32, params: CodecParams) -> CosaResult<Vec<u8>> {
    Encoder::new(params).encode_to_vec(samples, sample_rate)
}

/// encode with running statistics
pub fn encode_with_stats(
    samples: &[i16],
    sample_rate: u32,
    params: CodecParams,
) -> CosaResult<(Vec<u8>, EncodeStats)> {
    let mut source = SliceSource::new(samples, sample_rate);
    Encoder::new(params).encode(&mut source, Vec::new())
}

/// decode a complete in-memory cosa stream
pub fn decode(data: &[u8]) -> CosaResult<DecodedAudio> {
    let mut samples = Vec::new();
    let (header, _) = Decoder::decode(data, &mut samples)?;
    Ok(DecodedAudio {
        sample_rate: header.sample_rate,
        samples,
    })
}

/// header-level information about a stream
pub fn info(data: &[u8]) -> CosaResult<StreamInfo> {
    Reader::new().info(data)
}

/// get version
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
