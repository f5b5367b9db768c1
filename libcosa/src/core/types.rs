//! common types for the cosa codec

use serde::{Deserialize, Serialize};

use super::error::{CosaError, CosaResult};

// constants

/// header field widths in bits, in wire order
pub const SAMPLE_RATE_BITS: u32 = 32;
pub const TOTAL_FRAMES_BITS: u32 = 64;
pub const BLOCK_SIZE_BITS: u32 = 16;
pub const NUM_COEFFS_BITS: u32 = 16;
pub const QUANT_BITS_BITS: u32 = 8;

/// header size in bits (136, byte aligned)
pub const HEADER_BITS: u64 = (SAMPLE_RATE_BITS
    + TOTAL_FRAMES_BITS
    + BLOCK_SIZE_BITS
    + NUM_COEFFS_BITS
    + QUANT_BITS_BITS) as u64;

/// width of the per-block scale factor (raw f32 pattern)
pub const SCALE_FACTOR_BITS: u32 = 32;

pub const MIN_SAMPLE_RATE: u32 = 1000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;
pub const MIN_BLOCK_SIZE: usize = 64;
pub const MAX_BLOCK_SIZE: usize = 8192;
pub const MIN_QUANT_BITS: u8 = 4;
pub const MAX_QUANT_BITS: u8 = 16;

pub const DEFAULT_BLOCK_SIZE: usize = 1024;
pub const DEFAULT_KEEP_FRACTION: f64 = 0.2;
pub const DEFAULT_QUANT_BITS: u8 = 8;

// data structures

/// encoder configuration, validated on construction
///
/// Deserialization runs the same checks as [`CodecParams::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCodecParams")]
pub struct CodecParams {
    block_size: usize,
    num_coeffs: usize,
    quant_bits: u8,
}

impl CodecParams {
    /// params with an explicit retained-coefficient count
    pub fn new(block_size: usize, num_coeffs: usize, quant_bits: u8) -> CosaResult<Self> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(CosaError::InvalidParameter(format!(
                "block size must be between {} and {}, got {}",
                MIN_BLOCK_SIZE, MAX_BLOCK_SIZE, block_size
            )));
        }
        if num_coeffs < 1 || num_coeffs > block_size {
            return Err(CosaError::InvalidParameter(format!(
                "coefficient count must be between 1 and {}, got {}",
                block_size, num_coeffs
            )));
        }
        if !(MIN_QUANT_BITS..=MAX_QUANT_BITS).contains(&quant_bits) {
            return Err(CosaError::InvalidParameter(format!(
                "quantization bits must be between {} and {}, got {}",
                MIN_QUANT_BITS, MAX_QUANT_BITS, quant_bits
            )));
        }

        Ok(Self {
            block_size,
            num_coeffs,
            quant_bits,
        })
    }

    /// params keeping `fraction` of every block's coefficients
    ///
    /// The count is truncated toward zero and never drops below 1. Only the
    /// resulting count is stored; the fraction is not kept around.
    pub fn from_keep_fraction(block_size: usize, fraction: f64, quant_bits: u8) -> CosaResult<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(CosaError::InvalidParameter(format!(
                "keep fraction must be in (0, 1], got {}",
                fraction
            )));
        }

        let num_coeffs = ((block_size as f64 * fraction) as usize).clamp(1, block_size.max(1));
        Self::new(block_size, num_coeffs, quant_bits)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_coeffs(&self) -> usize {
        self.num_coeffs
    }

    pub fn quant_bits(&self) -> u8 {
        self.quant_bits
    }

    /// highest quantization level, 2^quant_bits - 1
    pub fn max_level(&self) -> u32 {
        (1u32 << self.quant_bits) - 1
    }

    /// bits taken by one serialized block
    pub fn block_bits(&self) -> u64 {
        SCALE_FACTOR_BITS as u64 + self.num_coeffs as u64 * self.quant_bits as u64
    }

    /// pcm16 bits per block over coded coefficient bits
    pub fn expected_compression_ratio(&self) -> f64 {
        (self.block_size * 16) as f64 / (self.num_coeffs * self.quant_bits as usize) as f64
    }
}

#[derive(Deserialize)]
struct RawCodecParams {
    block_size: usize,
    num_coeffs: usize,
    quant_bits: u8,
}

impl TryFrom<RawCodecParams> for CodecParams {
    type Error = CosaError;

    fn try_from(raw: RawCodecParams) -> CosaResult<Self> {
        CodecParams::new(raw.block_size, raw.num_coeffs, raw.quant_bits)
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        let num_coeffs = (DEFAULT_BLOCK_SIZE as f64 * DEFAULT_KEEP_FRACTION) as usize;
        CodecParams {
            block_size: DEFAULT_BLOCK_SIZE,
            num_coeffs,
            quant_bits: DEFAULT_QUANT_BITS,
        }
    }
}

/// cosa stream header
///
/// | Field        | Bits | Range                |
/// |--------------|------|----------------------|
/// | sample_rate  | 32   | 1000..=192000        |
/// | total_frames | 64   | any                  |
/// | block_size   | 16   | 64..=8192            |
/// | num_coeffs   | 16   | 1..=block_size       |
/// | quant_bits   | 8    | 4..=16               |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHeader {
    pub sample_rate: u32,
    pub total_frames: u64,
    pub block_size: u16,
    pub num_coeffs: u16,
    pub quant_bits: u8,
}

impl StreamHeader {
    /// header for a stream encoded with `params`
    pub fn new(sample_rate: u32, total_frames: u64, params: &CodecParams) -> CosaResult<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(CosaError::InvalidParameter(format!(
                "sample rate must be between {} and {}, got {}",
                MIN_SAMPLE_RATE, MAX_SAMPLE_RATE, sample_rate
            )));
        }

        Ok(StreamHeader {
            sample_rate,
            total_frames,
            block_size: params.block_size() as u16,
            num_coeffs: params.num_coeffs() as u16,
            quant_bits: params.quant_bits(),
        })
    }

    /// check every field against its declared range
    pub fn validate(&self) -> CosaResult<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(CosaError::InvalidHeader {
                field: "sample_rate",
                value: self.sample_rate as u64,
            });
        }
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&(self.block_size as usize)) {
            return Err(CosaError::InvalidHeader {
                field: "block_size",
                value: self.block_size as u64,
            });
        }
        if self.num_coeffs < 1 || self.num_coeffs > self.block_size {
            return Err(CosaError::InvalidHeader {
                field: "num_coeffs",
                value: self.num_coeffs as u64,
            });
        }
        if !(MIN_QUANT_BITS..=MAX_QUANT_BITS).contains(&self.quant_bits) {
            return Err(CosaError::InvalidHeader {
                field: "quant_bits",
                value: self.quant_bits as u64,
            });
        }
        Ok(())
    }

    /// the codec parameters this header describes
    pub fn params(&self) -> CosaResult<CodecParams> {
        self.validate()?;
        CodecParams::new(
            self.block_size as usize,
            self.num_coeffs as usize,
            self.quant_bits,
        )
    }

    /// number of block records following the header
    pub fn block_count(&self) -> u64 {
        if self.block_size == 0 {
            return 0;
        }
        self.total_frames.div_ceil(self.block_size as u64)
    }

    /// exact stream length in bytes, including the zero padding
    ///
    /// Saturates at `u64::MAX` for frame counts no real stream could hold.
    pub fn stream_bytes(&self) -> u64 {
        let block_bits =
            SCALE_FACTOR_BITS as u128 + self.num_coeffs as u128 * self.quant_bits as u128;
        let total_bits = HEADER_BITS as u128 + self.block_count() as u128 * block_bits;
        u64::try_from(total_bits.div_ceil(8)).unwrap_or(u64::MAX)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_frames as f64 / self.sample_rate as f64
    }
}

/// what a finished encode run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeStats {
    pub blocks: u64,
    pub frames: u64,
    pub coefficients: u64,
    pub bytes_written: u64,
}

/// what a finished decode run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeStats {
    pub blocks: u64,
    pub frames: u64,
}
