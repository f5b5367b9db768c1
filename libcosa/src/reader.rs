use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::core::{
    BitReader, CosaResult, StreamHeader, BLOCK_SIZE_BITS, NUM_COEFFS_BITS, QUANT_BITS_BITS,
    SAMPLE_RATE_BITS, TOTAL_FRAMES_BITS,
};
use crate::lossy::BlockRecord;

/// read and validate the stream header
///
/// Range violations are reported before anything past the header is touched.
pub fn read_header<R: Read>(bits: &mut BitReader<R>) -> CosaResult<StreamHeader> {
    let header = StreamHeader {
        sample_rate: bits.read_bits(SAMPLE_RATE_BITS)? as u32,
        total_frames: bits.read_bits(TOTAL_FRAMES_BITS)?,
        block_size: bits.read_bits(BLOCK_SIZE_BITS)? as u16,
        num_coeffs: bits.read_bits(NUM_COEFFS_BITS)? as u16,
        quant_bits: bits.read_bits(QUANT_BITS_BITS)? as u8,
    };
    header.validate()?;
    Ok(header)
}

/// read one block record laid out by `header`
pub fn read_block<R: Read>(
    bits: &mut BitReader<R>,
    header: &StreamHeader,
    record: &mut BlockRecord,
) -> CosaResult<()> {
    record.scale_factor = bits.read_f32()?;
    record.levels.clear();
    for _ in 0..header.num_coeffs {
        record
            .levels
            .push(bits.read_bits(header.quant_bits as u32)? as u16);
    }
    Ok(())
}

/// summary of an in-memory cosa stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub header: StreamHeader,
    pub block_count: u64,
    pub duration_secs: f64,
    /// bytes a complete stream with this header occupies
    pub expected_size: u64,
    /// bytes actually present
    pub file_size: usize,
    /// pcm16 size over stream size
    pub compression_ratio: f64,
    /// every block is present
    pub complete: bool,
}

/// header-level inspection of cosa streams
pub struct Reader;

impl Reader {
    /// new reader
    pub fn new() -> Self {
        Reader
    }

    /// parse the header and derive stream info without decoding blocks
    pub fn info(&self, data: &[u8]) -> CosaResult<StreamInfo> {
        let mut bits = BitReader::new(data);
        let header = read_header(&mut bits)?;

        let expected_size = header.stream_bytes();
        let pcm_size = header.total_frames as f64 * 2.0;
        let compression_ratio = if data.is_empty() {
            0.0
        } else {
            pcm_size / data.len() as f64
        };

        Ok(StreamInfo {
            header,
            block_count: header.block_count(),
            duration_secs: header.duration_secs(),
            expected_size,
            file_size: data.len(),
            compression_ratio,
            complete: data.len() as u64 >= expected_size,
        })
    }

    /// true when the header is valid and every block is present
    pub fn validate(&self, data: &[u8]) -> CosaResult<bool> {
        Ok(self.info(data)?.complete)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}
