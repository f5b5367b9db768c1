use std::io::Read;
use std::sync::Arc;

use log::{debug, info};

use super::dct::{Dct, Transform};
use super::quantizer::{dequantize_block, remove_orthonormal_scaling, BlockRecord};
use crate::core::{
    f64_to_i16, BitReader, CosaError, CosaResult, DecodeStats, PcmSink, StreamHeader,
};
use crate::reader::{read_block as read_record, read_header};

/// How often the pipeline reports progress
const PROGRESS_INTERVAL: u64 = 100;

/// Block DCT decoder
///
/// Built from a validated header; owns one block of working buffers.
pub struct Decoder {
    header: StreamHeader,
    /// DCT plan for `header.block_size`
    transform: Arc<dyn Transform>,
    max_level: u32,
    /// dequantized coefficients in, time samples out
    block: Vec<f64>,
    /// reconstructed pcm for the current block
    pcm: Vec<i16>,
    /// last record read from the stream
    record: BlockRecord,
}

impl Decoder {
    /// Create a decoder with its own DCT plan
    pub fn new(header: StreamHeader) -> CosaResult<Self> {
        header.validate()?;
        let transform = Arc::new(Dct::new(header.block_size as usize));
        Self::build(header, transform)
    }

    /// Create a decoder around an existing transform plan
    pub fn with_transform(
        header: StreamHeader,
        transform: Arc<dyn Transform>,
    ) -> CosaResult<Self> {
        header.validate()?;
        Self::build(header, transform)
    }

    fn build(header: StreamHeader, transform: Arc<dyn Transform>) -> CosaResult<Self> {
        let params = header.params()?;
        if transform.len() != params.block_size() {
            return Err(CosaError::InvalidParameter(format!(
                "transform length {} does not match block size {}",
                transform.len(),
                params.block_size()
            )));
        }

        Ok(Self {
            header,
            transform,
            max_level: params.max_level(),
            block: vec![0.0; params.block_size()],
            pcm: vec![0; params.block_size()],
            record: BlockRecord::new(params.num_coeffs()),
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// Reconstruct a full block of `block_size` samples from one record
    pub fn decode_block(&mut self, record: &BlockRecord) -> CosaResult<&[i16]> {
        if record.levels.len() != self.header.num_coeffs as usize {
            return Err(CosaError::InvalidParameter(format!(
                "record has {} levels, stream expects {}",
                record.levels.len(),
                self.header.num_coeffs
            )));
        }

        dequantize_block(record, self.max_level, &mut self.block);
        self.synthesize();
        Ok(&self.pcm)
    }

    /// the current `block` holds dequantized coefficients; turn them into pcm
    fn synthesize(&mut self) {
        let block_size = self.header.block_size as usize;
        remove_orthonormal_scaling(&mut self.block, block_size, self.header.num_coeffs as usize);

        self.transform.inverse(&mut self.block);

        // DCT-III of a DCT-II output carries a factor of 2N
        let scale = 1.0 / (2.0 * block_size as f64);
        for (out, &v) in self.pcm.iter_mut().zip(self.block.iter()) {
            *out = f64_to_i16(v * scale);
        }
    }

    /// Read one record from `bits` and reconstruct it
    pub fn read_block<R: Read>(&mut self, bits: &mut BitReader<R>) -> CosaResult<&[i16]> {
        read_record(bits, &self.header, &mut self.record)?;
        dequantize_block(&self.record, self.max_level, &mut self.block);
        self.synthesize();
        Ok(&self.pcm)
    }

    /// Decode every block after the header, stopping at `total_frames`
    ///
    /// `bits` must be positioned right after the header this decoder was
    /// built from.
    pub fn decode_blocks<R, S>(
        &mut self,
        bits: &mut BitReader<R>,
        sink: &mut S,
    ) -> CosaResult<DecodeStats>
    where
        R: Read,
        S: PcmSink + ?Sized,
    {
        let total = self.header.total_frames;
        let block_size = self.header.block_size as u64;
        let mut stats = DecodeStats::default();

        while stats.frames < total {
            let emit = (total - stats.frames).min(block_size) as usize;
            let pcm = self.read_block(bits)?;
            sink.write_frames(&pcm[..emit])?;

            stats.blocks += 1;
            stats.frames += emit as u64;

            if stats.blocks % PROGRESS_INTERVAL == 0 {
                debug!(
                    "decoded {} blocks ({:.2} seconds)...",
                    stats.blocks,
                    stats.frames as f64 / self.header.sample_rate as f64
                );
            }
        }

        Ok(stats)
    }

    /// Run the whole pipeline: header, then blocks until `total_frames`
    pub fn decode<R, S>(input: R, sink: &mut S) -> CosaResult<(StreamHeader, DecodeStats)>
    where
        R: Read,
        S: PcmSink + ?Sized,
    {
        let mut bits = BitReader::new(input);
        let header = read_header(&mut bits)?;

        debug!(
            "decoding {} frames at {} Hz: block size {}, {} coefficients, {} bits",
            header.total_frames,
            header.sample_rate,
            header.block_size,
            header.num_coeffs,
            header.quant_bits
        );

        let mut decoder = Decoder::new(header)?;
        let stats = decoder.decode_blocks(&mut bits, sink)?;

        info!("decoded {} blocks, {} frames", stats.blocks, stats.frames);
        Ok((header, stats))
    }
}
