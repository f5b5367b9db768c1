use std::io::Write;
use std::sync::Arc;

use log::{debug, info, trace};

use super::dct::{Dct, Transform};
use super::quantizer::{apply_orthonormal_scaling, quantize_block, BlockRecord};
use crate::core::{
    i16_to_f64, BitWriter, CodecParams, CosaError, CosaResult, EncodeStats, PcmSource,
    StreamHeader,
};
use crate::writer::{write_block, write_header};

/// How often the pipeline reports progress
const PROGRESS_INTERVAL: u64 = 100;

/// Block DCT encoder
///
/// Owns one block of working buffers, reused for every block of a run.
pub struct Encoder {
    params: CodecParams,
    /// DCT plan for `params.block_size()`
    transform: Arc<dyn Transform>,
    /// pcm read buffer
    pcm: Vec<i16>,
    /// time samples in, transform coefficients out
    block: Vec<f64>,
    /// last quantized block
    record: BlockRecord,
}

impl Encoder {
    /// Create an encoder with its own DCT plan
    pub fn new(params: CodecParams) -> Self {
        let transform = Arc::new(Dct::new(params.block_size()));
        Self::build(params, transform)
    }

    /// Create an encoder around an existing transform plan
    pub fn with_transform(params: CodecParams, transform: Arc<dyn Transform>) -> CosaResult<Self> {
        if transform.len() != params.block_size() {
            return Err(CosaError::InvalidParameter(format!(
                "transform length {} does not match block size {}",
                transform.len(),
                params.block_size()
            )));
        }
        Ok(Self::build(params, transform))
    }

    fn build(params: CodecParams, transform: Arc<dyn Transform>) -> Self {
        let block_size = params.block_size();
        Self {
            params,
            transform,
            pcm: vec![0; block_size],
            block: vec![0.0; block_size],
            record: BlockRecord::new(params.num_coeffs()),
        }
    }

    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Transform and quantize one block of at most `block_size` samples
    ///
    /// Short blocks are zero-padded.
    pub fn encode_block(&mut self, samples: &[i16]) -> CosaResult<&BlockRecord> {
        let block_size = self.params.block_size();
        if samples.len() > block_size {
            return Err(CosaError::InvalidParameter(format!(
                "block of {} samples exceeds block size {}",
                samples.len(),
                block_size
            )));
        }

        load_block(&mut self.block, samples);
        self.transform_and_quantize();

        Ok(&self.record)
    }

    fn transform_and_quantize(&mut self) {
        self.transform.forward(&mut self.block);
        apply_orthonormal_scaling(&mut self.block, self.params.block_size());

        let retained = &self.block[..self.params.num_coeffs()];
        quantize_block(retained, self.params.max_level(), &mut self.record);
    }

    /// Run the whole pipeline: header, then one record per block
    ///
    /// Returns the inner writer after the final flush.
    pub fn encode<S, W>(&mut self, source: &mut S, out: W) -> CosaResult<(W, EncodeStats)>
    where
        S: PcmSource + ?Sized,
        W: Write,
    {
        let header = StreamHeader::new(source.sample_rate(), source.total_frames(), &self.params)?;
        let quant_bits = self.params.quant_bits();
        let block_size = self.params.block_size();

        debug!(
            "encoding {} frames at {} Hz: block size {}, {} coefficients, {} bits (expected ratio {:.2}:1)",
            header.total_frames,
            header.sample_rate,
            block_size,
            self.params.num_coeffs(),
            quant_bits,
            self.params.expected_compression_ratio()
        );

        let mut bits = BitWriter::new(out);
        write_header(&mut bits, &header)?;

        let mut stats = EncodeStats::default();
        while stats.frames < header.total_frames {
            let want = (header.total_frames - stats.frames).min(block_size as u64) as usize;

            // a source may hand out fewer frames per call than asked for
            let mut filled = 0;
            while filled < want {
                let n = source.read_frames(&mut self.pcm[filled..want])?;
                if n == 0 {
                    return Err(CosaError::SourceExhausted {
                        expected: header.total_frames,
                        actual: stats.frames + filled as u64,
                    });
                }
                filled += n;
            }

            load_block(&mut self.block, &self.pcm[..want]);
            self.transform_and_quantize();

            write_block(&mut bits, &self.record, quant_bits)?;
            trace!(
                "block {}: scale factor {:e}",
                stats.blocks,
                self.record.scale_factor
            );

            stats.blocks += 1;
            stats.frames += want as u64;
            stats.coefficients += self.record.levels.len() as u64;

            if stats.blocks % PROGRESS_INTERVAL == 0 {
                debug!("processed {} blocks...", stats.blocks);
            }
        }

        stats.bytes_written = bits.bits_written().div_ceil(8);
        let out = bits.finish()?;

        let ratio = if stats.bytes_written > 0 {
            (stats.frames * 2) as f64 / stats.bytes_written as f64
        } else {
            0.0
        };
        info!(
            "encoded {} blocks, {} coefficients, {} bytes ({:.2}:1)",
            stats.blocks, stats.coefficients, stats.bytes_written, ratio
        );

        Ok((out, stats))
    }

    /// Encode an in-memory signal into a complete stream
    pub fn encode_to_vec(&mut self, samples: &[i16], sample_rate: u32) -> CosaResult<Vec<u8>> {
        let mut source = crate::core::SliceSource::new(samples, sample_rate);
        let (bytes, _) = self.encode(&mut source, Vec::new())?;
        Ok(bytes)
    }
}

/// normalize pcm into the block buffer, zero-padding the tail
fn load_block(block: &mut [f64], samples: &[i16]) {
    for (dst, &s) in block.iter_mut().zip(samples.iter()) {
        *dst = i16_to_f64(s);
    }
    block[samples.len()..].fill(0.0);
}
