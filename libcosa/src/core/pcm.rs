//! mono pcm16 sources and sinks feeding the pipelines

use super::error::CosaResult;

/// where the encoder pulls samples from
pub trait PcmSource {
    fn sample_rate(&self) -> u32;

    /// frames this source promises to deliver
    fn total_frames(&self) -> u64;

    /// fill up to `buf.len()` frames, returning how many were written;
    /// 0 means the source is exhausted
    fn read_frames(&mut self, buf: &mut [i16]) -> CosaResult<usize>;
}

/// where the decoder pushes reconstructed samples
pub trait PcmSink {
    fn write_frames(&mut self, frames: &[i16]) -> CosaResult<()>;
}

impl PcmSink for Vec<i16> {
    fn write_frames(&mut self, frames: &[i16]) -> CosaResult<()> {
        self.extend_from_slice(frames);
        Ok(())
    }
}

/// in-memory source over a borrowed sample slice
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    samples: &'a [i16],
    sample_rate: u32,
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(samples: &'a [i16], sample_rate: u32) -> Self {
        SliceSource {
            samples,
            sample_rate,
            pos: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.pos
    }
}

impl PcmSource for SliceSource<'_> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_frames(&self) -> u64 {
        self.samples.len() as u64
    }

    fn read_frames(&mut self, buf: &mut [i16]) -> CosaResult<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
