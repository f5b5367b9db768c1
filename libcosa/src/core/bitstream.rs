//! Bit-level channel over byte streams
//!
//! Values are packed most-significant-bit first with no alignment between
//! fields. The writer buffers one partial byte; the reader keeps one byte
//! of lookahead. Neither side knows what the bits mean.

use std::io::{ErrorKind, Read, Write};

use super::error::{CosaError, CosaResult};

const MAX_WIDTH: u32 = 64;

#[inline]
fn check_width(width: u32) -> CosaResult<()> {
    if width == 0 || width > MAX_WIDTH {
        return Err(CosaError::InvalidBitWidth(width));
    }
    Ok(())
}

/// Bit-level writer
pub struct BitWriter<W: Write> {
    inner: W,
    current_byte: u8,
    /// bits already placed in `current_byte` (0-7)
    bit_pos: u32,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        BitWriter {
            inner,
            current_byte: 0,
            bit_pos: 0,
            bits_written: 0,
        }
    }

    /// append the `width` low bits of `value`, msb first
    pub fn write_bits(&mut self, value: u64, width: u32) -> CosaResult<()> {
        check_width(width)?;

        let mut remaining = width;
        while remaining > 0 {
            let available = 8 - self.bit_pos;
            let take = remaining.min(available);
            let shift = remaining - take;
            let bits = ((value >> shift) & ((1u64 << take) - 1)) as u8;

            self.current_byte |= bits << (available - take);
            self.bit_pos += take;
            remaining -= take;

            if self.bit_pos == 8 {
                self.inner.write_all(&[self.current_byte])?;
                self.current_byte = 0;
                self.bit_pos = 0;
            }
        }

        self.bits_written += width as u64;
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> CosaResult<()> {
        self.write_bits(bit as u64, 1)
    }

    /// exact 32-bit pattern of an f32
    pub fn write_f32(&mut self, value: f32) -> CosaResult<()> {
        self.write_bits(value.to_bits() as u64, 32)
    }

    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// zero-pad the trailing byte, flush, and hand back the inner writer
    pub fn finish(mut self) -> CosaResult<W> {
        if self.bit_pos > 0 {
            self.inner.write_all(&[self.current_byte])?;
            self.current_byte = 0;
            self.bit_pos = 0;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Bit-level reader
pub struct BitReader<R: Read> {
    inner: R,
    current_byte: u8,
    /// bits still unread in `current_byte` (0-8)
    bits_left: u32,
    bits_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        BitReader {
            inner,
            current_byte: 0,
            bits_left: 0,
            bits_read: 0,
        }
    }

    fn refill(&mut self) -> CosaResult<()> {
        let mut byte = [0u8; 1];
        match self.inner.read_exact(&mut byte) {
            Ok(()) => {
                self.current_byte = byte[0];
                self.bits_left = 8;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(CosaError::Truncated {
                bits_read: self.bits_read,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// consume the next `width` bits, msb first
    pub fn read_bits(&mut self, width: u32) -> CosaResult<u64> {
        check_width(width)?;

        let mut value = 0u64;
        let mut remaining = width;
        while remaining > 0 {
            if self.bits_left == 0 {
                self.refill()?;
            }

            let take = remaining.min(self.bits_left);
            let shift = self.bits_left - take;
            let bits = (self.current_byte as u64 >> shift) & ((1u64 << take) - 1);

            // take <= 8, so the shift never overflows even for 64-bit reads
            value = (value << take) | bits;
            self.bits_left -= take;
            self.bits_read += take as u64;
            remaining -= take;
        }

        Ok(value)
    }

    pub fn read_bit(&mut self) -> CosaResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn read_f32(&mut self) -> CosaResult<f32> {
        Ok(f32::from_bits(self.read_bits(32)? as u32))
    }

    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
