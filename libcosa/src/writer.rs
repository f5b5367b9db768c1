use std::io::Write;

use crate::core::{
    BitWriter, CosaResult, StreamHeader, BLOCK_SIZE_BITS, NUM_COEFFS_BITS, QUANT_BITS_BITS,
    SAMPLE_RATE_BITS, TOTAL_FRAMES_BITS,
};
use crate::lossy::BlockRecord;

/// write the fixed-layout stream header
pub fn write_header<W: Write>(bits: &mut BitWriter<W>, header: &StreamHeader) -> CosaResult<()> {
    bits.write_bits(header.sample_rate as u64, SAMPLE_RATE_BITS)?;
    bits.write_bits(header.total_frames, TOTAL_FRAMES_BITS)?;
    bits.write_bits(header.block_size as u64, BLOCK_SIZE_BITS)?;
    bits.write_bits(header.num_coeffs as u64, NUM_COEFFS_BITS)?;
    bits.write_bits(header.quant_bits as u64, QUANT_BITS_BITS)?;
    Ok(())
}

/// write one block: scale factor pattern, then `quant_bits`-wide levels
pub fn write_block<W: Write>(
    bits: &mut BitWriter<W>,
    record: &BlockRecord,
    quant_bits: u8,
) -> CosaResult<()> {
    bits.write_f32(record.scale_factor)?;
    for &level in &record.levels {
        bits.write_bits(level as u64, quant_bits as u32)?;
    }
    Ok(())
}
