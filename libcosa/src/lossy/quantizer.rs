//! Coefficient scaling and uniform quantization shared by both pipelines

use serde::{Deserialize, Serialize};

/// Below this the retained coefficients count as silence
pub const SILENCE_EPSILON: f64 = 1e-10;

/// One block as it travels on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Largest retained coefficient magnitude (1.0 for silent blocks)
    pub scale_factor: f32,
    /// One level per retained coefficient, in `0..=max_level`
    pub levels: Vec<u16>,
}

impl BlockRecord {
    pub fn new(num_coeffs: usize) -> Self {
        BlockRecord {
            scale_factor: 1.0,
            levels: vec![0; num_coeffs],
        }
    }
}

/// Per-coefficient factors that make the DCT energy-comparable
///
/// `sqrt(1/N)` for the DC term, `sqrt(2/N)` for the rest.
#[inline]
fn orthonormal_factors(block_size: usize) -> (f64, f64) {
    let n = block_size as f64;
    ((1.0 / n).sqrt(), (2.0 / n).sqrt())
}

/// Scale forward-transform output in place
pub fn apply_orthonormal_scaling(coeffs: &mut [f64], block_size: usize) {
    let (dc, ac) = orthonormal_factors(block_size);
    if let Some((first, rest)) = coeffs.split_first_mut() {
        *first *= dc;
        for c in rest {
            *c *= ac;
        }
    }
}

/// Undo [`apply_orthonormal_scaling`] on the first `num_coeffs` entries
///
/// Entries past `num_coeffs` are zero-filled and left untouched.
pub fn remove_orthonormal_scaling(coeffs: &mut [f64], block_size: usize, num_coeffs: usize) {
    let (dc, ac) = orthonormal_factors(block_size);
    let end = num_coeffs.min(coeffs.len());
    if let Some((first, rest)) = coeffs[..end].split_first_mut() {
        *first /= dc;
        for c in rest {
            *c /= ac;
        }
    }
}

/// Max absolute retained coefficient, or 1.0 when the block is silent
///
/// Narrowed to f32 here because that is what goes on the wire, and the
/// encoder must quantize against the same value the decoder will read.
pub fn scale_factor(retained: &[f64]) -> f32 {
    let max = retained.iter().fold(0.0f64, |m, &c| m.max(c.abs()));
    if max < SILENCE_EPSILON {
        1.0
    } else {
        max as f32
    }
}

/// Map a coefficient to its level in `0..=max_level`
#[inline]
pub fn quantize(coeff: f64, scale_factor: f64, max_level: u32) -> u16 {
    let normalized = coeff / scale_factor;
    let level = ((normalized + 1.0) * max_level as f64 / 2.0).round();
    level.clamp(0.0, max_level as f64) as u16
}

/// Reconstruct a coefficient from its level
#[inline]
pub fn dequantize(level: u16, scale_factor: f64, max_level: u32) -> f64 {
    let normalized = level as f64 * 2.0 / max_level as f64 - 1.0;
    normalized * scale_factor
}

/// Quantize every retained coefficient of a block
pub fn quantize_block(retained: &[f64], max_level: u32, record: &mut BlockRecord) {
    let sf = scale_factor(retained);
    record.scale_factor = sf;
    record.levels.clear();
    record
        .levels
        .extend(retained.iter().map(|&c| quantize(c, sf as f64, max_level)));
}

/// Dequantize a record into the head of `coeffs` and zero the tail
pub fn dequantize_block(record: &BlockRecord, max_level: u32, coeffs: &mut [f64]) {
    let sf = record.scale_factor as f64;
    let n = record.levels.len().min(coeffs.len());
    for (c, &level) in coeffs[..n].iter_mut().zip(record.levels.iter()) {
        *c = dequantize(level, sf, max_level);
    }
    coeffs[n..].fill(0.0);
}
