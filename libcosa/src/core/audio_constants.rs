/// Maximum positive value for 16-bit signed integer (2^15 - 1)
pub const I16_MAX_F64: f64 = 32767.0;

/// Minimum value for 16-bit signed integer (-2^15)
pub const I16_MIN_F64: f64 = -32768.0;

/// Full-scale divisor used to normalize pcm16 into [-1, 1]
pub const PCM_FULL_SCALE: f64 = 32768.0;

/// Convert i16 sample to normalized f64
#[inline]
pub fn i16_to_f64(sample: i16) -> f64 {
    sample as f64 / PCM_FULL_SCALE
}

/// Convert normalized f64 to i16, clamping before rounding so it never wraps
#[inline]
pub fn f64_to_i16(sample: f64) -> i16 {
    (sample * PCM_FULL_SCALE)
        .clamp(I16_MIN_F64, I16_MAX_F64)
        .round() as i16
}
