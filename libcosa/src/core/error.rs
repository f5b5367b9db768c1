//! error type shared by every cosa component

use thiserror::Error;

/// everything that can go wrong while encoding or decoding a cosa stream
#[derive(Debug, Error)]
pub enum CosaError {
    /// header field outside its valid range
    #[error("invalid stream header: {field} = {value} is out of range")]
    InvalidHeader { field: &'static str, value: u64 },

    /// the byte source ran out before a read completed
    #[error("truncated stream: ran out of data after {bits_read} bits")]
    Truncated { bits_read: u64 },

    /// encoder configuration rejected before processing
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// bit channel asked to move 0 or more than 64 bits
    #[error("invalid bit width {0} (expected 1..=64)")]
    InvalidBitWidth(u32),

    /// pcm source produced fewer frames than it declared
    #[error("pcm source exhausted after {actual} of {expected} frames")]
    SourceExhausted { expected: u64, actual: u64 },

    /// two signals that should be compared sample-by-sample differ in length
    #[error("signal lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// result type for cosa stuff
pub type CosaResult<T> = Result<T, CosaError>;
