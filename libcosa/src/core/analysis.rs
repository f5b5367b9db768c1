//! Signal comparison for cosa round trips

use serde::{Deserialize, Serialize};

use super::error::{CosaError, CosaResult};

/// error between an original signal and its processed version
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Mean squared error, in squared pcm16 units
    pub mse: f64,
    /// Largest absolute sample difference
    pub max_abs_error: f64,
    /// Signal-to-noise ratio in dB (`inf` for identical signals)
    pub snr_db: f64,
    pub num_samples: usize,
}

impl ErrorMetrics {
    pub fn is_identical(&self) -> bool {
        self.mse == 0.0
    }

    /// rough verbal rating of the snr, used by the cli
    pub fn quality_label(&self) -> &'static str {
        match self.snr_db {
            s if s.is_infinite() => "identical",
            s if s >= 40.0 => "excellent",
            s if s >= 30.0 => "good",
            s if s >= 20.0 => "fair",
            s if s >= 10.0 => "poor",
            _ => "very poor",
        }
    }
}

/// compare two mono pcm16 signals sample-by-sample
pub fn compare(original: &[i16], processed: &[i16]) -> CosaResult<ErrorMetrics> {
    if original.len() != processed.len() {
        return Err(CosaError::LengthMismatch {
            left: original.len(),
            right: processed.len(),
        });
    }

    if original.is_empty() {
        return Ok(ErrorMetrics {
            mse: 0.0,
            max_abs_error: 0.0,
            snr_db: f64::INFINITY,
            num_samples: 0,
        });
    }

    let mut squared_error = 0.0f64;
    let mut signal_power = 0.0f64;
    let mut max_abs_error = 0.0f64;

    for (&o, &p) in original.iter().zip(processed.iter()) {
        let error = o as f64 - p as f64;
        squared_error += error * error;
        max_abs_error = max_abs_error.max(error.abs());
        signal_power += o as f64 * o as f64;
    }

    let n = original.len() as f64;
    let mse = squared_error / n;
    let snr_db = if mse > 0.0 {
        10.0 * ((signal_power / n) / mse).log10()
    } else {
        f64::INFINITY
    };

    Ok(ErrorMetrics {
        mse,
        max_abs_error,
        snr_db,
        num_samples: original.len(),
    })
}
