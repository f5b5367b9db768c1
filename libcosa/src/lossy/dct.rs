// DCT-II / DCT-III through a 2N-point complex FFT: mirror the block,
// transform, rotate.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// A fixed-length real transform pair
///
/// Both directions work in place on a buffer of exactly `len()` values.
/// Neither direction normalizes; the codec applies its own scaling.
///
/// # Panics
///
/// `forward` and `inverse` panic when the buffer length differs from `len()`.
pub trait Transform: Send + Sync {
    /// Buffer length this plan was built for
    fn len(&self) -> usize;

    /// Forward transform (analysis)
    fn forward(&self, buffer: &mut [f64]);

    /// Inverse transform (synthesis)
    fn inverse(&self, buffer: &mut [f64]);
}

/// Unnormalized DCT-II forward / DCT-III inverse
///
/// forward: `Y[k] = 2 * sum_n x[n] * cos(pi * k * (2n + 1) / 2N)`
///
/// inverse: `x[n] = X[0] + 2 * sum_{k>=1} X[k] * cos(pi * k * (2n + 1) / 2N)`
///
/// so `inverse(forward(x)) == 2N * x`.
pub struct Dct {
    /// Block length (N)
    n: usize,
    /// Forward FFT of size 2N
    fft_forward: Arc<dyn Fft<f64>>,
    /// Inverse FFT of size 2N
    fft_inverse: Arc<dyn Fft<f64>>,
    /// Twiddle factors: e^(i*pi*k / 2N), k in 0..N
    twiddle: Vec<Complex<f64>>,
}

impl Dct {
    /// Plan a DCT of length `n` with a fresh FFT planner
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self::with_planner(n, &mut planner)
    }

    fn with_planner(n: usize, planner: &mut FftPlanner<f64>) -> Self {
        assert!(n > 0, "DCT length must be non-zero");

        let fft_forward = planner.plan_fft_forward(2 * n);
        let fft_inverse = planner.plan_fft_inverse(2 * n);

        let twiddle = (0..n)
            .map(|k| {
                let theta = PI * k as f64 / (2 * n) as f64;
                Complex::new(theta.cos(), theta.sin())
            })
            .collect();

        Self {
            n,
            fft_forward,
            fft_inverse,
            twiddle,
        }
    }
}

impl Transform for Dct {
    fn len(&self) -> usize {
        self.n
    }

    fn forward(&self, buffer: &mut [f64]) {
        let n = self.n;
        assert_eq!(buffer.len(), n, "buffer length does not match DCT plan");

        // even-symmetric extension: x[0..N] followed by x[N-1..=0]
        let mut z: Vec<Complex<f64>> = buffer
            .iter()
            .chain(buffer.iter().rev())
            .map(|&x| Complex::new(x, 0.0))
            .collect();

        self.fft_forward.process(&mut z);

        // V[k] = e^(i*pi*k/2N) * Y[k], undo the rotation
        for (k, y) in buffer.iter_mut().enumerate() {
            *y = (z[k] * self.twiddle[k].conj()).re;
        }
    }

    fn inverse(&self, buffer: &mut [f64]) {
        let n = self.n;
        assert_eq!(buffer.len(), n, "buffer length does not match DCT plan");

        // Hermitian spectrum: Z[k] = X[k] * e^(i*pi*k/2N), Z[N] = 0, Z[2N-k] = conj(Z[k])
        let mut z = vec![Complex::new(0.0, 0.0); 2 * n];
        for k in 0..n {
            z[k] = self.twiddle[k] * buffer[k];
        }
        for k in 1..n {
            z[2 * n - k] = z[k].conj();
        }

        self.fft_inverse.process(&mut z);

        for (x, v) in buffer.iter_mut().zip(z.iter()) {
            *x = v.re;
        }
    }
}

impl fmt::Debug for Dct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dct").field("n", &self.n).finish()
    }
}

/// Hands out one shared plan per block length
pub struct DctPlanner {
    fft: FftPlanner<f64>,
    plans: HashMap<usize, Arc<Dct>>,
}

impl DctPlanner {
    pub fn new() -> Self {
        Self {
            fft: FftPlanner::new(),
            plans: HashMap::new(),
        }
    }

    /// Plan for length `n`, built on first request and reused afterwards
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn plan(&mut self, n: usize) -> Arc<Dct> {
        if let Some(plan) = self.plans.get(&n) {
            return Arc::clone(plan);
        }

        let plan = Arc::new(Dct::with_planner(n, &mut self.fft));
        self.plans.insert(n, Arc::clone(&plan));
        plan
    }

    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }
}

impl Default for DctPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_dct2(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                2.0 * x
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| v * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
                    .sum::<f64>()
            })
            .collect()
    }

    fn direct_dct3(y: &[f64]) -> Vec<f64> {
        let n = y.len();
        (0..n)
            .map(|i| {
                y[0] + 2.0
                    * (1..n)
                        .map(|k| {
                            y[k] * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos()
                        })
                        .sum::<f64>()
            })
            .collect()
    }

    fn test_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (i as f64 * 0.37).sin() * 0.6 + (i as f64 * 0.05).cos() * 0.3)
            .collect()
    }

    #[test]
    fn forward_matches_direct_sum() {
        for &n in &[64usize, 100, 128] {
            let x = test_signal(n);
            let expected = direct_dct2(&x);

            let mut buf = x.clone();
            Dct::new(n).forward(&mut buf);

            for (a, b) in buf.iter().zip(expected.iter()) {
                assert!((a - b).abs() < 1e-9, "n={}: {} vs {}", n, a, b);
            }
        }
    }

    #[test]
    fn inverse_matches_direct_sum() {
        let n = 64;
        let y = test_signal(n);
        let expected = direct_dct3(&y);

        let mut buf = y.clone();
        Dct::new(n).inverse(&mut buf);

        for (a, b) in buf.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }

    #[test]
    fn round_trip_scales_by_2n() {
        let n = 256;
        let x = test_signal(n);
        let dct = Dct::new(n);

        let mut buf = x.clone();
        dct.forward(&mut buf);
        dct.inverse(&mut buf);

        let scale = 2.0 * n as f64;
        for (orig, back) in x.iter().zip(buf.iter()) {
            assert!((orig - back / scale).abs() < 1e-12);
        }
    }

    #[test]
    fn planner_reuses_plans() {
        let mut planner = DctPlanner::new();
        let a = planner.plan(1024);
        let b = planner.plan(1024);
        let c = planner.plan(512);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(c.len(), 512);
        assert_eq!(planner.cached_plans(), 2);
    }

    #[test]
    #[should_panic(expected = "DCT length must be non-zero")]
    fn zero_length_plan_panics() {
        DctPlanner::new().plan(0);
    }

    #[test]
    #[should_panic(expected = "buffer length does not match DCT plan")]
    fn forward_rejects_wrong_length() {
        let mut buf = vec![0.0; 63];
        Dct::new(64).forward(&mut buf);
    }

    #[test]
    #[should_panic(expected = "buffer length does not match DCT plan")]
    fn inverse_rejects_wrong_length() {
        let mut buf = vec![0.0; 65];
        Dct::new(64).inverse(&mut buf);
    }
}
