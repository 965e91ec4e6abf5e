use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps a forward/inverse `rustfft` plan pair of one size.
pub struct FftHelper {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            forward,
            inverse,
            size,
        }
    }

    /// Zero-pads `input` to the plan size and transforms it.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::zero());
        self.forward.process(&mut buffer);
        buffer
    }

    /// Inverse transform, normalised by the plan size.
    pub fn inverse(&self, mut spectrum: Vec<Complex64>) -> Vec<Complex64> {
        spectrum.resize(self.size, Complex64::zero());
        self.inverse.process(&mut spectrum);
        let scale = 1.0 / self.size as f64;
        spectrum.iter_mut().for_each(|value| *value *= scale);
        spectrum
    }

    /// Full linear convolution of two real sequences through the frequency
    /// domain. The output has `lhs.len() + rhs.len() - 1` samples.
    pub fn convolve(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
        if lhs.is_empty() || rhs.is_empty() {
            return Vec::new();
        }
        let output_len = lhs.len() + rhs.len() - 1;
        let helper = FftHelper::new(output_len.next_power_of_two());
        let lhs_spectrum = helper.forward(lhs);
        let rhs_spectrum = helper.forward(rhs);
        let product = lhs_spectrum
            .iter()
            .zip(rhs_spectrum.iter())
            .map(|(a, b)| a * b)
            .collect();
        helper
            .inverse(product)
            .into_iter()
            .take(output_len)
            .map(|value| value.re)
            .collect()
    }
}
