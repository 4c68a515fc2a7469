//! Cascaded second-order sections.
//!
//! A filter is stored as a product of biquads rather than one high-order
//! polynomial so narrow bands keep well-conditioned coefficients.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One biquad stage: `b0 + b1 z^-1 + b2 z^-2` over `1 + a1 z^-1 + a2 z^-2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biquad {
    /// Numerator coefficients
    pub b: [f64; 3],
    /// Denominator coefficients, `a[0]` is always 1
    pub a: [f64; 3],
}

impl Biquad {
    /// Build a stage from numerator and normalized denominator coefficients.
    pub fn new(b: [f64; 3], a1: f64, a2: f64) -> Self {
        Self {
            b,
            a: [1.0, a1, a2],
        }
    }

    /// Transfer function evaluated at `z^-1`.
    fn eval(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = self.a[0] + z_inv * self.a[1] + z_inv2 * self.a[2];
        num / den
    }

    /// Run this stage over `signal` in place, starting from rest.
    ///
    /// Direct form II transposed.
    fn run(&self, signal: &mut [f64]) {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let mut z1 = 0.0;
        let mut z2 = 0.0;

        for x in signal.iter_mut() {
            let input = *x;
            let output = b0 * input + z1;
            z1 = b1 * input - a1 * output + z2;
            z2 = b2 * input - a2 * output;
            *x = output;
        }
    }
}

/// A causal IIR filter as a cascade of biquads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosFilter {
    sections: Vec<Biquad>,
}

impl SosFilter {
    /// Create a filter from its stages, applied in order.
    pub fn new(sections: Vec<Biquad>) -> Self {
        Self { sections }
    }

    /// The stages of the cascade.
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Order of the overall transfer function (two per stage).
    pub fn order(&self) -> usize {
        self.sections.len() * 2
    }

    /// Filter `input` forward in a single pass.
    ///
    /// Output has the same length as the input and starts from zero state,
    /// so the leading samples carry the startup transient.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut output = input.to_vec();
        for section in &self.sections {
            section.run(&mut output);
        }
        output
    }

    /// Complex frequency response at `freq_hz` for sampling rate `fs`.
    pub fn response_at(&self, freq_hz: f64, fs: f64) -> Complex64 {
        let omega = 2.0 * PI * freq_hz / fs;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.eval(z_inv))
    }

    /// Magnitude response at `freq_hz` for sampling rate `fs`.
    pub fn gain_at(&self, freq_hz: f64, fs: f64) -> f64 {
        self.response_at(freq_hz, fs).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn moving_average() -> SosFilter {
        // y[n] = (x[n] + x[n-1]) / 2
        SosFilter::new(vec![Biquad::new([0.5, 0.5, 0.0], 0.0, 0.0)])
    }

    #[test]
    fn test_apply_preserves_length() {
        let filter = moving_average();
        let input = vec![1.0; 17];
        assert_eq!(filter.apply(&input).len(), 17);
        assert!(filter.apply(&[]).is_empty());
    }

    #[test]
    fn test_apply_starts_from_rest() {
        let filter = moving_average();
        let output = filter.apply(&[2.0, 2.0, 4.0]);
        assert_eq!(output, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_recursive_section() {
        // y[n] = x[n] + 0.5 y[n-1], impulse response 1, 0.5, 0.25, ...
        let filter = SosFilter::new(vec![Biquad::new([1.0, 0.0, 0.0], -0.5, 0.0)]);
        let output = filter.apply(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(output, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_cascade_applies_every_section() {
        let single = moving_average();
        let double = SosFilter::new(vec![single.sections()[0], single.sections()[0]]);
        assert_eq!(double.order(), 4);

        let output = double.apply(&[4.0, 0.0, 0.0, 0.0]);
        assert_eq!(output, vec![1.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_response_of_moving_average() {
        let filter = moving_average();
        assert_abs_diff_eq!(filter.gain_at(0.0, 100.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(filter.gain_at(50.0, 100.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            filter.gain_at(25.0, 100.0),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-12
        );
    }
}
