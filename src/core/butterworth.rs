//! Digital Butterworth bandpass design in second-order sections.
//!
//! Design path:
//! 1. Analog lowpass prototype poles on the unit circle
//! 2. Prewarp the band edges and transform lowpass to bandpass
//! 3. Bilinear transform into the z-plane
//! 4. Pair conjugate poles into biquads, zeros at +1 and -1
//!
//! Cutoffs are normalized to Nyquist, so the bilinear transform runs at
//! `fs = 2`.

use crate::core::sos::{Biquad, SosFilter};
use crate::error::AnalysisError;
use num_complex::Complex64;
use std::f64::consts::PI;

/// `2 * fs` for the normalized sampling rate of 2.
const BILINEAR_K: f64 = 4.0;

/// Imaginary parts below this are treated as real poles.
const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Highest prototype order accepted. Past this the cascade gain underflows
/// for narrow bands and the pole pairing loses precision.
pub const MAX_FILTER_ORDER: usize = 16;

/// Design a bandpass of prototype order `order` between normalized cutoffs.
///
/// The resulting cascade has `order` sections (overall order `2 * order`),
/// unit gain at the band center and -3 dB at both cutoffs.
pub fn bandpass(order: usize, low: f64, high: f64) -> Result<SosFilter, AnalysisError> {
    if !(1..=MAX_FILTER_ORDER).contains(&order) {
        return Err(AnalysisError::InvalidParameter {
            name: "order",
            value: order as f64,
            reason: "must be between 1 and 16",
        });
    }
    if !(low > 0.0 && low < high && high < 1.0) {
        return Err(AnalysisError::InvalidBandSpecification {
            target_freq: (low + high) / 2.0,
            bandwidth: high - low,
            fs: 2.0,
            low,
            high,
        });
    }

    let warped_low = prewarp(low);
    let warped_high = prewarp(high);
    let bandwidth = warped_high - warped_low;
    let center = (warped_low * warped_high).sqrt();

    let analog_poles = lowpass_to_bandpass(&prototype_poles(order), bandwidth, center);

    // The analog bandpass has `order` zeros at s = 0 and gain bandwidth^order.
    let analog_gain = bandwidth.powi(order as i32);
    let pole_product = analog_poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (BILINEAR_K - p));
    let digital_gain = analog_gain * (BILINEAR_K.powi(order as i32) / pole_product).re;
    if !(digital_gain.is_finite() && digital_gain > 0.0) {
        return Err(AnalysisError::UnstableFilter {
            order,
            low,
            high,
            gain: digital_gain,
        });
    }

    let digital_poles: Vec<Complex64> = analog_poles
        .iter()
        .map(|&p| (BILINEAR_K + p) / (BILINEAR_K - p))
        .collect();

    let mut denominators = pair_poles(&digital_poles);
    if denominators
        .iter()
        .any(|&(radius, a1, a2)| !(radius < 1.0 && a1.is_finite() && a2.is_finite()))
    {
        return Err(AnalysisError::UnstableFilter {
            order,
            low,
            high,
            gain: digital_gain,
        });
    }
    // Poles nearest the unit circle go last.
    denominators.sort_by(|a, b| a.0.total_cmp(&b.0));

    let sections = denominators
        .into_iter()
        .enumerate()
        .map(|(i, (_, a1, a2))| {
            // Zeros at z = +1 and z = -1 in every stage; all gain in the first.
            let g = if i == 0 { digital_gain } else { 1.0 };
            Biquad::new([g, 0.0, -g], a1, a2)
        })
        .collect();

    Ok(SosFilter::new(sections))
}

/// Map a normalized digital frequency to the analog axis of the bilinear transform.
fn prewarp(normalized: f64) -> f64 {
    BILINEAR_K * (PI * normalized / 2.0).tan()
}

/// Poles of the analog Butterworth lowpass prototype with unit cutoff.
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - n + 1.0;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

/// Lowpass-to-bandpass substitution `s -> (s^2 + w0^2) / (s * bw)`.
///
/// Each prototype pole splits into two bandpass poles.
fn lowpass_to_bandpass(poles: &[Complex64], bandwidth: f64, center: f64) -> Vec<Complex64> {
    let scaled: Vec<Complex64> = poles.iter().map(|&p| p * (bandwidth / 2.0)).collect();
    let w0_sq = center * center;

    let upper = scaled.iter().map(|&p| p + (p * p - w0_sq).sqrt());
    let lower = scaled.iter().map(|&p| p - (p * p - w0_sq).sqrt());
    upper.chain(lower).collect()
}

/// Group digital poles into second-order denominators.
///
/// Returns `(radius, a1, a2)` per stage. Complex poles pair with their
/// conjugate; real poles pair with each other.
fn pair_poles(poles: &[Complex64]) -> Vec<(f64, f64, f64)> {
    let mut stages = Vec::with_capacity(poles.len() / 2);
    let mut real_poles = Vec::new();

    for p in poles {
        if p.im > REAL_POLE_TOLERANCE {
            stages.push((p.norm(), -2.0 * p.re, p.norm_sqr()));
        } else if p.im.abs() <= REAL_POLE_TOLERANCE {
            real_poles.push(p.re);
        }
    }

    real_poles.sort_by(f64::total_cmp);
    for pair in real_poles.chunks(2) {
        match *pair {
            [r1, r2] => stages.push((r1.abs().max(r2.abs()), -(r1 + r2), r1 * r2)),
            [r] => stages.push((r.abs(), -r, 0.0)),
            _ => {}
        }
    }

    stages
}
