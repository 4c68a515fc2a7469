//! Band specification and isolation.
//!
//! The isolator designs its filter once for a `(band, fs, order)` triple and
//! can then be reused across recordings sampled at the same rate.

use crate::core::butterworth;
use crate::core::sos::SosFilter;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Default band width around the target frequency, in Hz.
pub const DEFAULT_BANDWIDTH_HZ: f64 = 10.0;

/// Default Butterworth prototype order.
pub const DEFAULT_FILTER_ORDER: usize = 4;

/// Minimum input length as a multiple of the filter's effective order.
const MIN_LENGTH_FACTOR: usize = 3;

/// A frequency band centered on a fault frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    /// Center of the band in Hz
    pub target_freq: f64,
    /// Full width of the band in Hz
    pub bandwidth: f64,
}

/// Band edges normalized to Nyquist, guaranteed `0 < low < high < 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBand {
    pub low: f64,
    pub high: f64,
}

impl BandSpec {
    /// Create a band specification.
    pub fn new(target_freq: f64, bandwidth: f64) -> Self {
        Self {
            target_freq,
            bandwidth,
        }
    }

    /// Lower and upper band edges in Hz.
    pub fn edges(&self) -> (f64, f64) {
        let half = self.bandwidth / 2.0;
        (self.target_freq - half, self.target_freq + half)
    }

    /// Normalize the band edges against the Nyquist frequency of `fs`.
    pub fn normalized(&self, fs: f64) -> Result<NormalizedBand, AnalysisError> {
        if !(fs.is_finite() && fs > 0.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "fs",
                value: fs,
                reason: "sampling rate must be positive and finite",
            });
        }

        let nyquist = fs / 2.0;
        let (lo_hz, hi_hz) = self.edges();
        let low = lo_hz / nyquist;
        let high = hi_hz / nyquist;

        let valid = self.target_freq > 0.0
            && self.bandwidth > 0.0
            && low > 0.0
            && low < high
            && high < 1.0;
        if !valid {
            return Err(AnalysisError::InvalidBandSpecification {
                target_freq: self.target_freq,
                bandwidth: self.bandwidth,
                fs,
                low,
                high,
            });
        }

        Ok(NormalizedBand { low, high })
    }
}

impl Default for BandSpec {
    fn default() -> Self {
        Self::new(120.0, DEFAULT_BANDWIDTH_HZ)
    }
}

/// Isolates the energy inside one band of a uniformly sampled signal.
#[derive(Debug, Clone)]
pub struct BandIsolator {
    spec: BandSpec,
    fs: f64,
    cutoffs: NormalizedBand,
    filter: SosFilter,
}

impl BandIsolator {
    /// Design a 4th-order Butterworth bandpass for `spec` at `fs`.
    pub fn new(spec: BandSpec, fs: f64) -> Result<Self, AnalysisError> {
        Self::with_order(spec, fs, DEFAULT_FILTER_ORDER)
    }

    /// Design a Butterworth bandpass of the given prototype order.
    pub fn with_order(spec: BandSpec, fs: f64, order: usize) -> Result<Self, AnalysisError> {
        let cutoffs = spec.normalized(fs)?;
        let filter = butterworth::bandpass(order, cutoffs.low, cutoffs.high)?;

        tracing::debug!(
            target_freq = spec.target_freq,
            bandwidth = spec.bandwidth,
            fs,
            low = cutoffs.low,
            high = cutoffs.high,
            sections = filter.sections().len(),
            "designed bandpass"
        );

        Ok(Self {
            spec,
            fs,
            cutoffs,
            filter,
        })
    }

    /// The band this isolator passes.
    pub fn spec(&self) -> BandSpec {
        self.spec
    }

    /// Sampling rate the filter was designed for.
    pub fn fs(&self) -> f64 {
        self.fs
    }

    /// Normalized cutoffs of the filter.
    pub fn cutoffs(&self) -> NormalizedBand {
        self.cutoffs
    }

    /// The designed filter.
    pub fn filter(&self) -> &SosFilter {
        &self.filter
    }

    /// Shortest input accepted by [`isolate`](Self::isolate).
    pub fn min_samples(&self) -> usize {
        MIN_LENGTH_FACTOR * self.filter.order()
    }

    /// Filter `samples` down to the band, returning a sequence of equal length.
    pub fn isolate(&self, samples: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::EmptySequence);
        }

        let required = self.min_samples();
        if samples.len() < required {
            return Err(AnalysisError::InsufficientSamples {
                actual: samples.len(),
                required,
            });
        }

        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::NonFiniteSample { index, value });
        }

        Ok(self.filter.apply(samples))
    }
}
