//! End-to-end band health analysis.
//!
//! `samples + fs + band -> BandIsolator -> HealthJudge -> Verdict`

use crate::core::band::{BandIsolator, BandSpec, DEFAULT_BANDWIDTH_HZ, DEFAULT_FILTER_ORDER};
use crate::core::judge::{HealthJudge, Verdict, DEFAULT_THRESHOLD};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Default sampling rate of the vibration recordings, in Hz.
pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 2000.0;

/// Default bearing fault frequency, in Hz.
pub const DEFAULT_TARGET_FREQ_HZ: f64 = 120.0;

/// Parameters of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Sampling rate in Hz
    pub fs: f64,
    /// Fault frequency at the band center, in Hz
    pub target_freq: f64,
    /// Full band width in Hz
    pub bandwidth: f64,
    /// RMS threshold for an anomaly
    pub threshold: f64,
    /// Butterworth prototype order
    pub order: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            fs: DEFAULT_SAMPLING_RATE_HZ,
            target_freq: DEFAULT_TARGET_FREQ_HZ,
            bandwidth: DEFAULT_BANDWIDTH_HZ,
            threshold: DEFAULT_THRESHOLD,
            order: DEFAULT_FILTER_ORDER,
        }
    }
}

impl AnalysisParams {
    /// The band these parameters select.
    pub fn band(&self) -> BandSpec {
        BandSpec::new(self.target_freq, self.bandwidth)
    }
}

/// Analyze `samples` with the default filter order.
pub fn analyze(
    samples: &[f64],
    fs: f64,
    target_freq: f64,
    bandwidth: f64,
    threshold: f64,
) -> Result<Verdict, AnalysisError> {
    analyze_with(
        samples,
        &AnalysisParams {
            fs,
            target_freq,
            bandwidth,
            threshold,
            order: DEFAULT_FILTER_ORDER,
        },
    )
}

/// Isolate the configured band of `samples` and judge its energy.
pub fn analyze_with(samples: &[f64], params: &AnalysisParams) -> Result<Verdict, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptySequence);
    }

    let judge = HealthJudge::new(params.threshold)?;
    let isolator = BandIsolator::with_order(params.band(), params.fs, params.order)?;
    let filtered = isolator.isolate(samples)?;
    let verdict = judge.judge(&filtered)?;

    tracing::debug!(
        samples = samples.len(),
        energy = verdict.raw_energy(),
        threshold = verdict.threshold,
        status = %verdict.status,
        "band analysis complete"
    );

    Ok(verdict)
}
