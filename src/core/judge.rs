//! Health judgement from band energy.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Default RMS threshold above which a bearing is flagged.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Decimal digits kept in the reported energy.
pub const ENERGY_DECIMALS: i32 = 4;

/// 2^53; every `f64` at or above this is an integer.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Categorical health outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Anomaly,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Anomaly => "ANOMALY",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one analysis.
///
/// `energy` is rounded for presentation; the classification was made on the
/// unrounded value, which stays available through [`Verdict::raw_energy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    /// Band RMS rounded to [`ENERGY_DECIMALS`] digits
    pub energy: f64,
    /// Health classification
    pub status: HealthStatus,
    /// Threshold the energy was compared against
    pub threshold: f64,
    #[serde(skip)]
    raw_energy: f64,
}

impl Verdict {
    /// Unrounded band RMS.
    pub fn raw_energy(&self) -> f64 {
        self.raw_energy
    }

    pub fn is_anomaly(&self) -> bool {
        self.status == HealthStatus::Anomaly
    }
}

/// Root-mean-square of `samples`.
///
/// The samples are scaled by their peak magnitude first, so squaring cannot
/// overflow for any finite input.
pub fn rms(samples: &[f64]) -> Result<f64, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptySequence);
    }
    if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AnalysisError::EnergyOverflow { index, value });
    }

    let peak = samples.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if peak == 0.0 {
        return Ok(0.0);
    }
    Ok(peak * samples.iter().map(|v| v / peak).quadratic_mean())
}

/// Round an energy value for presentation.
///
/// Values whose scaled form is past the exact-integer range of `f64` have no
/// digits below the fourth decimal and come back unchanged.
pub fn round_energy(value: f64) -> f64 {
    let scale = 10f64.powi(ENERGY_DECIMALS);
    let scaled = value * scale;
    if !(scaled.abs() < EXACT_INTEGER_LIMIT) {
        return value;
    }
    scaled.round() / scale
}

/// Compares band energy against a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthJudge {
    threshold: f64,
}

impl HealthJudge {
    /// Create a judge; the threshold must be finite and non-negative.
    pub fn new(threshold: f64) -> Result<Self, AnalysisError> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "threshold",
                value: threshold,
                reason: "must be finite and non-negative",
            });
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly above the threshold is an anomaly; equal is healthy.
    /// An energy that is not a number is never healthy.
    pub fn classify(&self, energy: f64) -> HealthStatus {
        if energy <= self.threshold {
            HealthStatus::Healthy
        } else {
            HealthStatus::Anomaly
        }
    }

    /// Reduce a band-filtered sequence to a verdict.
    pub fn judge(&self, filtered: &[f64]) -> Result<Verdict, AnalysisError> {
        let raw_energy = rms(filtered)?;
        Ok(Verdict {
            energy: round_energy(raw_energy),
            status: self.classify(raw_energy),
            threshold: self.threshold,
            raw_energy,
        })
    }
}

impl Default for HealthJudge {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}
