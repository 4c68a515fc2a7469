//! Analysis reports returned by the serving surfaces.
//!
//! A report wraps a [`Verdict`] with the recording it came from, the band
//! that was analyzed and the producer that computed it.

use crate::core::{AnalysisParams, HealthStatus, Verdict};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "bearing-health";

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
    /// Host the analysis ran on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// The analyzed band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBand {
    /// Sampling rate in Hz
    pub fs: f64,
    /// Band center in Hz
    pub target_freq: f64,
    /// Band width in Hz
    pub bandwidth: f64,
    /// Lower band edge in Hz
    pub low_hz: f64,
    /// Upper band edge in Hz
    pub high_hz: f64,
    /// Butterworth prototype order
    pub order: usize,
}

/// Where the samples came from.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// Path or URI of the recording, if loaded from one
    pub sensor_path: Option<String>,
    /// Column the samples were read from
    pub column: Option<String>,
    /// Number of samples analyzed
    pub sample_count: usize,
}

/// One analysis, ready to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report format version
    pub report_version: String,
    /// Unique report identifier
    pub report_id: String,
    /// When the analysis ran (RFC3339)
    pub analyzed_at_utc: String,
    /// Producer metadata
    pub producer: ReportProducer,
    /// Path or URI of the recording
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_path: Option<String>,
    /// Column the samples were read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Number of samples analyzed
    pub sample_count: usize,
    /// The analyzed band
    pub band: ReportBand,
    /// Band RMS, rounded to 4 decimals
    pub energy: f64,
    /// Unrounded band RMS, only when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_energy: Option<f64>,
    /// Health classification
    pub status: HealthStatus,
    /// Threshold used for the classification
    pub threshold: f64,
}

/// Builder for analysis reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    host: Option<String>,
    include_raw_energy: bool,
}

impl ReportBuilder {
    /// Create a new report builder with a unique instance ID.
    pub fn new() -> Self {
        let host = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().to_string());

        Self {
            instance_id: Uuid::new_v4(),
            host,
            include_raw_energy: false,
        }
    }

    /// Include the unrounded energy in built reports.
    pub fn with_raw_energy(mut self, include: bool) -> Self {
        self.include_raw_energy = include;
        self
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a report for one verdict.
    pub fn build(
        &self,
        verdict: &Verdict,
        params: &AnalysisParams,
        recording: &Recording,
    ) -> AnalysisReport {
        let (low_hz, high_hz) = params.band().edges();

        AnalysisReport {
            report_version: REPORT_VERSION.to_string(),
            report_id: Uuid::new_v4().to_string(),
            analyzed_at_utc: Utc::now().to_rfc3339(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: self.instance_id.to_string(),
                host: self.host.clone(),
            },
            sensor_path: recording.sensor_path.clone(),
            column: recording.column.clone(),
            sample_count: recording.sample_count,
            band: ReportBand {
                fs: params.fs,
                target_freq: params.target_freq,
                bandwidth: params.bandwidth,
                low_hz,
                high_hz,
                order: params.order,
            },
            energy: verdict.energy,
            raw_energy: self.include_raw_energy.then(|| verdict.raw_energy()),
            status: verdict.status,
            threshold: verdict.threshold,
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
