//! Bearing Health - frequency-band vibration analyzer.
//!
//! Flags bearing degradation by measuring how much vibration energy sits in a
//! narrow band around a known fault frequency. A recording is band-passed with
//! a 4th-order Butterworth filter centered on the fault frequency, the RMS of
//! the filtered signal is taken as the band energy, and the energy is compared
//! against a threshold.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Bearing Health                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Source    │──▶│    Band     │──▶│   Health    │       │
//! │  │ (parquet,   │   │  Isolator   │   │   Judge     │       │
//! │  │ csv,webhdfs)│   │ (SOS bpf)   │   │ (RMS > thr) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Analysis   │◀────────────────────│   Report    │       │
//! │  │    Log      │                     │  (JSON)     │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use bearing_health::core::{analyze, HealthStatus};
//!
//! let fs = 2000.0;
//! let samples: Vec<f64> = (0..4096)
//!     .map(|n| 0.2 * (2.0 * std::f64::consts::PI * 120.0 * n as f64 / fs).sin())
//!     .collect();
//!
//! let verdict = analyze(&samples, fs, 120.0, 10.0, 0.5).unwrap();
//! assert_eq!(verdict.status, HealthStatus::Healthy);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod report;
pub mod source;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{analyze, analyze_with, AnalysisParams, HealthStatus, Verdict};
pub use error::{AnalysisError, Error, Result, SourceError};
pub use report::{AnalysisReport, Recording, ReportBuilder};
pub use source::{load_samples, SampleSource, DEFAULT_COLUMN};
pub use stats::{AnalysisLog, AnalysisStats, SharedAnalysisLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load `column` from `source` and analyze it, blocking the current thread.
pub fn analyze_source(
    source: &SampleSource,
    column: &str,
    params: &AnalysisParams,
) -> Result<(Verdict, Recording)> {
    let samples = load_samples(source, column)?;
    let verdict = analyze_with(&samples, params)?;

    let recording = Recording {
        sensor_path: Some(source.to_string()),
        column: Some(column.to_string()),
        sample_count: samples.len(),
    };
    Ok((verdict, recording))
}
