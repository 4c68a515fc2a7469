//! Core functionality for the bearing health analyzer.
//!
//! This module contains:
//! - Second-order-section filters and Butterworth bandpass design
//! - Band isolation around a fault frequency
//! - RMS energy judgement against a threshold

pub mod analysis;
pub mod band;
pub mod butterworth;
pub mod judge;
pub mod sos;

// Re-export commonly used types
pub use analysis::{
    analyze, analyze_with, AnalysisParams, DEFAULT_SAMPLING_RATE_HZ, DEFAULT_TARGET_FREQ_HZ,
};
pub use band::{BandIsolator, BandSpec, NormalizedBand, DEFAULT_BANDWIDTH_HZ, DEFAULT_FILTER_ORDER};
pub use butterworth::MAX_FILTER_ORDER;
pub use judge::{rms, round_energy, HealthJudge, HealthStatus, Verdict, DEFAULT_THRESHOLD};
pub use sos::{Biquad, SosFilter};
