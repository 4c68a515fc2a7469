//! Error taxonomy for the analyzer and its data sources.
//!
//! Every failure carries a stable machine-readable code so serving surfaces
//! can branch on the kind of failure instead of parsing message text.

use thiserror::Error;

/// Failures of the band isolator and health judge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Cutoffs fall outside (0, 1) of Nyquist or are misordered.
    #[error(
        "invalid band specification: target {target_freq} Hz, bandwidth {bandwidth} Hz at fs {fs} Hz \
         gives normalized cutoffs [{low:.6}, {high:.6}], which must satisfy 0 < low < high < 1"
    )]
    InvalidBandSpecification {
        target_freq: f64,
        bandwidth: f64,
        fs: f64,
        low: f64,
        high: f64,
    },

    /// Too few samples for the filter transient to settle.
    #[error("insufficient samples: got {actual}, need at least {required}")]
    InsufficientSamples { actual: usize, required: usize },

    /// Zero-length input.
    #[error("sample sequence is empty")]
    EmptySequence,

    /// NaN or infinite value in the input.
    #[error("non-finite sample {value} at index {index}")]
    NonFiniteSample { index: usize, value: f64 },

    /// A scalar parameter outside its domain (sampling rate, threshold, order).
    #[error("invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The bandpass design produced a non-finite or vanishing gain, or a pole
    /// on or outside the unit circle.
    #[error(
        "bandpass of order {order} over normalized cutoffs [{low:e}, {high:e}] is numerically \
         unstable (cascade gain {gain:e})"
    )]
    UnstableFilter {
        order: usize,
        low: f64,
        high: f64,
        gain: f64,
    },

    /// The band energy overflowed; the input amplitude exceeds what the
    /// filter can carry in double precision.
    #[error("band energy is not finite: filtered sample {value} at index {index}")]
    EnergyOverflow { index: usize, value: f64 },
}

impl AnalysisError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidBandSpecification { .. } => "INVALID_BAND_SPECIFICATION",
            AnalysisError::InsufficientSamples { .. } => "INSUFFICIENT_SAMPLES",
            AnalysisError::EmptySequence => "EMPTY_SEQUENCE",
            AnalysisError::NonFiniteSample { .. } => "NON_FINITE_SAMPLE",
            AnalysisError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AnalysisError::UnstableFilter { .. } => "UNSTABLE_FILTER",
            AnalysisError::EnergyOverflow { .. } => "ENERGY_OVERFLOW",
        }
    }
}

/// Failures while resolving and decoding a sample column.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested column is not in the recording.
    #[error("column '{column}' not found. Available: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// The column exists but is not numeric.
    #[error("column '{column}' has non-numeric type {data_type}")]
    NonNumericColumn { column: String, data_type: String },

    /// Missing value inside the column.
    #[error("column '{column}' has a null value at row {row}")]
    NullValue { column: String, row: usize },

    /// Extension or URI scheme we cannot read.
    #[error("unsupported source: {0}")]
    Unsupported(String),

    /// The local file does not exist.
    #[error("source not found: {0}")]
    NotFound(String),

    /// Local filesystem failure.
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    /// The file could not be decoded.
    #[error("malformed {format} data: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    /// Transport failure talking to a remote store.
    #[error("remote source unreachable: {0}")]
    Network(String),

    /// The remote store answered with an error status.
    #[error("remote source error ({status}): {message}")]
    Remote { status: u16, message: String },
}

impl SourceError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            SourceError::NonNumericColumn { .. } => "NON_NUMERIC_COLUMN",
            SourceError::NullValue { .. } => "NULL_VALUE",
            SourceError::Unsupported(_) => "UNSUPPORTED_SOURCE",
            SourceError::NotFound(_) => "SOURCE_NOT_FOUND",
            SourceError::Io { .. } => "SOURCE_IO",
            SourceError::Malformed { .. } => "MALFORMED_SOURCE",
            SourceError::Network(_) => "REMOTE_UNREACHABLE",
            SourceError::Remote { .. } => "REMOTE_ERROR",
        }
    }
}

/// Any failure of the load-then-analyze pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl Error {
    /// Stable error code of the underlying failure.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Source(e) => e.code(),
            Error::Analysis(e) => e.code(),
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            AnalysisError::InvalidBandSpecification {
                target_freq: 120.0,
                bandwidth: 300.0,
                fs: 400.0,
                low: -0.15,
                high: 1.35,
            },
            AnalysisError::InsufficientSamples {
                actual: 3,
                required: 24,
            },
            AnalysisError::EmptySequence,
            AnalysisError::NonFiniteSample {
                index: 0,
                value: f64::NAN,
            },
            AnalysisError::InvalidParameter {
                name: "threshold",
                value: -1.0,
                reason: "must be non-negative",
            },
            AnalysisError::UnstableFilter {
                order: 16,
                low: 1e-300,
                high: 2e-300,
                gain: 0.0,
            },
            AnalysisError::EnergyOverflow {
                index: 7,
                value: f64::INFINITY,
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(AnalysisError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_column_not_found_lists_available() {
        let err = SourceError::ColumnNotFound {
            column: "vibration".to_string(),
            available: vec!["time".to_string(), "accel_x".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("vibration"));
        assert!(message.contains("accel_x"));
        assert_eq!(Error::from(err).code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_insufficient_samples_reports_minimum() {
        let err = AnalysisError::InsufficientSamples {
            actual: 3,
            required: 24,
        };
        assert!(err.to_string().contains("24"));
    }
}
