//! Tests for loading recordings from disk and analyzing them

use approx::assert_abs_diff_eq;
use bearing_health::core::{AnalysisParams, HealthStatus};
use bearing_health::source::{load_samples, write_parquet_columns, SampleSource};
use bearing_health::{analyze_source, SourceError, DEFAULT_COLUMN};
use std::f64::consts::PI;
use std::path::Path;

fn recording(fault_amplitude: f64, len: usize) -> (Vec<f64>, Vec<f64>) {
    let time: Vec<f64> = (0..len).map(|n| n as f64 / 2000.0).collect();
    let vibration = time
        .iter()
        .map(|&t| (2.0 * PI * 30.0 * t).sin() + fault_amplitude * (2.0 * PI * 120.0 * t).sin())
        .collect();
    (time, vibration)
}

fn source(path: &Path) -> SampleSource {
    SampleSource::parse(&path.to_string_lossy()).unwrap()
}

#[test]
fn test_parquet_recording_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensorReadings.parquet");
    let (time, vibration) = recording(1.0, 8000);
    write_parquet_columns(&path, &[("time", time.as_slice()), ("vibration", vibration.as_slice())])
        .unwrap();

    let samples = load_samples(&source(&path), DEFAULT_COLUMN).unwrap();
    assert_eq!(samples, vibration);
}

#[test]
fn test_faulty_and_healthy_parquet_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let params = AnalysisParams::default();

    let cases = [
        ("faulty.parquet", 1.0, HealthStatus::Anomaly),
        ("healthy.parquet", 0.1, HealthStatus::Healthy),
    ];
    for (name, fault_amplitude, expected) in cases {
        let path = dir.path().join(name);
        let (time, vibration) = recording(fault_amplitude, 8000);
        write_parquet_columns(&path, &[("time", time.as_slice()), ("vibration", vibration.as_slice())])
            .unwrap();

        let (verdict, info) = analyze_source(&source(&path), DEFAULT_COLUMN, &params).unwrap();
        assert_eq!(verdict.status, expected, "{name}");
        assert_abs_diff_eq!(
            verdict.raw_energy(),
            fault_amplitude / 2f64.sqrt(),
            epsilon = 0.05
        );
        assert_eq!(info.sample_count, 8000);
        assert_eq!(info.sensor_path.as_deref(), Some(path.to_string_lossy().as_ref()));
    }
}

#[test]
fn test_csv_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let (time, vibration) = recording(1.0, 4096);

    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(["time", "vibration"]).unwrap();
    for (t, v) in time.iter().zip(&vibration) {
        writer.write_record([t.to_string(), v.to_string()]).unwrap();
    }
    writer.flush().unwrap();

    let samples = load_samples(&source(&path), DEFAULT_COLUMN).unwrap();
    assert_eq!(samples.len(), 4096);
    assert_eq!(samples, vibration);

    let (verdict, _) =
        analyze_source(&source(&path), DEFAULT_COLUMN, &AnalysisParams::default()).unwrap();
    assert_eq!(verdict.status, HealthStatus::Anomaly);
}

#[test]
fn test_column_not_found_lists_available() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.parquet");
    let (time, vibration) = recording(0.0, 100);
    write_parquet_columns(&path, &[("time", time.as_slice()), ("accel_x", vibration.as_slice())])
        .unwrap();

    match load_samples(&source(&path), DEFAULT_COLUMN) {
        Err(SourceError::ColumnNotFound { column, available }) => {
            assert_eq!(column, "vibration");
            assert_eq!(available, vec!["time".to_string(), "accel_x".to_string()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let samples = load_samples(&source(&path), "accel_x").unwrap();
    assert_eq!(samples.len(), 100);
}

#[test]
fn test_missing_and_unsupported_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("absent.parquet");
    let err = load_samples(&source(&missing), DEFAULT_COLUMN).unwrap_err();
    assert_eq!(err.code(), "SOURCE_NOT_FOUND");

    let xlsx = dir.path().join("book.xlsx");
    std::fs::write(&xlsx, b"PK").unwrap();
    let err = load_samples(&source(&xlsx), DEFAULT_COLUMN).unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_SOURCE");
}

#[test]
fn test_analysis_errors_surface_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "time,vibration\n").unwrap();

    let err =
        analyze_source(&source(&path), DEFAULT_COLUMN, &AnalysisParams::default()).unwrap_err();
    assert_eq!(err.code(), "EMPTY_SEQUENCE");
}
