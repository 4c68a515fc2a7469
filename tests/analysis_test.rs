//! End-to-end tests for the band health analyzer

use approx::assert_abs_diff_eq;
use bearing_health::core::{
    analyze, analyze_with, round_energy, AnalysisParams, BandIsolator, BandSpec, HealthJudge,
    HealthStatus, MAX_FILTER_ORDER,
};
use bearing_health::AnalysisError;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

const FS: f64 = 2000.0;

fn sine(freq: f64, amplitude: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| amplitude * (2.0 * PI * freq * n as f64 / FS).sin())
        .collect()
}

#[test]
fn test_all_zero_signal_is_healthy() {
    let verdict = analyze(&vec![0.0; 4096], FS, 120.0, 10.0, 0.5).unwrap();
    assert_eq!(verdict.energy, 0.0);
    assert_eq!(verdict.status, HealthStatus::Healthy);
    assert_eq!(verdict.threshold, 0.5);
}

#[test]
fn test_fault_tone_energy_approaches_rms() {
    for amplitude in [0.25, 1.0, 2.0] {
        let verdict = analyze(&sine(120.0, amplitude, 20_000), FS, 120.0, 10.0, 0.5).unwrap();
        let expected = amplitude / 2f64.sqrt();
        assert_abs_diff_eq!(verdict.raw_energy(), expected, epsilon = expected * 0.05);

        let status = if expected > 0.5 {
            HealthStatus::Anomaly
        } else {
            HealthStatus::Healthy
        };
        assert_eq!(verdict.status, status, "amplitude {amplitude}");
    }
}

#[test]
fn test_short_recording_status() {
    let loud = analyze(&sine(120.0, 1.0, 4096), FS, 120.0, 10.0, 0.5).unwrap();
    assert_eq!(loud.status, HealthStatus::Anomaly);

    let quiet = analyze(&sine(120.0, 0.4, 4096), FS, 120.0, 10.0, 0.5).unwrap();
    assert_eq!(quiet.status, HealthStatus::Healthy);
}

#[test]
fn test_tone_outside_band_is_rejected() {
    let mut samples = sine(30.0, 1.0, 8192);
    for (s, t) in samples.iter_mut().zip(sine(400.0, 1.0, 8192)) {
        *s += t;
    }
    let verdict = analyze(&samples, FS, 120.0, 10.0, 0.5).unwrap();
    assert!(verdict.raw_energy() < 0.05, "leaked {}", verdict.raw_energy());
    assert_eq!(verdict.status, HealthStatus::Healthy);
}

#[test]
fn test_three_samples_is_insufficient() {
    match analyze(&[0.1, 0.2, 0.3], FS, 120.0, 10.0, 0.5) {
        Err(AnalysisError::InsufficientSamples { actual, required }) => {
            assert_eq!(actual, 3);
            assert_eq!(required, 24);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_band_above_nyquist_is_invalid() {
    let err = analyze(&vec![0.0; 4096], 400.0, 120.0, 300.0, 0.5).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidBandSpecification { .. }));
    assert_eq!(err.code(), "INVALID_BAND_SPECIFICATION");
}

#[test]
fn test_empty_sequence() {
    assert_eq!(
        analyze(&[], FS, 120.0, 10.0, 0.5).unwrap_err(),
        AnalysisError::EmptySequence
    );
}

#[test]
fn test_valid_bands_normalize_inside_unit_interval() {
    for (target, bandwidth, fs) in [
        (120.0, 10.0, 2000.0),
        (5.0, 9.9, 100.0),
        (990.0, 10.0, 2000.0),
        (1.0, 0.01, 8.0),
    ] {
        let band = BandSpec::new(target, bandwidth).normalized(fs).unwrap();
        assert!(0.0 < band.low && band.low < band.high && band.high < 1.0);
    }

    for (target, bandwidth, fs) in [
        (120.0, 300.0, 400.0),
        (5.0, 10.0, 100.0),
        (995.0, 10.0, 2000.0),
        (120.0, 0.0, 2000.0),
        (120.0, -10.0, 2000.0),
    ] {
        assert!(matches!(
            BandSpec::new(target, bandwidth).normalized(fs),
            Err(AnalysisError::InvalidBandSpecification { .. })
        ));
    }
}

#[test]
fn test_energy_never_negative() {
    let signals = [
        vec![-1.0; 512],
        sine(120.0, -3.0, 512),
        (0..512).map(|n| if n % 3 == 0 { -0.7 } else { 0.2 }).collect(),
    ];
    for samples in &signals {
        let verdict = analyze(samples, FS, 120.0, 10.0, 0.0).unwrap();
        assert!(verdict.raw_energy() >= 0.0);
        assert!(verdict.energy >= 0.0);
    }
}

#[test]
fn test_threshold_equal_to_energy_is_healthy() {
    let samples = sine(120.0, 0.9, 4096);
    let energy = analyze(&samples, FS, 120.0, 10.0, 0.5).unwrap().raw_energy();

    let at = analyze(&samples, FS, 120.0, 10.0, energy).unwrap();
    assert_eq!(at.status, HealthStatus::Healthy);

    let below = analyze(&samples, FS, 120.0, 10.0, energy - 1e-9).unwrap();
    assert_eq!(below.status, HealthStatus::Anomaly);

    let judge = HealthJudge::new(0.5).unwrap();
    assert_eq!(judge.judge(&[0.5; 64]).unwrap().status, HealthStatus::Healthy);
    assert_eq!(judge.judge(&[-0.5; 64]).unwrap().status, HealthStatus::Healthy);
}

#[test]
fn test_repeated_calls_are_bit_identical() {
    let samples: Vec<f64> = sine(120.0, 0.8, 4096)
        .iter()
        .zip(sine(37.0, 0.3, 4096))
        .map(|(a, b)| a + b)
        .collect();

    let first = analyze(&samples, FS, 120.0, 10.0, 0.5).unwrap();
    let json = serde_json::to_string(&first).unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| analyze(&samples, FS, 120.0, 10.0, 0.5).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for verdict in results {
        assert_eq!(verdict.raw_energy().to_bits(), first.raw_energy().to_bits());
        assert_eq!(serde_json::to_string(&verdict).unwrap(), json);
    }
}

#[test]
fn test_reported_energy_is_rounded_once() {
    let verdict = analyze(&sine(120.0, 0.37, 4096), FS, 120.0, 10.0, 0.5).unwrap();
    assert_eq!(round_energy(verdict.energy), verdict.energy);
    assert_eq!(verdict.energy, round_energy(verdict.raw_energy()));
    assert_abs_diff_eq!(verdict.energy, verdict.raw_energy(), epsilon = 5e-5);
}

#[test]
fn test_isolator_reuse_matches_one_shot() {
    let params = AnalysisParams {
        target_freq: 87.5,
        bandwidth: 6.0,
        ..AnalysisParams::default()
    };
    let isolator = BandIsolator::new(params.band(), params.fs).unwrap();
    let judge = HealthJudge::new(params.threshold).unwrap();

    for amplitude in [0.1, 0.6] {
        let samples = sine(87.5, amplitude, 6000);
        let reused = judge.judge(&isolator.isolate(&samples).unwrap()).unwrap();
        let fresh = analyze_with(&samples, &params).unwrap();
        assert_eq!(reused.raw_energy().to_bits(), fresh.raw_energy().to_bits());
    }
}

#[test]
fn test_non_finite_samples_are_rejected() {
    let mut samples = vec![0.0; 100];
    samples[42] = f64::NAN;
    match analyze(&samples, FS, 120.0, 10.0, 0.5) {
        Err(AnalysisError::NonFiniteSample { index, .. }) => assert_eq!(index, 42),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_negative_threshold_is_rejected() {
    let err = analyze(&vec![0.0; 100], FS, 120.0, 10.0, -0.1).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::InvalidParameter { name: "threshold", .. }
    ));
}

#[test]
fn test_filter_order_is_bounded() {
    let samples = sine(120.0, 2.0, 20_000);

    let params = AnalysisParams {
        order: MAX_FILTER_ORDER,
        ..AnalysisParams::default()
    };
    let verdict = analyze_with(&samples, &params).unwrap();
    assert!(verdict.raw_energy().is_finite());
    assert_eq!(verdict.status, HealthStatus::Anomaly);

    for order in [0, MAX_FILTER_ORDER + 1, 200, 1_000_000_000] {
        let started = Instant::now();
        let params = AnalysisParams {
            order,
            ..AnalysisParams::default()
        };
        match analyze_with(&samples, &params) {
            Err(AnalysisError::InvalidParameter { name, .. }) => assert_eq!(name, "order"),
            other => panic!("order {order}: unexpected result {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(1), "order {order}");
    }
}

#[test]
fn test_huge_amplitude_keeps_finite_energy() {
    let reference = analyze(&sine(120.0, 1.0, 20_000), FS, 120.0, 10.0, 0.5).unwrap();
    let verdict = analyze(&sine(120.0, 1e200, 20_000), FS, 120.0, 10.0, 0.5).unwrap();

    assert_eq!(verdict.status, HealthStatus::Anomaly);
    assert!(verdict.energy.is_finite());
    assert_abs_diff_eq!(
        verdict.raw_energy() / 1e200,
        reference.raw_energy(),
        epsilon = 1e-6
    );
    assert!(serde_json::to_string(&verdict).is_ok());
}

#[test]
fn test_extreme_inputs_are_never_healthy() {
    let quiet = sine(120.0, 0.1, 4096);
    for amplitude in [1e154, 1e200, 1e300, f64::MAX] {
        let samples: Vec<f64> = sine(120.0, 1.0, 4096).iter().map(|v| v * amplitude).collect();
        match analyze(&samples, FS, 120.0, 10.0, 0.5) {
            Ok(verdict) => {
                assert!(verdict.raw_energy().is_finite(), "amplitude {amplitude:e}");
                assert_eq!(verdict.status, HealthStatus::Anomaly, "amplitude {amplitude:e}");
            }
            Err(err) => assert_eq!(err.code(), "ENERGY_OVERFLOW", "amplitude {amplitude:e}"),
        }
    }

    assert_eq!(
        analyze(&quiet, FS, 120.0, 10.0, 0.5).unwrap().status,
        HealthStatus::Healthy
    );
}
