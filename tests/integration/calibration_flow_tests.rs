//! Integration tests for the operator calibration / reset flow.
//!
//! Console bytes → request → [`MonitorCommand`] → calibration engine →
//! baseline store, with the effect observed on the next scheduled sample.

use comonitor::adapters::console::forward_commands;
use comonitor::adapters::nvs::NvsAdapter;
use comonitor::alarm::AlarmLevel;
use comonitor::app::commands::MonitorCommand;
use comonitor::app::events::MonitorEvent;
use comonitor::app::ports::BaselineStore;
use comonitor::app::service::{CommandOutcome, MonitorService};
use comonitor::config::MonitorConfig;
use comonitor::error::CalibrationError;

use crate::mock_hw::{MockHardware, MockStore, RecordingBuzzer, RecordingSink};

/// Rs ≈ 9.5 kΩ.
const CLEAN_AIR: u16 = 1909;
/// Rs ≈ 50 kΩ.
const OUTLIER: u16 = 620;

const WARM_MS: u64 = 600_000;

fn make_service(store: &MockStore) -> MonitorService {
    MonitorService::new(MonitorConfig::default(), 0, store)
}

#[test]
fn stable_clean_air_commits_and_persists_baseline() {
    let mut store = MockStore::default();
    let mut svc = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::Calibrate, WARM_MS, &mut hw, &mut store, &mut sink);

    let CommandOutcome::Calibrated(report) = outcome else {
        panic!("expected acceptance, got {outcome:?}");
    };
    assert!((9_400.0..9_600.0).contains(&report.baseline_ohms), "R0 {}", report.baseline_ohms);
    assert_eq!(report.requested, 20);
    assert_eq!(report.stats.count, 20);
    assert!(report.persisted);
    assert_eq!(store.value, Some(report.baseline_ohms));
    assert!(svc.calibration().is_calibrated());
    assert!(matches!(sink.events.as_slice(), [MonitorEvent::CalibrationAccepted(_)]));

    // 20 samples × (20 reads × 3 ms + 10 ms).
    assert_eq!(hw.reads, 400);
    assert_eq!(hw.delayed_ms(), 1_400);

    let mut buzzer = RecordingBuzzer::default();
    let level = svc.tick(WARM_MS + 2_000, &mut hw, &mut buzzer, &mut sink);
    assert_eq!(level, AlarmLevel::Ok);
    let ratio = svc.latest().ratio.unwrap();
    assert!((ratio - 1.0).abs() < 0.001, "ratio {ratio}");
}

#[test]
fn outliers_make_the_run_unstable() {
    let mut store = MockStore::with_value(10_000.0);
    let mut svc = make_service(&store);
    let avg_reads = usize::from(svc.config().avg_reads);
    let mut hw = MockHardware::new(CLEAN_AIR);
    hw.queue(CLEAN_AIR, 18 * avg_reads);
    hw.queue(OUTLIER, 2 * avg_reads);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::Calibrate, WARM_MS, &mut hw, &mut store, &mut sink);

    let CommandOutcome::Rejected(err) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(err.category(), "unstable");
    assert!(!err.is_precondition());
    assert_eq!(svc.calibration().baseline_ohms(), 10_000.0);
    assert_eq!(store.value, Some(10_000.0));
    assert_eq!(store.saves, 0);
    assert_eq!(sink.events, vec![MonitorEvent::CalibrationRejected(err)]);
}

#[test]
fn preconditions_are_checked_before_any_read() {
    let mut store = MockStore::default();
    let mut svc = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::CalibrateWith(1), WARM_MS, &mut hw, &mut store, &mut sink);
    assert_eq!(
        outcome,
        CommandOutcome::Rejected(CalibrationError::InvalidSampleCount { requested: 1, max: 32 })
    );

    let outcome = svc.handle_command(MonitorCommand::Calibrate, WARM_MS - 5_000, &mut hw, &mut store, &mut sink);
    assert_eq!(
        outcome,
        CommandOutcome::Rejected(CalibrationError::WarmupIncomplete { remaining_ms: 5_000 })
    );

    assert_eq!(hw.reads, 0);
    assert_eq!(hw.delayed_ns, 0);
    assert!(!svc.calibration().is_calibrated());
}

#[test]
fn dead_sensor_yields_insufficient_samples() {
    let mut store = MockStore::with_value(10_000.0);
    let mut svc = make_service(&store);
    let mut hw = MockHardware::new(0);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::CalibrateWith(5), WARM_MS, &mut hw, &mut store, &mut sink);

    assert_eq!(
        outcome,
        CommandOutcome::Rejected(CalibrationError::InsufficientSamples { valid: 0 })
    );
    assert!(svc.calibration().is_calibrated(), "stored baseline still in force");
    assert_eq!(svc.calibration().baseline_ohms(), 10_000.0);
}

/// Queue `pairs` acquisitions alternating between two codes.
fn queue_alternating(hw: &mut MockHardware, a: u16, b: u16, pairs: usize, avg_reads: usize) {
    for _ in 0..pairs {
        hw.queue(a, avg_reads);
        hw.queue(b, avg_reads);
    }
}

#[test]
fn spread_just_under_limit_is_accepted() {
    // 10 kΩ / 9.19 kΩ alternating: rel stddev ≈ 4.2 %.
    let mut store = MockStore::with_value(12_000.0);
    let mut svc = make_service(&store);
    let avg_reads = usize::from(svc.config().avg_reads);
    let mut hw = MockHardware::new(1861);
    queue_alternating(&mut hw, 1861, 1940, 10, avg_reads);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::Calibrate, WARM_MS, &mut hw, &mut store, &mut sink);

    let CommandOutcome::Calibrated(report) = outcome else {
        panic!("expected acceptance, got {outcome:?}");
    };
    assert!(
        (0.040..0.045).contains(&report.stats.rel_stddev),
        "rel stddev {}",
        report.stats.rel_stddev
    );
    assert!((9_550.0..9_650.0).contains(&report.baseline_ohms), "R0 {}", report.baseline_ohms);
    assert!(report.persisted);
    assert_eq!(store.value, Some(report.baseline_ohms));
    assert_eq!(svc.calibration().baseline_ohms(), report.baseline_ohms);
    assert!(svc.calibration().is_calibrated());
}

#[test]
fn spread_just_over_limit_is_rejected() {
    // 10 kΩ / 8.99 kΩ alternating: rel stddev ≈ 5.3 %.
    let mut store = MockStore::with_value(12_000.0);
    let mut svc = make_service(&store);
    let avg_reads = usize::from(svc.config().avg_reads);
    let mut hw = MockHardware::new(1861);
    queue_alternating(&mut hw, 1861, 1960, 10, avg_reads);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::Calibrate, WARM_MS, &mut hw, &mut store, &mut sink);

    let CommandOutcome::Rejected(CalibrationError::Unstable { rel_stddev, limit }) = outcome else {
        panic!("expected an unstable rejection, got {outcome:?}");
    };
    assert!((0.050..0.056).contains(&rel_stddev), "rel stddev {rel_stddev}");
    assert_eq!(limit, 0.05);
    assert_eq!(svc.calibration().baseline_ohms(), 12_000.0);
    assert_eq!(store.value, Some(12_000.0));
    assert_eq!(store.saves, 0);
}

#[test]
fn single_defined_reading_is_insufficient() {
    let mut store = MockStore::with_value(10_000.0);
    let mut svc = make_service(&store);
    let avg_reads = usize::from(svc.config().avg_reads);
    let mut hw = MockHardware::new(CLEAN_AIR);
    hw.queue(CLEAN_AIR, avg_reads);
    hw.queue(0, 4 * avg_reads);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::CalibrateWith(5), WARM_MS, &mut hw, &mut store, &mut sink);

    assert_eq!(
        outcome,
        CommandOutcome::Rejected(CalibrationError::InsufficientSamples { valid: 1 })
    );
    assert_eq!(hw.reads, 5 * avg_reads);
    assert!(svc.calibration().is_calibrated());
    assert_eq!(svc.calibration().baseline_ohms(), 10_000.0);
    assert_eq!(store.value, Some(10_000.0));
    assert_eq!(store.saves, 0);
}

#[test]
fn unwritable_store_keeps_baseline_for_the_session() {
    let mut store = MockStore::failing();
    let mut svc = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    let mut sink = RecordingSink::default();

    let outcome = svc.handle_command(MonitorCommand::Calibrate, WARM_MS, &mut hw, &mut store, &mut sink);

    let CommandOutcome::Calibrated(report) = outcome else {
        panic!("expected acceptance, got {outcome:?}");
    };
    assert!(!report.persisted);
    assert_eq!(store.saves, 1);
    assert_eq!(store.value, None);
    assert!(svc.calibration().is_calibrated());
    assert_eq!(svc.calibration().baseline_ohms(), report.baseline_ohms);
}

#[test]
fn reset_returns_to_fallback_through_nvs() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.save(9_000.0).unwrap();
    let mut svc = MonitorService::new(MonitorConfig::default(), 0, &nvs);
    assert!(svc.calibration().is_calibrated());
    assert_eq!(svc.calibration().baseline_ohms(), 9_000.0);

    let mut hw = MockHardware::new(CLEAN_AIR);
    let mut sink = RecordingSink::default();
    let outcome = svc.handle_command(MonitorCommand::ResetCalibration, WARM_MS, &mut hw, &mut nvs, &mut sink);

    assert_eq!(outcome, CommandOutcome::Reset);
    assert!(!nvs.has_value());
    assert_eq!(nvs.load(10_000.0), 10_000.0);
    assert!(!svc.calibration().is_calibrated());
    assert_eq!(svc.calibration().baseline_ohms(), 10_000.0);
    assert_eq!(sink.events, vec![MonitorEvent::CalibrationReset]);
    assert_eq!(hw.reads, 0);

    let mut buzzer = RecordingBuzzer::default();
    assert_eq!(svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Unknown);
}

#[test]
fn console_bytes_drive_calibrate_then_reset() {
    let mut requests = Vec::new();
    let accepted = forward_commands(&b"x c\r\nr\n"[..], |e| {
        requests.push(e);
        true
    });
    assert_eq!(accepted, 2);

    let mut store = MockStore::default();
    let mut svc = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    let mut sink = RecordingSink::default();

    let outcomes: Vec<_> = requests
        .into_iter()
        .map(|e| svc.handle_command(e.into(), WARM_MS, &mut hw, &mut store, &mut sink))
        .collect();

    assert!(matches!(outcomes[0], CommandOutcome::Calibrated(_)));
    assert_eq!(outcomes[1], CommandOutcome::Reset);
    assert!(outcomes.iter().all(CommandOutcome::is_success));
    assert_eq!(store.saves, 1);
    assert_eq!(store.clears, 1);
    assert_eq!(store.value, None);
}
