//! Integration tests for the sample → classify → buzzer → telemetry loop.

use comonitor::alarm::AlarmLevel;
use comonitor::app::commands::MonitorCommand;
use comonitor::app::events::MonitorEvent;
use comonitor::app::service::MonitorService;
use comonitor::config::MonitorConfig;

use crate::mock_hw::{BuzzerCall, MockHardware, MockStore, RecordingBuzzer, RecordingSink};

/// Rs ≈ 10 kΩ.
const CLEAN_AIR: u16 = 1861;
/// Rs ≈ 6 kΩ.
const WARN_CODE: u16 = 2327;
/// Rs ≈ 3 kΩ.
const DANGER_CODE: u16 = 2864;

const WARM_MS: u64 = 600_000;

fn make_service(store: &MockStore) -> (MonitorService, RecordingBuzzer, RecordingSink) {
    let mut svc = MonitorService::new(MonitorConfig::default(), 0, store);
    let mut buzzer = RecordingBuzzer::default();
    let mut sink = RecordingSink::default();
    svc.start(0, &mut buzzer, &mut sink);
    (svc, buzzer, sink)
}

#[test]
fn readings_stay_unknown_during_warmup() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(DANGER_CODE);

    for t in (0..WARM_MS).step_by(50_000) {
        assert_eq!(svc.tick(t, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Unknown);
    }

    assert!(!svc.latest().warmup_done);
    assert!(!svc.latest().valid);
    assert!(svc.latest().ratio.is_some(), "ratio is still computed during warm-up");
    assert_eq!(buzzer.on_count(), 0);
    assert!(sink.alarm_changes().is_empty());
    assert_eq!(sink.count(|e| matches!(e, MonitorEvent::WarmupComplete)), 0);
}

#[test]
fn clean_air_to_danger_restarts_buzzer_at_danger_cadence() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);

    assert_eq!(svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Ok);
    let ratio = svc.latest().ratio.unwrap();
    assert!((ratio - 1.0).abs() < 0.01, "ratio {ratio}");
    assert!(!buzzer.is_on());

    hw.hold(DANGER_CODE);
    let t = WARM_MS + 1_000;
    assert_eq!(svc.tick(t, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Danger);
    assert_eq!(buzzer.calls.last(), Some(&BuzzerCall::On(AlarmLevel::Danger)));
    assert_eq!(svc.buzzer_state().next_toggle_at_ms, t + 100);

    // 100 ms on, 100 ms off.
    svc.tick(t + 50, &mut hw, &mut buzzer, &mut sink);
    assert!(buzzer.is_on());
    svc.tick(t + 100, &mut hw, &mut buzzer, &mut sink);
    assert!(!buzzer.is_on());
    svc.tick(t + 200, &mut hw, &mut buzzer, &mut sink);
    assert!(buzzer.is_on());

    assert_eq!(
        sink.alarm_changes(),
        vec![
            (AlarmLevel::Unknown, AlarmLevel::Ok),
            (AlarmLevel::Ok, AlarmLevel::Danger),
        ]
    );
}

#[test]
fn warn_band_uses_slow_pattern() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(WARN_CODE);

    assert_eq!(svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Warn);
    assert_eq!(buzzer.calls.last(), Some(&BuzzerCall::On(AlarmLevel::Warn)));

    // 150 ms on, 850 ms off.
    svc.tick(WARM_MS + 150, &mut hw, &mut buzzer, &mut sink);
    assert!(!buzzer.is_on());
    svc.tick(WARM_MS + 900, &mut hw, &mut buzzer, &mut sink);
    assert!(!buzzer.is_on());
    svc.tick(WARM_MS + 1_000, &mut hw, &mut buzzer, &mut sink);
    assert!(buzzer.is_on());
}

#[test]
fn returning_to_clean_air_silences_buzzer() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(DANGER_CODE);

    svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink);
    assert!(buzzer.is_on());

    hw.hold(CLEAN_AIR);
    assert_eq!(svc.tick(WARM_MS + 1_000, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Ok);
    assert_eq!(buzzer.calls.last(), Some(&BuzzerCall::Off));
    assert!(!svc.buzzer_state().is_on);
}

#[test]
fn reset_during_alarm_clears_on_next_sample() {
    let mut store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(DANGER_CODE);

    assert_eq!(svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Danger);
    svc.handle_command(MonitorCommand::ResetCalibration, WARM_MS + 50, &mut hw, &mut store, &mut sink);
    assert!(!svc.calibration().is_calibrated());

    // Same sampling period: the level still follows the pre-reset sample.
    assert_eq!(svc.tick(WARM_MS + 250, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Danger);
    assert!(svc.latest().calibrated);

    assert_eq!(svc.tick(WARM_MS + 1_000, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Unknown);
    assert!(!svc.latest().calibrated);
    assert_eq!(buzzer.calls.last(), Some(&BuzzerCall::Off));
    assert_eq!(sink.alarm_changes().last(), Some(&(AlarmLevel::Danger, AlarmLevel::Unknown)));
}

#[test]
fn uncalibrated_monitor_never_alarms() {
    let store = MockStore::default();
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(DANGER_CODE);

    assert_eq!(svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink), AlarmLevel::Unknown);
    let sample = svc.latest();
    assert!(!sample.calibrated);
    assert_eq!(sample.baseline_resistance, Some(10_000.0));
    assert!(sample.valid, "ppm is defined with the fallback baseline");
    assert_eq!(buzzer.on_count(), 0);
}

#[test]
fn warmup_complete_is_announced_once() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);

    for i in 0..5 {
        svc.tick(WARM_MS + i * 1_000, &mut hw, &mut buzzer, &mut sink);
    }
    assert_eq!(sink.count(|e| matches!(e, MonitorEvent::WarmupComplete)), 1);
}

#[test]
fn telemetry_follows_its_own_cadence() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    sink.clear();

    // 40 s at 4 Hz.
    let start = WARM_MS;
    for i in 0..160 {
        svc.tick(start + i * 250, &mut hw, &mut buzzer, &mut sink);
    }

    let readings: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::Reading(r) => Some(*r),
            _ => None,
        })
        .collect();
    let times: Vec<u64> = readings.iter().map(|r| r.uptime_ms).collect();
    assert_eq!(times, vec![start, start + 15_000, start + 30_000]);
    assert!(readings.iter().all(|r| r.ok && r.calibrated && r.warmup_done));
    assert_eq!(readings[0].level, AlarmLevel::Ok.ordinal());
    assert_eq!(svc.tick_count(), 160);
}

#[test]
fn sampling_period_limits_adc_traffic() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    let avg_reads = usize::from(svc.config().avg_reads);

    // Four control ticks inside one 1 s sampling period.
    for i in 0..4 {
        svc.tick(WARM_MS + i * 250, &mut hw, &mut buzzer, &mut sink);
    }
    assert_eq!(hw.reads, avg_reads);

    svc.tick(WARM_MS + 1_000, &mut hw, &mut buzzer, &mut sink);
    assert_eq!(hw.reads, 2 * avg_reads);
}

#[test]
fn telemetry_record_renders_csv_and_json() {
    let store = MockStore::with_value(10_000.0);
    let (mut svc, mut buzzer, mut sink) = make_service(&store);
    let mut hw = MockHardware::new(CLEAN_AIR);
    svc.tick(WARM_MS, &mut hw, &mut buzzer, &mut sink);

    let record = svc.telemetry_record(WARM_MS);
    let mut row = String::new();
    record.write_csv_row(&mut row).unwrap();
    assert!(row.starts_with("600000,1861,"), "row {row}");
    assert!(row.ends_with(",1,1,1,1"), "row {row}");

    let json = record.to_json().unwrap();
    assert!(json.contains("\"uptimeMs\":600000"));
    assert!(json.contains("\"ppm\":"));
}
