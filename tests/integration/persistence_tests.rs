//! Durable state across a service restart, using the file-backed adapters.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use biobin::actuators::{Actuator, ActuatorStatus, ChangeSource};
use biobin::adapters::file_store::FileStore;
use biobin::adapters::log_sink::LogEventSink;
use biobin::adapters::sample_file::FileSampleLog;
use biobin::adapters::time::SystemClock;
use biobin::advisory::guard::GuardedAdvisor;
use biobin::app::service::AppService;
use biobin::config::ThresholdConfig;
use biobin::fsm::{PhaseAction, ProcessPhase};
use biobin::history::CSV_HEADER;
use biobin::sample::SampleInput;

use crate::mocks::{FixedAdvisor, quiet_recommendation};

fn open(dir: &Path) -> AppService {
    AppService::open(
        Arc::new(FileStore::open(dir.join("state")).unwrap()),
        Box::new(FileSampleLog::open(dir.join("samples.jsonl")).unwrap()),
        GuardedAdvisor::new(
            Arc::new(FixedAdvisor(Ok(quiet_recommendation()))),
            Duration::from_secs(1),
        ),
        Arc::new(LogEventSink::new()),
        Arc::new(SystemClock),
    )
    .unwrap()
}

#[test]
fn fresh_directory_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(dir.path());
    assert_eq!(svc.phase(), ProcessPhase::Idle);
    assert_eq!(svc.thresholds(), ThresholdConfig::default());
    assert!(svc.latest().is_none());
    assert!(
        svc.actuators()
            .values()
            .all(|s| s.status == ActuatorStatus::Idle)
    );
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let custom = ThresholdConfig {
        temp_max: 50.0,
        gas_max: 2800,
        ..Default::default()
    };
    {
        let svc = open(dir.path());
        svc.update_thresholds(custom).unwrap();
        svc.control_process(PhaseAction::Start).unwrap();
        svc.ingest(&SampleInput::new(42.0, 47.0, 2300)).unwrap();
        svc.ingest(&SampleInput::new(43.0, 46.0, 2350).with_distance(5.0))
            .unwrap();
        svc.override_actuator(Actuator::Fan, true).unwrap();
        svc.control_process(PhaseAction::Pause).unwrap();
    }

    let svc = open(dir.path());
    assert_eq!(svc.phase(), ProcessPhase::Paused);
    assert_eq!(svc.thresholds(), custom);

    let fan = svc.actuator(Actuator::Fan);
    assert_eq!(fan.status, ActuatorStatus::Active);
    assert_eq!(fan.last_changed_by, ChangeSource::Manual);

    assert_eq!(svc.recent().len(), 2);
    assert_eq!(svc.latest().unwrap().distance, Some(5.0));

    let csv = svc.export_csv(None).unwrap();
    assert!(csv.starts_with(CSV_HEADER));
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn restart_cycle_clears_persisted_history() {
    let dir = tempfile::tempdir().unwrap();
    {
        let svc = open(dir.path());
        svc.control_process(PhaseAction::Start).unwrap();
        svc.ingest(&SampleInput::new(42.0, 47.0, 2300)).unwrap();
        svc.control_process(PhaseAction::Finish).unwrap();
        svc.control_process(PhaseAction::Restart).unwrap();
    }
    let svc = open(dir.path());
    assert_eq!(svc.phase(), ProcessPhase::Active);
    assert!(svc.progress().unwrap().is_none());
    assert_eq!(svc.export_csv(None).unwrap().lines().count(), 1);
}

#[test]
fn corrupted_state_record_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    {
        let svc = open(dir.path());
        svc.control_process(PhaseAction::Start).unwrap();
    }
    std::fs::write(dir.path().join("state").join("biobin").join("thresholds"), b"\xff").unwrap();
    let svc = open(dir.path());
    assert_eq!(svc.thresholds(), ThresholdConfig::default());
    assert_eq!(svc.phase(), ProcessPhase::Active);
}

#[test]
fn failed_history_reset_keeps_phase_and_samples() {
    let dir = tempfile::tempdir().unwrap();
    {
        let svc = open(dir.path());
        svc.ingest(&SampleInput::new(42.0, 47.0, 2300)).unwrap();
        std::fs::create_dir(dir.path().join("samples.jsonl.reset")).unwrap();

        assert!(svc.control_process(PhaseAction::Start).is_err());
        assert_eq!(svc.phase(), ProcessPhase::Idle);
        assert_eq!(svc.export_csv(None).unwrap().lines().count(), 2);
    }
    std::fs::remove_dir(dir.path().join("samples.jsonl.reset")).unwrap();

    let svc = open(dir.path());
    assert_eq!(svc.phase(), ProcessPhase::Idle);
    assert_eq!(svc.export_csv(None).unwrap().lines().count(), 2);
    svc.control_process(PhaseAction::Start).unwrap();
    assert_eq!(svc.export_csv(None).unwrap().lines().count(), 1);
}
