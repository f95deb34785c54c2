//! Concurrent ingestion, manual override and dashboard reads against one
//! shared service.

use std::thread;
use std::time::Duration;

use biobin::actuators::{Actuator, ActuatorStatus, ChangeSource};
use biobin::app::commands::Actuation;
use biobin::fsm::PhaseAction;
use biobin::sample::SampleInput;

use crate::mocks::{FixedAdvisor, GatedAdvisor, quiet_recommendation, service_with};

#[test]
fn manual_override_during_inflight_evaluation() {
    let (advisor, gate) = GatedAdvisor::new(quiet_recommendation());
    let fx = service_with(advisor, Duration::from_secs(10));
    fx.service.control_process(PhaseAction::Start).unwrap();

    let svc = fx.service.clone();
    let ingest = thread::spawn(move || svc.ingest(&SampleInput::new(45.0, 50.0, 2500)));

    // Automatic evaluation is now parked inside the advisory call.
    gate.entered.recv_timeout(Duration::from_secs(5)).unwrap();

    let before = fx.service.actuators();
    let pump = fx.service.override_actuator(Actuator::Pump, true).unwrap();
    assert_eq!(pump.status, ActuatorStatus::Active);
    assert_eq!(pump.last_changed_by, ChangeSource::Manual);

    let after = fx.service.actuators();
    for a in [Actuator::Servo, Actuator::Buzzer, Actuator::Fan] {
        assert_eq!(before[&a], after[&a], "{a} touched by manual pump override");
    }

    gate.release.send(()).unwrap();
    let ack = ingest.join().unwrap().unwrap();
    assert!(matches!(ack.actuation, Actuation::Applied { .. }));

    // The automatic apply finished last.
    let pump = fx.service.actuator(Actuator::Pump);
    assert_eq!(pump.status, ActuatorStatus::Idle);
    assert_eq!(pump.last_changed_by, ChangeSource::Automatic);
}

#[test]
fn manual_override_after_evaluation_wins() {
    let fx = service_with(
        FixedAdvisor(Ok(quiet_recommendation())),
        Duration::from_secs(1),
    );
    fx.service.control_process(PhaseAction::Start).unwrap();
    fx.service
        .ingest(&SampleInput::new(45.0, 50.0, 2500))
        .unwrap();
    fx.service.override_actuator(Actuator::Pump, true).unwrap();

    let pump = fx.service.actuator(Actuator::Pump);
    assert_eq!(pump.status, ActuatorStatus::Active);
    assert_eq!(pump.last_changed_by, ChangeSource::Manual);
}

#[test]
fn concurrent_ingest_and_reads_never_tear() {
    let fx = service_with(
        FixedAdvisor(Ok(quiet_recommendation())),
        Duration::from_secs(1),
    );
    fx.service.control_process(PhaseAction::Start).unwrap();

    let writers: Vec<_> = (0..4u32)
        .map(|w| {
            let svc = fx.service.clone();
            thread::spawn(move || {
                for i in 0..25u32 {
                    // Hot and dry: every automatic apply sets servo, pump and fan together.
                    svc.ingest(&SampleInput::new(60.0, 20.0, 2600 + w * 100 + i))
                        .unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let svc = fx.service.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let all = svc.actuators();
                let auto: Vec<_> = all
                    .values()
                    .filter(|s| s.last_changed_at.is_some())
                    .collect();
                // Automatic applies write all four at once: either none or all are set.
                assert!(auto.is_empty() || auto.len() == all.len());
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(fx.service.recent().len(), 100);
    assert_eq!(fx.service.progress().unwrap().unwrap().samples, 100);
}

#[test]
fn concurrent_phase_requests_serialize() {
    let fx = service_with(
        FixedAdvisor(Ok(quiet_recommendation())),
        Duration::from_secs(1),
    );
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = fx.service.clone();
            thread::spawn(move || svc.control_process(PhaseAction::Start).is_ok())
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(accepted, 1, "only one Idle -> Active transition may succeed");
}

#[test]
fn failed_override_write_changes_nothing() {
    let fx = service_with(
        FixedAdvisor(Ok(quiet_recommendation())),
        Duration::from_secs(1),
    );
    let before = fx.service.actuators();
    fx.storage.set_fail_writes(true);
    assert!(fx.service.override_actuator(Actuator::Servo, true).is_err());
    assert_eq!(fx.service.actuators(), before);
    assert_eq!(
        fx.sink
            .count(|e| matches!(e, biobin::app::events::AppEvent::ActuatorOverridden { .. })),
        0
    );

    fx.storage.set_fail_writes(false);
    fx.service.override_actuator(Actuator::Servo, true).unwrap();
    assert_eq!(
        fx.sink
            .count(|e| matches!(e, biobin::app::events::AppEvent::ActuatorOverridden { .. })),
        1
    );
}

#[test]
fn last_directive_matches_actuators_after_racing_ingests() {
    let fx = service_with(
        FixedAdvisor(Ok(quiet_recommendation())),
        Duration::from_secs(1),
    );
    fx.service.control_process(PhaseAction::Start).unwrap();

    let writers: Vec<_> = (0..4u32)
        .map(|w| {
            let svc = fx.service.clone();
            thread::spawn(move || {
                for i in 0..20u32 {
                    // Alternate between an all-idle and a hot, dry reading.
                    let input = if (w + i) % 2 == 0 {
                        SampleInput::new(45.0, 50.0, 2500)
                    } else {
                        SampleInput::new(60.0, 20.0, 2600)
                    };
                    svc.ingest(&input).unwrap();
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let last = fx.service.last_directive().unwrap();
    for (actuator, on) in last.settings() {
        assert_eq!(
            fx.service.actuator(actuator).status.is_active(),
            on,
            "{actuator} disagrees with the last recorded directive"
        );
    }
}
