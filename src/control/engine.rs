//! Decision engine.
//!
//! One evaluation, in fixed order:
//!
//! ```text
//!   phase ≠ Active ──▶ all-idle Directive, nothing applied
//!   ThresholdPolicy::check ──┐
//!   GuardedAdvisor::consult ─┴─▶ merge ──▶ ActuatorRegistry::apply(Automatic)
//! ```
//!
//! The safety verdict is computed before, and independently of, the
//! advisory call; a slow or failing provider only ever costs the
//! recommendation, never a safety-triggered activation.

use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::actuators::{Actuator, ActuatorRegistry, ChangeSource};
use crate::advisory::Recommendation;
use crate::advisory::guard::GuardedAdvisor;
use crate::config::ThresholdConfig;
use crate::error::Error;
use crate::fsm::ProcessPhase;
use crate::safety::{SafetyVerdict, ThresholdPolicy};
use crate::sample::{SAFE_GAS_FLOOR, Sample};

/// Separator between rationale parts.
const RATIONALE_SEP: &str = " | ";

/// Final on/off decision for all four actuators plus the explanation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directive {
    pub servo: bool,
    pub buzzer: bool,
    pub pump: bool,
    pub fan: bool,
    /// Safety reasons followed by the provider's advice.
    pub rationale: String,
    /// The provider's summary of the current condition.
    pub recommendation_text: String,
    /// The provider failed and its safe default was used.
    pub advisory_degraded: bool,
}

impl Directive {
    /// Everything off; returned outside the Active phase.
    pub fn idle() -> Self {
        Self::default()
    }

    /// The four settings in [`Actuator::ALL`] order, ready for the registry.
    pub fn settings(&self) -> [(Actuator, bool); Actuator::COUNT] {
        [
            (Actuator::Servo, self.servo),
            (Actuator::Buzzer, self.buzzer),
            (Actuator::Pump, self.pump),
            (Actuator::Fan, self.fan),
        ]
    }

    pub fn is_idle(&self) -> bool {
        !(self.servo || self.buzzer || self.pump || self.fan)
    }
}

/// Combine the provider's recommendation with the safety verdict.
///
/// Each actuator is `recommended OR forced`; buzzer and servo are then
/// cleared when `gas` is below the safe floor, whoever asked for them.
pub fn merge(gas: u32, verdict: &SafetyVerdict, rec: &Recommendation) -> (bool, bool, bool, bool) {
    let mut servo = rec.activate_servo || verdict.force_servo;
    let mut buzzer = rec.activate_buzzer || verdict.force_buzzer;
    let pump = rec.activate_pump || verdict.force_pump;
    let fan = rec.activate_fan || verdict.force_fan;

    if gas < SAFE_GAS_FLOOR {
        servo = false;
        buzzer = false;
    }
    (servo, buzzer, pump, fan)
}

pub struct DecisionEngine {
    advisor: GuardedAdvisor,
    actuators: Arc<ActuatorRegistry>,
    /// Written inside the registry's critical section, so it always
    /// describes the most recent automatic apply.
    last: Mutex<Option<Directive>>,
}

impl DecisionEngine {
    pub fn new(advisor: GuardedAdvisor, actuators: Arc<ActuatorRegistry>) -> Self {
        Self {
            advisor,
            actuators,
            last: Mutex::new(None),
        }
    }

    /// Directive of the most recent successful automatic apply.
    pub fn last_directive(&self) -> Option<Directive> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Compute the directive for `sample` and apply it.
    ///
    /// Only a registry write failure is an error; provider trouble shows up
    /// as [`Directive::advisory_degraded`].
    pub fn evaluate(
        &self,
        sample: &Sample,
        config: &ThresholdConfig,
        phase: ProcessPhase,
    ) -> Result<Directive, Error> {
        if !phase.is_active() {
            return Ok(Directive::idle());
        }

        let verdict = ThresholdPolicy::check(sample, config);
        let consultation =
            self.advisor
                .consult(sample.temperature, sample.humidity, sample.gas);
        let rec = &consultation.recommendation;

        let (servo, buzzer, pump, fan) = merge(sample.gas, &verdict, rec);

        let mut parts = verdict.reasons.clone();
        parts.push(rec.advice.clone());
        let directive = Directive {
            servo,
            buzzer,
            pump,
            fan,
            rationale: parts.join(RATIONALE_SEP),
            recommendation_text: rec.summary.clone(),
            advisory_degraded: consultation.is_degraded(),
        };

        self.actuators
            .apply_then(&directive.settings(), ChangeSource::Automatic, || {
                *self.last.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(directive.clone());
            })?;

        if verdict.breaches != 0 {
            warn!(
                "thresholds breached (0b{:08b}): {}",
                verdict.breaches,
                verdict.reasons.join("; ")
            );
        }
        info!(
            "directive: servo={} buzzer={} pump={} fan={}{}",
            directive.servo,
            directive.buzzer,
            directive.pump,
            directive.fan,
            if directive.advisory_degraded { " (advisory degraded)" } else { "" }
        );
        Ok(directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuators::ActuatorStatus;
    use crate::adapters::memory::MemoryStore;
    use crate::adapters::time::FixedClock;
    use crate::advisory::AdvisoryError;
    use crate::app::ports::AdvisoryClient;
    use chrono::Utc;
    use std::time::Duration;

    struct Stub(Result<Recommendation, AdvisoryError>);

    impl AdvisoryClient for Stub {
        fn analyze(&self, _: f64, _: f64, _: u32) -> Result<Recommendation, AdvisoryError> {
            self.0.clone()
        }
    }

    fn all_on() -> Recommendation {
        Recommendation {
            summary: "act".into(),
            advice: "run everything".into(),
            activate_servo: true,
            activate_buzzer: true,
            activate_pump: true,
            activate_fan: true,
        }
    }

    fn engine(answer: Result<Recommendation, AdvisoryError>) -> (DecisionEngine, Arc<ActuatorRegistry>) {
        let registry = Arc::new(ActuatorRegistry::load(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock::epoch()),
        ));
        let advisor = GuardedAdvisor::new(Arc::new(Stub(answer)), Duration::from_secs(1));
        (DecisionEngine::new(advisor, registry.clone()), registry)
    }

    fn sample(temperature: f64, humidity: f64, gas: u32) -> Sample {
        Sample {
            timestamp: Utc::now(),
            temperature,
            humidity,
            gas,
            distance: None,
        }
    }

    #[test]
    fn inactive_phase_is_a_noop() {
        let (engine, registry) = engine(Ok(all_on()));
        for phase in [ProcessPhase::Idle, ProcessPhase::Paused, ProcessPhase::Finished] {
            let d = engine
                .evaluate(&sample(60.0, 20.0, 3900), &ThresholdConfig::default(), phase)
                .unwrap();
            assert_eq!(d, Directive::idle());
        }
        assert!(
            registry
                .get_all()
                .iter()
                .all(|(_, s)| s.last_changed_at.is_none())
        );
    }

    #[test]
    fn last_directive_tracks_committed_applies_only() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ActuatorRegistry::load(
            store.clone(),
            Arc::new(FixedClock::epoch()),
        ));
        let advisor = GuardedAdvisor::new(Arc::new(Stub(Ok(all_on()))), Duration::from_secs(1));
        let engine = DecisionEngine::new(advisor, registry);
        assert!(engine.last_directive().is_none());

        let first = engine
            .evaluate(&sample(45.0, 50.0, 2500), &ThresholdConfig::default(), ProcessPhase::Active)
            .unwrap();
        assert_eq!(engine.last_directive(), Some(first.clone()));

        store.set_fail_writes(true);
        assert!(
            engine
                .evaluate(&sample(45.0, 50.0, 1500), &ThresholdConfig::default(), ProcessPhase::Active)
                .is_err()
        );
        assert_eq!(engine.last_directive(), Some(first));
    }

    #[test]
    fn hot_but_low_gas_runs_fan_only() {
        let (engine, registry) = engine(Err(AdvisoryError::Timeout));
        let d = engine
            .evaluate(&sample(60.0, 50.0, 1000), &ThresholdConfig::default(), ProcessPhase::Active)
            .unwrap();
        assert!(d.fan);
        assert!(!d.buzzer && !d.servo && !d.pump);
        assert_eq!(registry.get(Actuator::Fan).status, ActuatorStatus::Active);
        assert_eq!(registry.get(Actuator::Servo).status, ActuatorStatus::Idle);
    }

    #[test]
    fn recommendation_is_ored_in() {
        let (engine, _) = engine(Ok(all_on()));
        let d = engine
            .evaluate(&sample(45.0, 50.0, 2500), &ThresholdConfig::default(), ProcessPhase::Active)
            .unwrap();
        assert!(d.servo && d.buzzer && d.pump && d.fan);
        assert!(!d.advisory_degraded);
        assert_eq!(d.recommendation_text, "act");
        assert_eq!(d.rationale, "run everything");
    }

    #[test]
    fn low_gas_clears_recommended_buzzer_and_servo() {
        let (engine, _) = engine(Ok(all_on()));
        let d = engine
            .evaluate(&sample(45.0, 50.0, 1500), &ThresholdConfig::default(), ProcessPhase::Active)
            .unwrap();
        assert!(!d.buzzer && !d.servo);
        assert!(d.pump && d.fan);
    }

    #[test]
    fn degraded_advisory_keeps_safety_activation() {
        let (engine, _) = engine(Err(AdvisoryError::Unavailable("down".into())));
        let d = engine
            .evaluate(&sample(45.0, 30.0, 3500), &ThresholdConfig::default(), ProcessPhase::Active)
            .unwrap();
        assert!(d.servo && d.buzzer && d.pump && d.fan);
        assert!(d.advisory_degraded);
        assert!(d.rationale.ends_with(crate::advisory::PARSE_FAILED_ADVICE));
    }

    #[test]
    fn registry_failure_is_reported() {
        let kv = Arc::new(MemoryStore::new());
        let registry = Arc::new(ActuatorRegistry::load(kv.clone(), Arc::new(FixedClock::epoch())));
        let advisor = GuardedAdvisor::new(Arc::new(Stub(Ok(all_on()))), Duration::from_secs(1));
        let engine = DecisionEngine::new(advisor, registry);
        kv.set_fail_writes(true);
        let err = engine
            .evaluate(&sample(45.0, 50.0, 2500), &ThresholdConfig::default(), ProcessPhase::Active)
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
