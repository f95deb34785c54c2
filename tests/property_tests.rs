//! Property tests for the decision rules and input handling.

use biobin::advisory::Recommendation;
use biobin::config::ThresholdConfig;
use biobin::control::engine::merge;
use biobin::fsm::{PhaseAction, ProcessPhase, lookup};
use biobin::safety::ThresholdPolicy;
use biobin::sample::{SAFE_GAS_FLOOR, Sample, SampleInput};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Value, json};

fn sample(temperature: f64, humidity: f64, gas: u32) -> Sample {
    Sample {
        timestamp: Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap(),
        temperature,
        humidity,
        gas,
        distance: None,
    }
}

fn arb_recommendation() -> impl Strategy<Value = Recommendation> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(servo, buzzer, pump, fan)| Recommendation {
            summary: "s".into(),
            advice: "a".into(),
            activate_servo: servo,
            activate_buzzer: buzzer,
            activate_pump: pump,
            activate_fan: fan,
        },
    )
}

fn decide(s: &Sample, c: &ThresholdConfig, rec: &Recommendation) -> (bool, bool, bool, bool) {
    merge(s.gas, &ThresholdPolicy::check(s, c), rec)
}

// ── Safety overrides ──────────────────────────────────────────

proptest! {
    #[test]
    fn gas_above_max_forces_buzzer_fan_servo(
        t in 0.0f64..80.0,
        h in 0.0f64..100.0,
        gas in 3001u32..=4095,
        rec in arb_recommendation(),
    ) {
        let (servo, buzzer, _, fan) =
            decide(&sample(t, h, gas), &ThresholdConfig::default(), &rec);
        prop_assert!(servo && buzzer && fan);
    }

    #[test]
    fn temperature_above_max_forces_fan(
        t in 55.1f64..90.0,
        h in 0.0f64..100.0,
        gas in 0u32..=4095,
        rec in arb_recommendation(),
    ) {
        let (_, _, _, fan) = decide(&sample(t, h, gas), &ThresholdConfig::default(), &rec);
        prop_assert!(fan);
    }

    #[test]
    fn low_gas_always_clears_buzzer_and_servo(
        t in -10.0f64..90.0,
        h in 0.0f64..100.0,
        gas in 0u32..SAFE_GAS_FLOOR,
        rec in arb_recommendation(),
    ) {
        let (servo, buzzer, pump, fan) =
            decide(&sample(t, h, gas), &ThresholdConfig::default(), &rec);
        prop_assert!(!servo && !buzzer);
        // Pump and fan still follow the recommendation.
        prop_assert!(!rec.activate_pump || pump);
        prop_assert!(!rec.activate_fan || fan);
    }

    #[test]
    fn dry_pile_forces_pump_and_servo(
        t in 0.0f64..80.0,
        h in 0.0f64..39.9,
        gas in SAFE_GAS_FLOOR..=4095,
        rec in arb_recommendation(),
    ) {
        let (servo, _, pump, _) = decide(&sample(t, h, gas), &ThresholdConfig::default(), &rec);
        prop_assert!(servo && pump);
    }

    #[test]
    fn recommendation_is_never_suppressed_above_floor(
        t in 35.0f64..55.0,
        h in 40.0f64..55.0,
        gas in SAFE_GAS_FLOOR..=3000,
        rec in arb_recommendation(),
    ) {
        let got = decide(&sample(t, h, gas), &ThresholdConfig::default(), &rec);
        prop_assert_eq!(
            got,
            (rec.activate_servo, rec.activate_buzzer, rec.activate_pump, rec.activate_fan)
        );
    }

    #[test]
    fn decision_is_deterministic(
        t in -20.0f64..100.0,
        h in 0.0f64..100.0,
        gas in 0u32..=4095,
        rec in arb_recommendation(),
    ) {
        let s = sample(t, h, gas);
        let c = ThresholdConfig::default();
        let first = ThresholdPolicy::check(&s, &c);
        let second = ThresholdPolicy::check(&s, &c);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(merge(gas, &first, &rec), merge(gas, &second, &rec));
    }
}

// ── Phase machine ─────────────────────────────────────────────

fn arb_action() -> impl Strategy<Value = PhaseAction> {
    prop_oneof![
        Just(PhaseAction::Start),
        Just(PhaseAction::Pause),
        Just(PhaseAction::Resume),
        Just(PhaseAction::Finish),
        Just(PhaseAction::Restart),
    ]
}

proptest! {
    /// Any action sequence walks only along table rows, a rejected action
    /// leaves the phase unchanged, and only Start/Restart reset history.
    #[test]
    fn phase_walk_follows_table(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut phase = ProcessPhase::Idle;
        for action in actions {
            match lookup(phase, action) {
                Ok(row) => {
                    prop_assert_eq!(row.from, phase);
                    prop_assert_eq!(
                        row.resets_history,
                        matches!(action, PhaseAction::Start | PhaseAction::Restart)
                    );
                    phase = row.to;
                }
                Err(e) => {
                    prop_assert_eq!(e.from, phase);
                    prop_assert_eq!(e.action, action);
                }
            }
        }
    }
}

// ── Input handling ────────────────────────────────────────────

fn arb_json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn parse_never_panics(text in ".{0,200}") {
        let _ = Recommendation::parse(&text);
    }

    #[test]
    fn parse_accepts_fenced_json(servo in any::<bool>(), fan in any::<bool>()) {
        let body = json!({"activate_servo": servo, "activate_fan": fan}).to_string();
        let fenced = format!("```json\n{body}\n```");
        let rec = Recommendation::parse(&fenced).unwrap();
        prop_assert_eq!(rec.activate_servo, servo);
        prop_assert_eq!(rec.activate_fan, fan);
        prop_assert!(!rec.activate_pump && !rec.activate_buzzer);
    }

    #[test]
    fn validation_accepts_or_names_fields(
        temperature in proptest::option::of(arb_json_scalar()),
        humidity in proptest::option::of(arb_json_scalar()),
        gas in proptest::option::of(arb_json_scalar()),
        distance in proptest::option::of(arb_json_scalar()),
    ) {
        let input = SampleInput { temperature, humidity, gas, distance };
        match input.validate() {
            Ok(reading) => {
                let s = reading.at(Utc::now());
                prop_assert!(s.temperature.is_finite() && s.humidity.is_finite());
            }
            Err(e) => {
                prop_assert!(!e.is_empty());
                for name in e.field_names() {
                    prop_assert!(["temperature", "humidity", "gas", "distance"].contains(&name));
                }
            }
        }
    }

    #[test]
    fn well_formed_input_always_validates(
        t in -40.0f64..120.0,
        h in 0.0f64..100.0,
        gas in 0u32..=4095,
    ) {
        let reading = SampleInput::new(t, h, gas).validate().unwrap();
        let s = reading.at(Utc::now());
        prop_assert_eq!(s.gas, gas);
        prop_assert!(s.distance.is_none());
    }
}
