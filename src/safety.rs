//! Threshold policy.
//!
//! Maps a sample and the configured thresholds to a [`SafetyVerdict`]: the
//! actuators that *must* run regardless of what the advisory provider says.
//! Rules are evaluated independently and OR-combined per actuator:
//!
//! | Breach            | Condition                 | Forces               |
//! |-------------------|---------------------------|----------------------|
//! | `OverTemperature` | temperature > temp_max    | buzzer, fan, servo   |
//! | `LowHumidity`     | humidity < humidity_min   | pump, servo          |
//! | `GasHigh`         | gas > gas_max             | buzzer, fan, servo   |
//!
//! After the rules, the low-gas override runs: below [`SAFE_GAS_FLOOR`]
//! the buzzer and servo are cleared whatever requested them.  Fan and pump
//! are never touched by the override.
//!
//! The policy is a pure function; no I/O and no hidden state.

use core::fmt;

use crate::config::ThresholdConfig;
use crate::sample::{SAFE_GAS_FLOOR, Sample};

/// A threshold breach.  Accumulated as a bitmask in [`SafetyVerdict::breaches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Breach {
    OverTemperature = 0b0000_0001,
    LowHumidity = 0b0000_0010,
    GasHigh = 0b0000_0100,
}

impl Breach {
    /// Return the bitmask for this breach.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverTemperature => write!(f, "over temperature"),
            Self::LowHumidity => write!(f, "low humidity"),
            Self::GasHigh => write!(f, "gas high"),
        }
    }
}

/// Actuators the thresholds force on, plus the human-readable reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub force_buzzer: bool,
    pub force_servo: bool,
    pub force_pump: bool,
    pub force_fan: bool,
    /// Breach bitmask (see [`Breach::mask`]).
    pub breaches: u8,
    /// True when the low-gas override cleared buzzer and servo.
    pub gas_override: bool,
    pub reasons: Vec<String>,
}

impl SafetyVerdict {
    pub fn has_breach(&self, breach: Breach) -> bool {
        self.breaches & breach.mask() != 0
    }

    /// True if any actuator is forced on.
    pub fn forces_any(&self) -> bool {
        self.force_buzzer || self.force_servo || self.force_pump || self.force_fan
    }
}

/// Threshold policy.
pub struct ThresholdPolicy;

impl ThresholdPolicy {
    /// Evaluate every rule against `sample`.
    pub fn check(sample: &Sample, config: &ThresholdConfig) -> SafetyVerdict {
        let mut v = SafetyVerdict::default();

        // ── Temperature ───────────────────────────────────────────
        if sample.temperature > config.temp_max {
            v.breaches |= Breach::OverTemperature.mask();
            v.force_buzzer = true;
            v.force_fan = true;
            v.force_servo = true;
            v.reasons.push(format!(
                "temperature {:.1}°C above {:.1}°C: buzzer, fan and servo on",
                sample.temperature, config.temp_max
            ));
        }

        // ── Humidity ──────────────────────────────────────────────
        if sample.humidity < config.humidity_min {
            v.breaches |= Breach::LowHumidity.mask();
            v.force_pump = true;
            v.force_servo = true;
            v.reasons.push(format!(
                "humidity {:.1}% below {:.1}%: pump and servo on",
                sample.humidity, config.humidity_min
            ));
        }

        // ── Gas ───────────────────────────────────────────────────
        if sample.gas > config.gas_max {
            v.breaches |= Breach::GasHigh.mask();
            v.force_buzzer = true;
            v.force_fan = true;
            v.force_servo = true;
            v.reasons.push(format!(
                "gas {} above {}: buzzer, fan and servo on",
                sample.gas, config.gas_max
            ));
        }

        // ── Low-gas override (buzzer and servo only) ──────────────
        if sample.gas < SAFE_GAS_FLOOR {
            v.force_buzzer = false;
            v.force_servo = false;
            v.gas_override = true;
            v.reasons.push(format!(
                "override: gas {} < {SAFE_GAS_FLOOR}, safe; buzzer and servo off",
                sample.gas
            ));
        }

        v
    }
}
