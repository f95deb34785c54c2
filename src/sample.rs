//! Sensor samples.
//!
//! A [`SampleInput`] is the payload the bin device posts.  Every field is
//! kept as a raw JSON value so validation can report *which* fields are
//! wrong instead of failing the whole decode.  A validated [`Reading`]
//! becomes an immutable [`Sample`] once it is timestamped by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Gas readings below this ADC value are considered definitely safe.
pub const SAFE_GAS_FLOOR: u32 = 2200;

/// Raw ingestion payload: `{temperature, humidity, gas, distance?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleInput {
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub humidity: Option<Value>,
    #[serde(default)]
    pub gas: Option<Value>,
    #[serde(default)]
    pub distance: Option<Value>,
}

impl SampleInput {
    /// Build a well-formed payload from typed values.
    pub fn new(temperature: f64, humidity: f64, gas: u32) -> Self {
        Self {
            temperature: Some(Value::from(temperature)),
            humidity: Some(Value::from(humidity)),
            gas: Some(Value::from(gas)),
            distance: None,
        }
    }

    #[must_use]
    pub fn with_distance(mut self, distance_cm: f64) -> Self {
        self.distance = Some(Value::from(distance_cm));
        self
    }

    /// Check that temperature, humidity and gas are present and numeric.
    /// Distance may be absent or `null`, but must be numeric when given.
    pub fn validate(&self) -> Result<Reading, ValidationError> {
        let mut errors = ValidationError::default();

        let temperature = required_number(self.temperature.as_ref(), "temperature", &mut errors);
        let humidity = required_number(self.humidity.as_ref(), "humidity", &mut errors);

        let gas = match number(self.gas.as_ref()) {
            Field::Missing => {
                errors.push("gas", "is missing");
                None
            }
            Field::NotNumeric => {
                errors.push("gas", "must be numeric");
                None
            }
            Field::Number(g) if g < 0.0 || g.fract() > 0.0 || g > f64::from(u32::MAX) => {
                errors.push("gas", "must be a non-negative whole number");
                None
            }
            Field::Number(g) => Some(g as u32),
        };

        let distance = match number(self.distance.as_ref()) {
            Field::Missing => None,
            Field::NotNumeric => {
                errors.push("distance", "must be numeric");
                None
            }
            Field::Number(d) if d < 0.0 || !d.is_finite() => {
                errors.push("distance", "must be a non-negative distance");
                None
            }
            Field::Number(d) => Some(d),
        };

        match (temperature, humidity, gas) {
            (Some(temperature), Some(humidity), Some(gas)) if errors.is_empty() => Ok(Reading {
                temperature,
                humidity,
                gas,
                distance,
            }),
            _ => Err(errors),
        }
    }
}

enum Field {
    Missing,
    NotNumeric,
    Number(f64),
}

fn number(value: Option<&Value>) -> Field {
    match value {
        None | Some(Value::Null) => Field::Missing,
        Some(Value::Number(n)) => n.as_f64().map_or(Field::NotNumeric, Field::Number),
        Some(_) => Field::NotNumeric,
    }
}

fn required_number(
    value: Option<&Value>,
    field: &'static str,
    errors: &mut ValidationError,
) -> Option<f64> {
    match number(value) {
        Field::Missing => {
            errors.push(field, "is missing");
            None
        }
        Field::NotNumeric => {
            errors.push(field, "must be numeric");
            None
        }
        Field::Number(v) if !v.is_finite() => {
            errors.push(field, "is out of range");
            None
        }
        Field::Number(v) => Some(v),
    }
}

/// A validated but not yet stored reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub gas: u32,
    pub distance: Option<f64>,
}

impl Reading {
    pub fn at(self, timestamp: DateTime<Utc>) -> Sample {
        Sample {
            timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            gas: self.gas,
            distance: self.distance,
        }
    }
}

/// One timestamped sensor reading.  Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    /// Pile temperature (°C).
    pub temperature: f64,
    /// Relative humidity (%).
    pub humidity: f64,
    /// Gas sensor ADC reading (0–4095).
    pub gas: u32,
    /// Distance from the lid sensor to the pile surface (cm).
    pub distance: Option<f64>,
}

impl Sample {
    pub fn gas_level(&self) -> GasLevel {
        GasLevel::classify(self.gas)
    }

    /// Fill level in percent: 0 cm is full, `bin_depth_cm` is empty.
    pub fn fill_percent(&self, bin_depth_cm: f64) -> Option<u8> {
        let distance = self.distance?;
        if bin_depth_cm <= 0.0 {
            return None;
        }
        let percent = ((1.0 - distance / bin_depth_cm) * 100.0).round();
        Some(percent.clamp(0.0, 100.0) as u8)
    }
}

/// Display banding of the gas reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasLevel {
    Safe,
    Caution,
    High,
    Dangerous,
}

impl GasLevel {
    pub fn classify(gas: u32) -> Self {
        match gas {
            g if g < SAFE_GAS_FLOOR => Self::Safe,
            g if g < 3000 => Self::Caution,
            g if g < 4000 => Self::High,
            _ => Self::Dangerous,
        }
    }
}
