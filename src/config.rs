//! Configuration parameters
//!
//! [`ThresholdConfig`] holds the operator-tunable safety thresholds and is
//! persisted in the state store.  [`ServiceConfig`] is the process-level
//! configuration read once at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Full-scale reading of the 12-bit gas ADC.
pub const GAS_ADC_MAX: u32 = 4095;

/// Depth of the bin in centimetres: a distance reading of 0 means full.
pub const DEFAULT_BIN_DEPTH_CM: f64 = 14.0;

// ───────────────────────────────────────────────────────────────
// Safety thresholds
// ───────────────────────────────────────────────────────────────

/// Safety thresholds read by the threshold policy.
///
/// Written only through the configuration boundary, which replaces all five
/// fields at once after [`ThresholdConfig::validate`] passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Lower comfort bound for pile temperature (°C).  Display only.
    pub temp_min: f64,
    /// Temperature above which the bin is cooled and mixed (°C).
    pub temp_max: f64,
    /// Humidity below which the pump waters the pile (%).
    pub humidity_min: f64,
    /// Upper comfort bound for humidity (%).  Display only.
    pub humidity_max: f64,
    /// Gas ADC reading above which the bin is vented and an alarm raised.
    pub gas_max: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temp_min: 35.0,
            temp_max: 55.0,
            humidity_min: 40.0,
            humidity_max: 55.0,
            gas_max: 3000,
        }
    }
}

impl ThresholdConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temps = [self.temp_min, self.temp_max];
        if temps.iter().any(|t| !t.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "temperature thresholds must be finite",
            ));
        }
        if self.temp_min >= self.temp_max {
            return Err(ConfigError::ValidationFailed(
                "temp_min must be < temp_max",
            ));
        }
        if !(0.0..=100.0).contains(&self.humidity_min)
            || !(0.0..=100.0).contains(&self.humidity_max)
        {
            return Err(ConfigError::ValidationFailed(
                "humidity thresholds must be 0–100",
            ));
        }
        if self.humidity_min >= self.humidity_max {
            return Err(ConfigError::ValidationFailed(
                "humidity_min must be < humidity_max",
            ));
        }
        if !(1..=GAS_ADC_MAX).contains(&self.gas_max) {
            return Err(ConfigError::ValidationFailed("gas_max must be 1–4095"));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Process configuration
// ───────────────────────────────────────────────────────────────

/// Advisory provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Provider URL.  `None` runs without a provider (every call degrades).
    pub endpoint: Option<String>,
    /// Upper bound on a single provider call (milliseconds).
    pub timeout_ms: u64,
    /// Token refill rate (calls per second).  0 disables rate limiting.
    pub rate_per_sec: u64,
    /// Token bucket capacity.
    pub burst: u64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 5000,
            rate_per_sec: 1,
            burst: 5,
        }
    }
}

/// Startup configuration for the `biobin` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding the state store and the sample log.
    pub data_dir: PathBuf,
    /// Bin depth used for the fill-level estimate (cm).
    pub bin_depth_cm: f64,
    pub advisory: AdvisoryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("biobin-data"),
            bin_depth_cm: DEFAULT_BIN_DEPTH_CM,
            advisory: AdvisoryConfig::default(),
        }
    }
}
