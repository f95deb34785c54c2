//! Cycle history: progress analysis and CSV export.

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Mean gas below which the pile is considered to be maturing.
pub const MATURING_GAS_MEAN: f64 = 2500.0;
/// Mean temperature above which the pile is considered active (°C).
pub const ACTIVE_TEMP_MEAN: f64 = 35.0;
/// Mean gas above which decomposition is running too fast.
pub const FAST_DECAY_GAS_MEAN: f64 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    /// Low gas in a warm pile: compost expected to mature within a week.
    OnTrack,
    /// Gas persistently high: check aeration and moisture.
    DecayingTooFast,
    InProgress,
}

impl Assessment {
    pub const fn message(self) -> &'static str {
        match self {
            Self::OnTrack => "Composting is on track; maturity expected in under a week.",
            Self::DecayingTooFast => "Decomposition is too fast; check aeration and moisture.",
            Self::InProgress => "Composting in progress.",
        }
    }
}

/// Means over the current cycle plus an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub samples: usize,
    pub mean_temperature: f64,
    pub mean_humidity: f64,
    pub mean_gas: f64,
    pub assessment: Assessment,
}

impl ProgressReport {
    /// `None` for an empty history.
    pub fn analyze(samples: &[Sample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let (t, h, g) = samples.iter().fold((0.0f64, 0.0f64, 0.0f64), |(t, h, g), s| {
            (
                t + s.temperature,
                h + s.humidity,
                g + f64::from(s.gas),
            )
        });
        let mean_temperature = t / n;
        let mean_humidity = h / n;
        let mean_gas = g / n;

        let assessment = if mean_gas < MATURING_GAS_MEAN && mean_temperature > ACTIVE_TEMP_MEAN {
            Assessment::OnTrack
        } else if mean_gas > FAST_DECAY_GAS_MEAN {
            Assessment::DecayingTooFast
        } else {
            Assessment::InProgress
        };

        Some(Self {
            samples: samples.len(),
            mean_temperature,
            mean_humidity,
            mean_gas,
            assessment,
        })
    }
}

pub const CSV_HEADER: &str = "timestamp,temperature,humidity,gas,distance";

/// Render `samples` as CSV, one row per sample after [`CSV_HEADER`].
pub fn to_csv(samples: &[Sample]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + samples.len() * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for s in samples {
        let _ = write!(
            out,
            "{},{},{},{},",
            s.timestamp.to_rfc3339(),
            s.temperature,
            s.humidity,
            s.gas
        );
        if let Some(d) = s.distance {
            let _ = write!(out, "{d}");
        }
        out.push('\n');
    }
    out
}
