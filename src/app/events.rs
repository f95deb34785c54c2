//! Outbound application events and read models.
//!
//! The [`AppService`](super::service::AppService) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log them, forward them to a
//! dashboard, append them to an audit trail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actuators::{Actuator, ActuatorState};
use crate::config::ThresholdConfig;
use crate::control::engine::Directive;
use crate::fsm::ProcessPhase;
use crate::history::ProgressReport;
use crate::sample::{GasLevel, Sample};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service opened its stores (carries the restored phase).
    Started(ProcessPhase),

    /// A sample passed validation and is durably stored.
    SampleStored(Sample),

    /// An automatic directive was applied to the actuators.
    DirectiveApplied(Directive),

    /// The advisory provider failed; its safe default was used.
    AdvisoryDegraded { summary: String },

    /// An operator set one actuator by hand.
    ActuatorOverridden { actuator: Actuator, active: bool },

    /// The process phase changed.
    PhaseChanged { from: ProcessPhase, to: ProcessPhase },

    /// The historical log was cleared for a new cycle.
    HistoryReset,

    /// New thresholds were validated and persisted.
    ThresholdsUpdated(ThresholdConfig),
}

/// Everything the dashboard shows, read in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub latest: Option<Sample>,
    pub gas_level: Option<GasLevel>,
    /// Percent full; `None` without a distance reading.
    pub fill_percent: Option<u8>,
    pub actuators: BTreeMap<Actuator, ActuatorState>,
    pub phase: ProcessPhase,
    pub thresholds: ThresholdConfig,
    pub last_directive: Option<Directive>,
    pub progress: Option<ProgressReport>,
}
