//! Inbound commands and their responses.
//!
//! These represent requests from the outside world (device posts, operator
//! dashboard, export jobs) that the [`AppService`](super::service::AppService)
//! interprets.  Both enums are JSON-tagged by `"type"`, so one line of the
//! binary's line protocol is one command:
//!
//! ```text
//! {"type":"ingest","temperature":41.2,"humidity":48,"gas":2310,"distance":6.5}
//! {"type":"set_actuator","actuator":"pump","active":true}
//! {"type":"control_process","action":"start"}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actuators::{Actuator, ActuatorState, DeviceStatus};
use crate::config::ThresholdConfig;
use crate::control::engine::Directive;
use crate::fsm::{PhaseAction, PhaseChange, ProcessPhase};
use crate::history::ProgressReport;
use crate::sample::{Sample, SampleInput};
use crate::store::DateRange;

use super::events::DashboardSnapshot;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppCommand {
    /// A sensor reading posted by the bin device.
    Ingest(SampleInput),

    /// Full state of one actuator.
    GetActuator { actuator: Actuator },

    /// Full state of every actuator.
    GetActuators,

    /// Device poll: just `{"status": ...}` for one actuator.
    PollActuator { actuator: Actuator },

    /// Manual override of one actuator.
    SetActuator { actuator: Actuator, active: bool },

    GetThresholds,

    /// Replace all five thresholds at once.
    SetThresholds { thresholds: ThresholdConfig },

    GetPhase,

    /// Operator lifecycle request (start, pause, resume, finish, restart).
    ControlProcess { action: PhaseAction },

    /// Samples within an inclusive date range.
    QueryHistory { range: DateRange },

    /// CSV of a date range, or of the full history when `range` is absent.
    ExportCsv {
        #[serde(default)]
        range: Option<DateRange>,
    },

    Progress,
    Latest,
    Recent,
    Dashboard,
}

/// Outcome of the decision step of an ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Actuation {
    /// Phase was not Active; no directive computed.
    Skipped { phase: ProcessPhase },
    Applied { directive: Directive },
    /// The directive could not be applied.  The sample is still stored.
    Failed { reason: String },
}

/// Acknowledgment of an accepted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestAck {
    /// The sample as stored, with its assigned timestamp.
    pub sample: Sample,
    pub actuation: Actuation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppResponse {
    Ingested(IngestAck),
    Actuator {
        actuator: Actuator,
        state: ActuatorState,
    },
    Actuators {
        actuators: BTreeMap<Actuator, ActuatorState>,
    },
    DeviceStatus(DeviceStatus),
    Thresholds(ThresholdConfig),
    Phase {
        phase: ProcessPhase,
    },
    PhaseChanged(PhaseChange),
    History {
        samples: Vec<Sample>,
    },
    Csv {
        csv: String,
    },
    Progress {
        report: Option<ProgressReport>,
    },
    Latest {
        sample: Option<Sample>,
    },
    Recent {
        samples: Vec<Sample>,
    },
    Dashboard(Box<DashboardSnapshot>),
}
