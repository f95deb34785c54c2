//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the sample store, actuator registry, decision engine,
//! process state machine and thresholds.  It exposes one method per external
//! boundary; all I/O flows through the port traits it was opened with, so
//! the whole service is testable with in-memory adapters and stub advisors.
//!
//! ```text
//!   SampleLog ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  StoragePort ◀─▶│          AppService           │
//! AdvisoryClient ◀│ Store · Policy · Engine · FSM │
//!                 └──────────────────────────────┘
//! ```
//!
//! Every method takes `&self`; the service is shared between the ingestion
//! path, manual-control paths and dashboard readers.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{error, info};

use crate::actuators::{Actuator, ActuatorRegistry, ActuatorState, ChangeSource, DeviceStatus};
use crate::advisory::guard::GuardedAdvisor;
use crate::config::{DEFAULT_BIN_DEPTH_CM, ThresholdConfig};
use crate::control::engine::{DecisionEngine, Directive};
use crate::error::Error;
use crate::fsm::{PhaseAction, PhaseChange, ProcessPhase, ProcessStateMachine};
use crate::history::{self, ProgressReport};
use crate::persist;
use crate::sample::{Sample, SampleInput};
use crate::store::{DateRange, SampleStore};

use super::commands::{Actuation, AppCommand, AppResponse, IngestAck};
use super::events::{AppEvent, DashboardSnapshot};
use super::ports::{Clock, EventSink, SampleLog, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    storage: Arc<dyn StoragePort>,
    samples: SampleStore,
    actuators: Arc<ActuatorRegistry>,
    engine: DecisionEngine,
    process: ProcessStateMachine,
    /// Read-mostly; replaced whole under the write lock.
    thresholds: RwLock<ThresholdConfig>,
    sink: Arc<dyn EventSink>,
    bin_depth_cm: f64,
}

impl AppService {
    /// Open the service over its ports, restoring thresholds, phase and
    /// actuator states from `storage` (defaults where absent).
    pub fn open(
        storage: Arc<dyn StoragePort>,
        sample_log: Box<dyn SampleLog>,
        advisor: GuardedAdvisor,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let thresholds: ThresholdConfig =
            persist::load_record(storage.as_ref(), persist::KEY_THRESHOLDS);
        let samples = SampleStore::open(sample_log, Arc::clone(&clock))?;
        let actuators = Arc::new(ActuatorRegistry::load(Arc::clone(&storage), clock));
        let engine = DecisionEngine::new(advisor, Arc::clone(&actuators));
        let process = ProcessStateMachine::load(Arc::clone(&storage));

        let phase = process.current();
        sink.emit(&AppEvent::Started(phase));
        info!("AppService opened in phase {phase}");

        Ok(Self {
            storage,
            samples,
            actuators,
            engine,
            process,
            thresholds: RwLock::new(thresholds),
            sink,
            bin_depth_cm: DEFAULT_BIN_DEPTH_CM,
        })
    }

    /// Bin depth used for the fill-level estimate.
    #[must_use]
    pub fn with_bin_depth(mut self, cm: f64) -> Self {
        self.bin_depth_cm = cm;
        self
    }

    // ── Ingestion boundary ────────────────────────────────────

    /// Store a sample, then run the decision engine if the phase is Active.
    ///
    /// A validation or storage failure is returned and nothing is stored.
    /// Once the sample is stored the call succeeds; a failure to apply the
    /// directive is reported in [`IngestAck::actuation`].
    pub fn ingest(&self, input: &SampleInput) -> Result<IngestAck, Error> {
        let sample = self.samples.append(input)?;
        self.sink.emit(&AppEvent::SampleStored(sample));

        let phase = self.process.current();
        if !phase.is_active() {
            return Ok(IngestAck {
                sample,
                actuation: Actuation::Skipped { phase },
            });
        }

        let thresholds = self.thresholds();
        let actuation = match self.engine.evaluate(&sample, &thresholds, phase) {
            Ok(directive) => {
                if directive.advisory_degraded {
                    self.sink.emit(&AppEvent::AdvisoryDegraded {
                        summary: directive.recommendation_text.clone(),
                    });
                }
                self.sink.emit(&AppEvent::DirectiveApplied(directive.clone()));
                Actuation::Applied { directive }
            }
            Err(e) => {
                error!("directive not applied: {e}");
                Actuation::Failed {
                    reason: e.to_string(),
                }
            }
        };
        Ok(IngestAck { sample, actuation })
    }

    // ── Actuator status boundary ──────────────────────────────

    pub fn actuator(&self, actuator: Actuator) -> ActuatorState {
        self.actuators.get(actuator)
    }

    pub fn actuators(&self) -> BTreeMap<Actuator, ActuatorState> {
        self.actuators.get_all().into_iter().collect()
    }

    /// What the device reads when it polls an actuator.
    pub fn device_status(&self, actuator: Actuator) -> DeviceStatus {
        self.actuators.get(actuator).into()
    }

    /// Manual override of one actuator; other actuators are untouched.
    pub fn override_actuator(&self, actuator: Actuator, active: bool) -> Result<ActuatorState, Error> {
        let after = self
            .actuators
            .apply(&[(actuator, active)], ChangeSource::Manual)?;
        self.sink
            .emit(&AppEvent::ActuatorOverridden { actuator, active });
        Ok(after
            .into_iter()
            .find_map(|(a, s)| (a == actuator).then_some(s))
            .unwrap_or_default())
    }

    // ── Configuration boundary ────────────────────────────────

    pub fn thresholds(&self) -> ThresholdConfig {
        *self.thresholds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, persist, then swap in all five thresholds at once.
    pub fn update_thresholds(&self, new: ThresholdConfig) -> Result<(), Error> {
        new.validate()?;
        let mut current = self.thresholds.write().unwrap_or_else(PoisonError::into_inner);
        persist::save_record(self.storage.as_ref(), persist::KEY_THRESHOLDS, &new)?;
        *current = new;
        drop(current);

        info!("thresholds updated: {new:?}");
        self.sink.emit(&AppEvent::ThresholdsUpdated(new));
        Ok(())
    }

    // ── Process-control boundary ──────────────────────────────

    pub fn phase(&self) -> ProcessPhase {
        self.process.current()
    }

    pub fn control_process(&self, action: PhaseAction) -> Result<PhaseChange, Error> {
        let change = self.process.apply(action, &self.samples)?;
        if change.history_reset {
            self.sink.emit(&AppEvent::HistoryReset);
        }
        self.sink.emit(&AppEvent::PhaseChanged {
            from: change.from,
            to: change.to,
        });
        Ok(change)
    }

    // ── Historical query boundary ─────────────────────────────

    pub fn history(&self, range: &DateRange) -> Result<Vec<Sample>, Error> {
        Ok(self.samples.query(range)?)
    }

    /// CSV of `range`, or of the whole current cycle.
    pub fn export_csv(&self, range: Option<&DateRange>) -> Result<String, Error> {
        let samples = match range {
            Some(r) => self.samples.query(r)?,
            None => self.samples.all()?,
        };
        Ok(history::to_csv(&samples))
    }

    /// Progress of the current cycle; `None` before the first sample.
    pub fn progress(&self) -> Result<Option<ProgressReport>, Error> {
        Ok(ProgressReport::analyze(&self.samples.all()?))
    }

    // ── Read models ───────────────────────────────────────────

    pub fn latest(&self) -> Option<Sample> {
        self.samples.latest()
    }

    pub fn recent(&self) -> Vec<Sample> {
        self.samples.recent()
    }

    pub fn last_directive(&self) -> Option<Directive> {
        self.engine.last_directive()
    }

    pub fn dashboard(&self) -> Result<DashboardSnapshot, Error> {
        let latest = self.latest();
        Ok(DashboardSnapshot {
            latest,
            gas_level: latest.map(|s| s.gas_level()),
            fill_percent: latest.and_then(|s| s.fill_percent(self.bin_depth_cm)),
            actuators: self.actuators(),
            phase: self.phase(),
            thresholds: self.thresholds(),
            last_directive: self.last_directive(),
            progress: self.progress()?,
        })
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command and build its response.
    pub fn handle_command(&self, cmd: AppCommand) -> Result<AppResponse, Error> {
        let response = match cmd {
            AppCommand::Ingest(input) => AppResponse::Ingested(self.ingest(&input)?),
            AppCommand::GetActuator { actuator } => AppResponse::Actuator {
                actuator,
                state: self.actuator(actuator),
            },
            AppCommand::GetActuators => AppResponse::Actuators {
                actuators: self.actuators(),
            },
            AppCommand::PollActuator { actuator } => {
                AppResponse::DeviceStatus(self.device_status(actuator))
            }
            AppCommand::SetActuator { actuator, active } => AppResponse::Actuator {
                actuator,
                state: self.override_actuator(actuator, active)?,
            },
            AppCommand::GetThresholds => AppResponse::Thresholds(self.thresholds()),
            AppCommand::SetThresholds { thresholds } => {
                self.update_thresholds(thresholds)?;
                AppResponse::Thresholds(thresholds)
            }
            AppCommand::GetPhase => AppResponse::Phase {
                phase: self.phase(),
            },
            AppCommand::ControlProcess { action } => {
                AppResponse::PhaseChanged(self.control_process(action)?)
            }
            AppCommand::QueryHistory { range } => AppResponse::History {
                samples: self.history(&range)?,
            },
            AppCommand::ExportCsv { range } => AppResponse::Csv {
                csv: self.export_csv(range.as_ref())?,
            },
            AppCommand::Progress => AppResponse::Progress {
                report: self.progress()?,
            },
            AppCommand::Latest => AppResponse::Latest {
                sample: self.latest(),
            },
            AppCommand::Recent => AppResponse::Recent {
                samples: self.recent(),
            },
            AppCommand::Dashboard => AppResponse::Dashboard(Box::new(self.dashboard()?)),
        };
        Ok(response)
    }
}
