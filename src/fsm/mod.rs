//! Composting-process state machine.
//!
//! Table-driven FSM with operator-triggered transitions only:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  TRANSITIONS                                             │
//! │  ┌──────────┬──────────┬──────────┬───────────────────┐  │
//! │  │ from     │ action   │ to       │ resets history    │  │
//! │  ├──────────┼──────────┼──────────┼───────────────────┤  │
//! │  │ Idle     │ start    │ Active   │ yes               │  │
//! │  │ Active   │ pause    │ Paused   │                   │  │
//! │  │ Active   │ finish   │ Finished │                   │  │
//! │  │ Paused   │ resume   │ Active   │                   │  │
//! │  │ Finished │ restart  │ Active   │ yes               │  │
//! │  └──────────┴──────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Any pair not in the table is rejected with a [`TransitionError`] and the
//! phase is left unchanged.  A transition that resets history persists the
//! new phase first and clears the sample log last.  If the phase write
//! fails nothing has been cleared; if the reset fails the old phase is
//! written back.  Either way a failed transition leaves both the phase and
//! the log as they were.

pub mod transitions;

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;
use crate::error::{Error, TransitionError};
use crate::persist;
use crate::store::SampleStore;
use transitions::{TRANSITIONS, Transition};

// ---------------------------------------------------------------------------
// Phase and action identity
// ---------------------------------------------------------------------------

/// Lifecycle phase of the current composting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProcessPhase {
    #[default]
    Idle = 0,
    Active = 1,
    Paused = 2,
    Finished = 3,
}

impl ProcessPhase {
    pub const COUNT: usize = 4;

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }

    /// Automatic actuation only runs in this phase.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ProcessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator request on the process-control boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseAction {
    Start,
    Pause,
    Resume,
    Finish,
    Restart,
}

impl PhaseAction {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Finish => "finish",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for PhaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Look up the table row for `(from, action)`.
pub fn lookup(from: ProcessPhase, action: PhaseAction) -> Result<&'static Transition, TransitionError> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.action == action)
        .ok_or(TransitionError { from, action })
}

/// Outcome of an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub from: ProcessPhase,
    pub to: ProcessPhase,
    pub history_reset: bool,
}

/// Holds the persisted current phase.  Transitions are serialized by the
/// internal lock; readers see either the old or the new phase, never a
/// phase whose side effects have not completed.
pub struct ProcessStateMachine {
    storage: Arc<dyn StoragePort>,
    current: Mutex<ProcessPhase>,
}

impl ProcessStateMachine {
    /// Restore the phase from storage (Idle if absent or unreadable).
    pub fn load(storage: Arc<dyn StoragePort>) -> Self {
        let phase: ProcessPhase = persist::load_record(storage.as_ref(), persist::KEY_PHASE);
        info!("process phase restored: {phase}");
        Self {
            storage,
            current: Mutex::new(phase),
        }
    }

    pub fn current(&self) -> ProcessPhase {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an operator action.
    ///
    /// 1. Check the table (reject → state unchanged).
    /// 2. Persist the new phase.
    /// 3. Reset `history` if the row says so; on failure restore the
    ///    persisted phase.
    /// 4. Update the in-memory phase.
    pub fn apply(&self, action: PhaseAction, history: &SampleStore) -> Result<PhaseChange, Error> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let from = *current;

        let row = lookup(from, action).inspect_err(|e| warn!("{e}"))?;

        persist::save_record(self.storage.as_ref(), persist::KEY_PHASE, &row.to)?;
        if row.resets_history {
            if let Err(e) = history.reset() {
                if let Err(restore) =
                    persist::save_record(self.storage.as_ref(), persist::KEY_PHASE, &from)
                {
                    error!("phase {from} not restored after failed reset: {restore}");
                }
                return Err(e.into());
            }
        }
        *current = row.to;

        info!("phase transition: {from} -> {} ({action})", row.to);
        Ok(PhaseChange {
            from,
            to: row.to,
            history_reset: row.resets_history,
        })
    }
}
