//! Actuator registry.
//!
//! Current state of the four actuators (servo, buzzer, pump, fan).  All four
//! states live in one persisted record, so every [`ActuatorRegistry::apply`]
//! is all-or-nothing: the new state set is built, written, and only then
//! swapped in.  A failed write leaves both the record and memory as they
//! were.  Applies are mutually exclusive; readers never see a torn set.

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, StoragePort};
use crate::error::StorageError;
use crate::persist;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Actuator {
    Servo = 0,
    Buzzer = 1,
    Pump = 2,
    Fan = 3,
}

impl Actuator {
    pub const COUNT: usize = 4;
    pub const ALL: [Self; Self::COUNT] = [Self::Servo, Self::Buzzer, Self::Pump, Self::Fan];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Servo => "servo",
            Self::Buzzer => "buzzer",
            Self::Pump => "pump",
            Self::Fan => "fan",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorStatus {
    Active,
    #[default]
    Idle,
}

impl ActuatorStatus {
    pub const fn from_bool(on: bool) -> Self {
        if on { Self::Active } else { Self::Idle }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Who issued the last change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    #[default]
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActuatorState {
    pub status: ActuatorStatus,
    pub last_changed_by: ChangeSource,
    /// `None` until the actuator is first set.
    pub last_changed_at: Option<DateTime<Utc>>,
}

/// What the bin device reads back when it polls: `{"status":"active"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub status: ActuatorStatus,
}

impl From<ActuatorState> for DeviceStatus {
    fn from(state: ActuatorState) -> Self {
        Self {
            status: state.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type StateSet = [ActuatorState; Actuator::COUNT];

pub struct ActuatorRegistry {
    storage: Arc<dyn StoragePort>,
    clock: Arc<dyn Clock>,
    states: Mutex<StateSet>,
}

impl ActuatorRegistry {
    /// Restore actuator states from storage (all idle if absent).
    pub fn load(storage: Arc<dyn StoragePort>, clock: Arc<dyn Clock>) -> Self {
        let states: StateSet = persist::load_record(storage.as_ref(), persist::KEY_ACTUATORS);
        Self {
            storage,
            clock,
            states: Mutex::new(states),
        }
    }

    /// Set each listed actuator to the given on/off status, tagged with
    /// `source` and the current time.  Unlisted actuators are untouched.
    ///
    /// Returns the full state set after the apply.
    pub fn apply(
        &self,
        settings: &[(Actuator, bool)],
        source: ChangeSource,
    ) -> Result<Vec<(Actuator, ActuatorState)>, StorageError> {
        self.apply_then(settings, source, || {})
    }

    /// [`apply`](Self::apply), then run `on_commit` before the registry lock
    /// is released.  `on_commit` runs only if the new states were stored, and
    /// anything it records is ordered exactly like the applies themselves.
    pub fn apply_then(
        &self,
        settings: &[(Actuator, bool)],
        source: ChangeSource,
        on_commit: impl FnOnce(),
    ) -> Result<Vec<(Actuator, ActuatorState)>, StorageError> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        let mut next = *states;
        for &(actuator, on) in settings {
            next[actuator.index()] = ActuatorState {
                status: ActuatorStatus::from_bool(on),
                last_changed_by: source,
                last_changed_at: Some(now),
            };
        }

        persist::save_record(self.storage.as_ref(), persist::KEY_ACTUATORS, &next)
            .inspect_err(|e| error!("actuator apply not persisted: {e}"))?;
        *states = next;
        on_commit();

        debug!("actuators applied ({source:?}): {settings:?}");
        Ok(Self::pairs(&next))
    }

    pub fn get(&self, actuator: Actuator) -> ActuatorState {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)[actuator.index()]
    }

    /// Every actuator with its state, in [`Actuator::ALL`] order.
    pub fn get_all(&self) -> Vec<(Actuator, ActuatorState)> {
        let states = *self.states.lock().unwrap_or_else(PoisonError::into_inner);
        Self::pairs(&states)
    }

    fn pairs(states: &StateSet) -> Vec<(Actuator, ActuatorState)> {
        Actuator::ALL.iter().map(|&a| (a, states[a.index()])).collect()
    }
}
