//! The process transition table.
//!
//! Must stay in sync with the diagram in the [module docs](super).

use super::{PhaseAction, ProcessPhase};

/// One accepted `(from, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ProcessPhase,
    pub action: PhaseAction,
    pub to: ProcessPhase,
    /// Clear the historical sample log before entering `to`.
    pub resets_history: bool,
}

const fn row(
    from: ProcessPhase,
    action: PhaseAction,
    to: ProcessPhase,
    resets_history: bool,
) -> Transition {
    Transition {
        from,
        action,
        to,
        resets_history,
    }
}

pub static TRANSITIONS: [Transition; 5] = [
    row(ProcessPhase::Idle, PhaseAction::Start, ProcessPhase::Active, true),
    row(ProcessPhase::Active, PhaseAction::Pause, ProcessPhase::Paused, false),
    row(ProcessPhase::Active, PhaseAction::Finish, ProcessPhase::Finished, false),
    row(ProcessPhase::Paused, PhaseAction::Resume, ProcessPhase::Active, false),
    row(ProcessPhase::Finished, PhaseAction::Restart, ProcessPhase::Active, true),
];
