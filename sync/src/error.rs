use std::io;

use thiserror::Error;

use lockstep_session::SessionError;
use lockstep_shared::Tick;

/// Errors that can occur while building SessionSettings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A run-ahead window of zero would never let the simulation tick
    #[error("Run-ahead window must be at least one tick")]
    ZeroRunAhead,

    /// Actions must be scheduled beyond the run-ahead window
    #[error("Action schedule offset {schedule_offset} must be greater than the run-ahead window {run_ahead}")]
    ScheduleOffsetTooSmall { run_ahead: Tick, schedule_offset: Tick },

    /// Windows must fit inside half the circular tick range to compare correctly
    #[error("Action schedule offset {schedule_offset} must be less than half of the tick range")]
    ScheduleOffsetTooLarge { schedule_offset: Tick },
}

/// Errors that can occur while reading a synchronization message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncMessageError {
    #[error("Received an empty synchronization message")]
    EmptyMessage,

    #[error("Unknown synchronization message tag {tag}")]
    UnknownTag { tag: u8 },

    #[error("Truncated {kind} message: need {needed} bytes, have {have}")]
    Truncated {
        kind: &'static str,
        needed: usize,
        have: usize,
    },

    #[error("Could not decode the action payload")]
    UndecodableAction,
}

/// Errors that can occur while managing a SimulationManager
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Simulation manager has already been started")]
    AlreadyStarted,

    #[error("Simulation manager is not running")]
    NotRunning,

    #[error("Failed to open peer channel: {0}")]
    Session(#[from] SessionError),

    #[error("Failed to spawn simulation thread: {0}")]
    Io(#[from] io::Error),
}
