//! # Lockstep Sync
//! Runs an identical deterministic simulation on every peer of a
//! lockstep-session, agreeing on which actions execute at which tick while
//! letting each peer run a bounded number of ticks ahead of the slowest one.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod message;
mod sequenced_action;
mod session_settings;
mod simulation;
mod simulation_manager;

pub use error::{SettingsError, SyncError, SyncMessageError};
pub use message::{SyncMessage, ACTION, PROGRESS};
pub use sequenced_action::SequencedAction;
pub use session_settings::SessionSettings;
pub use simulation::{Simulation, SimulationAction};
pub use simulation_manager::SimulationManager;
