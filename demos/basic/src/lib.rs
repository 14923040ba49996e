mod app;
mod strange_simulation;

pub use app::{App, AppConfig, AppError};
pub use strange_simulation::{decode_action, StrangeAction, StrangeSimulation, FLIP, JUMP};
