use std::fmt;

use lockstep_shared::Tick;

use crate::{
    error::SyncMessageError,
    message::read_tick,
    simulation::{Simulation, SimulationAction},
};

/// An action to be executed at a specific tick
pub struct SequencedAction<S: Simulation> {
    pub tick: Tick,
    pub action: S::Action,
}

impl<S: Simulation> SequencedAction<S> {
    pub fn new(tick: Tick, action: S::Action) -> Self {
        Self { tick, action }
    }

    /// `[tick: u32 BE][encoded action..]`
    pub fn encode(&self) -> Vec<u8> {
        let action = self.action.encode();
        let mut output = Vec::with_capacity(4 + action.len());
        output.extend_from_slice(&self.tick.to_be_bytes());
        output.extend_from_slice(&action);
        output
    }

    pub fn decode<D>(content: &[u8], decoder: D) -> Result<Self, SyncMessageError>
    where
        D: FnOnce(&[u8]) -> Option<S::Action>,
    {
        let (tick, action) = read_tick(content).ok_or(SyncMessageError::Truncated {
            kind: "sequenced action",
            needed: 4,
            have: content.len(),
        })?;
        let action = decoder(action).ok_or(SyncMessageError::UndecodableAction)?;
        Ok(Self { tick, action })
    }
}

impl<S: Simulation> Clone for SequencedAction<S>
where
    S::Action: Clone,
{
    fn clone(&self) -> Self {
        Self {
            tick: self.tick,
            action: self.action.clone(),
        }
    }
}

impl<S: Simulation> PartialEq for SequencedAction<S>
where
    S::Action: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.action == other.action
    }
}

impl<S: Simulation> fmt::Debug for SequencedAction<S>
where
    S::Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencedAction")
            .field("tick", &self.tick)
            .field("action", &self.action)
            .finish()
    }
}
