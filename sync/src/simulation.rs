/// A deterministic simulation, advanced one tick at a time.
///
/// Given the same actions at the same ticks, every instance must reach the
/// same state, as reported by [`Simulation::state_hash`].
pub trait Simulation: Send + Sized + 'static {
    type Action: SimulationAction<Self>;

    /// Advances the simulation by one tick
    fn tick(&mut self);

    /// Summary of the current state, equal across peers that are in sync
    fn state_hash(&self) -> i64;
}

/// An action that can be performed on a simulation of type `S`.
///
/// Actions are immutable values. Two actions with the same encoding must
/// behave identically.
pub trait SimulationAction<S>: Send + 'static {
    /// Performs this action on the given simulation
    fn execute(&self, simulation: &mut S);

    /// Encodes this action as a sequence of bytes
    fn encode(&self) -> Vec<u8>;

    /// Hash of the encoded action. Every peer computes the same value for the
    /// same action, so it is used to order actions due on the same tick.
    fn content_hash(&self) -> u32 {
        crc32c::crc32c(&self.encode())
    }
}
