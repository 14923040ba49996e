use std::{thread, time::Duration};

use log::info;

use lockstep_sync::{Simulation, SimulationAction};

pub const JUMP: u8 = 101;
pub const FLIP: u8 = 102;

/// A simple simulation for easy debugging.
///
/// A counter ticks up or down depending on a toggle. Any participant can
/// "jump" the counter against its current direction, or flip the toggle.
pub struct StrangeSimulation {
    tag: String,
    toggle: bool,
    tick: u32,
    counter: i32,
    work_delay: Option<Duration>,
    random: fastrand::Rng,
    history: Option<Vec<i64>>,
}

impl StrangeSimulation {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            toggle: false,
            tick: 0,
            counter: 0,
            work_delay: None,
            random: fastrand::Rng::new(),
            history: None,
        }
    }

    /// Sleeps for a random time up to `max_delay` on every tick, to imitate
    /// a processor-intensive step
    pub fn with_work_delay(mut self, max_delay: Duration) -> Self {
        self.work_delay = Some(max_delay);
        self
    }

    /// Records the state hash after every tick
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    pub fn jump(&mut self, jump: i32) {
        info!("{}@{}: Jump: {}", self.tag, self.tick, jump);
        if self.toggle {
            self.counter = self.counter.wrapping_add(jump);
        } else {
            self.counter = self.counter.wrapping_sub(jump);
        }
    }

    pub fn flip(&mut self) {
        self.toggle = !self.toggle;
        info!("{}@{}: Toggle: {}", self.tag, self.tick, self.toggle);
    }

    pub fn counter(&self) -> i32 {
        self.counter
    }

    pub fn toggle(&self) -> bool {
        self.toggle
    }

    pub fn ticks(&self) -> u32 {
        self.tick
    }

    /// State hash after each tick, if recording was enabled
    pub fn history(&self) -> &[i64] {
        self.history.as_deref().unwrap_or(&[])
    }
}

impl Simulation for StrangeSimulation {
    type Action = StrangeAction;

    fn tick(&mut self) {
        if self.toggle {
            self.counter = self.counter.wrapping_sub(1);
        } else {
            self.counter = self.counter.wrapping_add(1);
        }

        if let Some(max_delay) = self.work_delay {
            let millis = u64::try_from(max_delay.as_millis()).unwrap_or(u64::MAX);
            thread::sleep(Duration::from_millis(self.random.u64(0..=millis)));
        }

        info!("{}@{}: Counter: {}", self.tag, self.tick, self.counter);
        self.tick += 1;

        let hash = self.state_hash();
        if let Some(history) = self.history.as_mut() {
            history.push(hash);
        }
    }

    fn state_hash(&self) -> i64 {
        let toggle_factor = if self.toggle { 17 } else { 11 };
        i64::from(self.counter ^ (31 * toggle_factor))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrangeAction {
    /// `[JUMP][amount: i32 BE]`
    Jump(i32),
    /// `[FLIP]`
    Flip,
}

impl SimulationAction<StrangeSimulation> for StrangeAction {
    fn execute(&self, simulation: &mut StrangeSimulation) {
        match self {
            StrangeAction::Jump(amount) => simulation.jump(*amount),
            StrangeAction::Flip => simulation.flip(),
        }
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            StrangeAction::Jump(amount) => {
                let mut output = Vec::with_capacity(5);
                output.push(JUMP);
                output.extend_from_slice(&amount.to_be_bytes());
                output
            }
            StrangeAction::Flip => vec![FLIP],
        }
    }
}

/// Maps the leading byte of an encoded action to its decode routine
pub fn decode_action(content: &[u8]) -> Option<StrangeAction> {
    let (&tag, rest) = content.split_first()?;
    match tag {
        JUMP => {
            let (amount, _) = rest.split_first_chunk::<4>()?;
            Some(StrangeAction::Jump(i32::from_be_bytes(*amount)))
        }
        FLIP => Some(StrangeAction::Flip),
        _ => None,
    }
}
