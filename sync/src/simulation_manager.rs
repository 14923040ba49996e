use std::{
    collections::HashMap,
    mem,
    net::SocketAddr,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak},
    thread::{self, JoinHandle},
};

use log::{debug, info, trace, warn};

use lockstep_session::{ChannelBinding, NetworkSession};
use lockstep_shared::{StopAndWaitChannel, Tick, WrappingNumber};

use crate::{
    error::SyncError,
    message::SyncMessage,
    sequenced_action::SequencedAction,
    session_settings::SessionSettings,
    simulation::{Simulation, SimulationAction},
};

type ActionDecoder<A> = Box<dyn Fn(&[u8]) -> Option<A> + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

struct ManagerState<S: Simulation> {
    lifecycle: Lifecycle,
    tick: Tick,
    // the actions due on `tick` have been taken by the run loop
    executing: bool,
    peer_progress: HashMap<SocketAddr, Tick>,
    peer_bindings: Vec<ChannelBinding>,
    actions: Vec<SequencedAction<S>>,
    // held here until the run loop takes it over
    simulation: Option<S>,
}

impl<S: Simulation> ManagerState<S> {
    /// The lowest tick across this peer and every other
    fn lowest_tick(&self) -> Tick {
        self.peer_progress
            .values()
            .fold(self.tick, |lowest, &tick| {
                if lowest.is_more_recent(tick) {
                    tick
                } else {
                    lowest
                }
            })
    }

    fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// Whether an action for `tick` can still be executed here
    fn accepts(&self, tick: Tick) -> bool {
        tick.is_more_recent(self.tick) || (tick == self.tick && !self.executing)
    }
}

struct ManagerInner<S: Simulation> {
    session: Arc<NetworkSession>,
    settings: SessionSettings,
    decoder: ActionDecoder<S::Action>,
    state: Mutex<ManagerState<S>>,
    progressed: Condvar,
}

impl<S: Simulation> ManagerInner<S> {
    fn lock_state(&self) -> MutexGuard<'_, ManagerState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The tick this peer may safely run up to
    fn target_tick(&self, state: &ManagerState<S>) -> Tick {
        state.lowest_tick().wrapping_sum(self.settings.run_ahead())
    }

    /// Must be called with the state lock held, so every peer sees messages
    /// in the order the state changed
    fn broadcast(&self, state: &ManagerState<S>, message: &[u8]) {
        for binding in &state.peer_bindings {
            if let Err(error) = self.session.send(binding, message) {
                warn!("@{}: Failed to send to {}: {}", state.tick, binding, error);
            }
        }
    }

    fn handle_message(&self, peer: SocketAddr, content: &[u8]) {
        let mut state = self.lock_state();
        if !state.is_running() {
            return;
        }

        match SyncMessage::read(content) {
            Ok(SyncMessage::Progress { tick }) => {
                trace!("@{}: {} has reportedly reached {}", state.tick, peer, tick);
                if let Some(progress) = state.peer_progress.get_mut(&peer) {
                    *progress = tick;
                    self.progressed.notify_all();
                }
            }
            Ok(SyncMessage::Action { sequenced_action }) => {
                let decoded =
                    SequencedAction::<S>::decode(sequenced_action, |action| (self.decoder)(action));
                match decoded {
                    // already executed, or being executed, the tick can no longer take it
                    Ok(action) if !state.accepts(action.tick) => {
                        warn!(
                            "@{}: Dropping action for {} from {}, its tick has passed",
                            state.tick, action.tick, peer
                        );
                    }
                    Ok(action) => {
                        debug!(
                            "@{}: Received action for {} from {}",
                            state.tick, action.tick, peer
                        );
                        state.actions.push(action);
                    }
                    Err(error) => {
                        warn!("@{}: Could not read action from {}: {}", state.tick, peer, error)
                    }
                }
            }
            Err(error) => warn!("@{}: Could not parse message from {}: {}", state.tick, peer, error),
        }
    }
}

/// Keeps a simulation in lockstep with the same simulation on every peer.
///
/// Actions are relayed to all peers and scheduled for a tick far enough ahead
/// that every peer receives them in time. The simulation runs on its own
/// thread, never more than `run_ahead` ticks ahead of the slowest peer.
pub struct SimulationManager<S: Simulation> {
    inner: Arc<ManagerInner<S>>,
    run_thread: Mutex<Option<JoinHandle<S>>>,
}

impl<S: Simulation> SimulationManager<S> {
    /// `decoder` turns a received action encoding back into an action, or
    /// returns `None` if it is not a valid encoding
    pub fn new<D>(
        session: Arc<NetworkSession>,
        settings: SessionSettings,
        decoder: D,
        simulation: S,
    ) -> Self
    where
        D: Fn(&[u8]) -> Option<S::Action> + Send + Sync + 'static,
    {
        let peer_progress = settings.peers().iter().map(|peer| (*peer, 0)).collect();

        Self {
            inner: Arc::new(ManagerInner {
                session,
                settings,
                decoder: Box::new(decoder),
                state: Mutex::new(ManagerState {
                    lifecycle: Lifecycle::Idle,
                    tick: 0,
                    executing: false,
                    peer_progress,
                    peer_bindings: Vec::new(),
                    actions: Vec::new(),
                    simulation: Some(simulation),
                }),
                progressed: Condvar::new(),
            }),
            run_thread: Mutex::new(None),
        }
    }

    /// Opens a reliable channel to every peer and starts the run loop.
    /// The session must already be running.
    ///
    /// If a channel cannot be opened, the ones already opened are
    /// disconnected again and the manager stays idle, so `start` can be
    /// retried.
    pub fn start(&self) -> Result<(), SyncError> {
        let simulation = {
            let mut state = self.inner.lock_state();
            if state.lifecycle != Lifecycle::Idle {
                return Err(SyncError::AlreadyStarted);
            }
            // running before any channel exists, so no early message is dropped
            state.lifecycle = Lifecycle::Running;

            for &peer in self.inner.settings.peers() {
                let binding = ChannelBinding::new(peer, self.inner.settings.channel_code());
                let weak_inner: Weak<ManagerInner<S>> = Arc::downgrade(&self.inner);
                let connected = self.inner.session.connect(
                    binding,
                    StopAndWaitChannel::create,
                    move |message: Vec<u8>| {
                        if let Some(inner) = weak_inner.upgrade() {
                            inner.handle_message(peer, &message);
                        }
                    },
                );
                if let Err(error) = connected {
                    state.lifecycle = Lifecycle::Idle;
                    state.actions.clear();
                    state.peer_progress.values_mut().for_each(|tick| *tick = 0);
                    let opened = mem::take(&mut state.peer_bindings);
                    // disconnecting joins listener workers, which take the state lock
                    drop(state);
                    for binding in &opened {
                        if let Err(error) = self.inner.session.disconnect(binding) {
                            warn!("Failed to disconnect {}: {}", binding, error);
                        }
                    }
                    return Err(error.into());
                }

                state.peer_bindings.push(binding);
                state.peer_progress.insert(peer, 0);
            }

            match state.simulation.take() {
                Some(simulation) => simulation,
                None => return Err(SyncError::AlreadyStarted),
            }
        };

        let inner = self.inner.clone();
        let handle = thread::Builder::new()
            .name("lockstep-sync".to_string())
            .spawn(move || run_loop(inner, simulation))?;
        *self
            .run_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        info!("Simulation manager started");
        Ok(())
    }

    /// Schedules an action on every peer, returning the tick it will run on.
    ///
    /// The tick is `schedule_offset` past the slowest peer, beyond the
    /// run-ahead window, so no peer can have passed it yet.
    pub fn submit_action(&self, action: S::Action) -> Result<Tick, SyncError> {
        let mut state = self.inner.lock_state();
        if !state.is_running() {
            return Err(SyncError::NotRunning);
        }

        let tick = state
            .lowest_tick()
            .wrapping_sum(self.inner.settings.schedule_offset());
        let action: SequencedAction<S> = SequencedAction::new(tick, action);
        let message = SyncMessage::Action {
            sequenced_action: &action.encode(),
        }
        .write();

        debug!("@{}: Submitting action for {}", state.tick, tick);
        state.actions.push(action);
        self.inner.broadcast(&state, &message);

        Ok(tick)
    }

    /// Stops the run loop and returns the simulation. Pending actions are
    /// discarded. Closing the peer channels is left to the session.
    pub fn stop(&self) -> Option<S> {
        {
            let mut state = self.inner.lock_state();
            match state.lifecycle {
                Lifecycle::Stopped => return None,
                Lifecycle::Idle => {
                    state.lifecycle = Lifecycle::Stopped;
                    return state.simulation.take();
                }
                Lifecycle::Running => {
                    state.lifecycle = Lifecycle::Stopped;
                    state.actions.clear();
                    self.inner.progressed.notify_all();
                }
            }
        }

        let handle = self
            .run_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let simulation = handle.and_then(|handle| handle.join().ok());

        info!("Simulation manager stopped");
        simulation
    }

    /// The next tick the local simulation will execute
    pub fn tick(&self) -> Tick {
        self.inner.lock_state().tick
    }

    /// Snapshot of the last tick each peer reported reaching
    pub fn peer_progress(&self) -> HashMap<SocketAddr, Tick> {
        self.inner.lock_state().peer_progress.clone()
    }

    /// Ticks of the actions waiting to be executed, one entry per action
    pub fn scheduled_ticks(&self) -> Vec<Tick> {
        self.inner
            .lock_state()
            .actions
            .iter()
            .map(|action| action.tick)
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock_state().is_running()
    }
}

impl<S: Simulation> Drop for SimulationManager<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<S: Simulation>(inner: Arc<ManagerInner<S>>, mut simulation: S) -> S {
    loop {
        let (tick, due) = {
            let mut state = inner.lock_state();
            loop {
                if !state.is_running() {
                    return simulation;
                }
                if inner.target_tick(&state).is_more_recent(state.tick) {
                    break;
                }
                state = inner
                    .progressed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }

            let tick = state.tick;
            let (due, pending): (Vec<_>, Vec<_>) = state
                .actions
                .drain(..)
                .partition(|action| action.tick == tick);
            state.actions = pending;
            state.executing = true;
            (tick, due)
        };

        // same order on every peer, whatever order the actions arrived in
        let mut due: Vec<(u32, Vec<u8>, S::Action)> = due
            .into_iter()
            .map(|sequenced| {
                let encoded = sequenced.action.encode();
                (sequenced.action.content_hash(), encoded, sequenced.action)
            })
            .collect();
        due.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        for (_, _, action) in &due {
            debug!("@{}: Executing action", tick);
            action.execute(&mut simulation);
        }
        simulation.tick();

        let mut state = inner.lock_state();
        state.tick = state.tick.next();
        state.executing = false;
        trace!("@{}: Advanced", state.tick);

        let progress = SyncMessage::Progress { tick: state.tick }.write();
        inner.broadcast(&state, &progress);
    }
}
