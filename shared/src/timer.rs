use std::{
    sync::{Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::trace;

use crate::channels::error::ChannelError;

enum TimerCommand {
    Arm { generation: u64, delay: Duration },
    Cancel,
    Shutdown,
}

/// A single-thread timer service, used for retransmission scheduling.
///
/// At most one deadline is pending at a time: arming replaces whatever was
/// armed before, and cancelling clears it. Each arming carries a generation
/// number which is handed back to the callback when the deadline passes, so
/// the owner can tell a current firing apart from one it has already replaced.
pub struct RetransmitTimer {
    commands: Sender<TimerCommand>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RetransmitTimer {
    /// Spawns the timer thread.
    ///
    /// `on_fire` runs on the timer thread with the generation that expired.
    /// Returning `Some(delay)` re-arms the same generation after `delay`.
    pub fn spawn<F>(name: &str, on_fire: F) -> Result<Self, ChannelError>
    where
        F: FnMut(u64) -> Option<Duration> + Send + 'static,
    {
        let (commands, receiver) = channel::unbounded();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_timer(receiver, on_fire))
            .map_err(|error| ChannelError::TimerSpawnFailed {
                reason: error.to_string(),
            })?;

        Ok(Self {
            commands,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Arms the timer, replacing any pending deadline
    pub fn arm(&self, generation: u64, delay: Duration) {
        // a send error means the thread has already shut down
        let _ = self.commands.send(TimerCommand::Arm { generation, delay });
    }

    /// Clears the pending deadline, if any
    pub fn cancel(&self) {
        let _ = self.commands.send(TimerCommand::Cancel);
    }

    /// Stops the timer thread and waits for it to exit.
    ///
    /// Must not be called while holding a lock the callback takes.
    pub fn shutdown(&self) {
        let _ = self.commands.send(TimerCommand::Shutdown);

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for RetransmitTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_timer<F>(receiver: Receiver<TimerCommand>, mut on_fire: F)
where
    F: FnMut(u64) -> Option<Duration>,
{
    let mut armed: Option<(u64, Instant)> = None;

    loop {
        let command = match armed {
            Some((generation, deadline)) => match receiver.recv_deadline(deadline) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    trace!("timer generation {} fired", generation);
                    armed = on_fire(generation)
                        .map(|delay| (generation, Instant::now() + delay));
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => return,
            },
        };

        match command {
            TimerCommand::Arm { generation, delay } => {
                armed = Some((generation, Instant::now() + delay));
            }
            TimerCommand::Cancel => armed = None,
            TimerCommand::Shutdown => return,
        }
    }
}
