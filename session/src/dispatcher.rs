use std::{
    sync::{Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{self, Receiver, Sender};
use log::trace;

use lockstep_shared::ChannelListener;

use crate::error::SessionError;

enum DispatchCommand {
    Message(Vec<u8>),
    Shutdown,
}

/// Hands delivered messages to a listener on a dedicated worker thread, so
/// the session's receive loop never waits on listener logic. Messages reach
/// the listener in the order they were dispatched.
pub(crate) struct ListenerDispatcher {
    commands: Sender<DispatchCommand>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerDispatcher {
    pub fn spawn(name: String, listener: Box<dyn ChannelListener>) -> Result<Self, SessionError> {
        let (commands, receiver) = channel::unbounded();
        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || run_dispatch(receiver, listener))?;

        Ok(Self {
            commands,
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn dispatch(&self, message: Vec<u8>) {
        if self.commands.send(DispatchCommand::Message(message)).is_err() {
            trace!("Dispatcher has shut down, dropping message");
        }
    }

    /// Delivers everything already dispatched, then stops the worker
    pub fn shutdown(&self) {
        let _ = self.commands.send(DispatchCommand::Shutdown);

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // a listener may stop the session from inside the worker
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for ListenerDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_dispatch(receiver: Receiver<DispatchCommand>, listener: Box<dyn ChannelListener>) {
    while let Ok(command) = receiver.recv() {
        match command {
            DispatchCommand::Message(message) => listener.handle(message),
            DispatchCommand::Shutdown => return,
        }
    }
}
