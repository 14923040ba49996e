use std::io;

use thiserror::Error;

use lockstep_shared::ChannelError;

use crate::channel_binding::ChannelBinding;

/// Errors that can occur while managing a NetworkSession
#[derive(Debug, Error)]
pub enum SessionError {
    /// Attempted to connect a binding that already has a channel
    #[error("Binding {binding} is already in use. Each (address, channel code) pair can only be connected once")]
    BindingInUse { binding: ChannelBinding },

    /// Attempted to send on a binding that was never connected
    #[error("No channel is bound to {binding}. Call connect() before sending")]
    UnknownBinding { binding: ChannelBinding },

    /// Operation requires a running session
    #[error("Session is not running. Call start() first, and do not use a session after stop()")]
    NotRunning,

    /// start() was called more than once
    #[error("Session has already been started. A session can only be started once")]
    AlreadyStarted,

    /// Socket or thread creation failed
    #[error("Session I/O error: {0}")]
    Io(#[from] io::Error),

    /// The channel factory failed to build a channel
    #[error("Failed to create channel: {0}")]
    Channel(#[from] ChannelError),
}
