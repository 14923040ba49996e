use std::sync::Arc;

use crate::channels::error::ChannelError;

/// A two-way, possibly stateful, communication link with exactly one remote
/// end-point.
///
/// Different channels give different guarantees for the reliability and the
/// ordering of messages. A channel only ever talks to its environment through
/// the [`ChannelContext`] it was created with.
pub trait Channel: Send + Sync {
    /// Sends a message to the remote end-point of this channel. Whether it
    /// arrives, and in which order, depends on the channel.
    fn send(&self, message: &[u8]);

    /// Gives the channel a payload from the remote end-point to process, with
    /// any session framing already stripped.
    fn handle(&self, content: &[u8]);

    /// Releases timers and threads held by the channel, and tells the remote
    /// end-point if the channel's protocol supports it. Calling it more than
    /// once has no further effect.
    fn close(&self);
}

/// Used by a [`Channel`] to interact with the layers above and below it.
pub trait ChannelContext: Send + Sync {
    /// Passes a message to the layer below, to be sent to the remote
    fn send_message(&self, message: &[u8]);

    /// Passes a fully received message to the layer above
    fn take_message(&self, message: Vec<u8>);
}

/// Accepts messages delivered by a [`Channel`]. Must be thread-safe.
pub trait ChannelListener: Send + Sync + 'static {
    fn handle(&self, message: Vec<u8>);
}

impl<F> ChannelListener for F
where
    F: Fn(Vec<u8>) + Send + Sync + 'static,
{
    fn handle(&self, message: Vec<u8>) {
        (self)(message)
    }
}

/// Result of building a [`Channel`] for a given context
pub type ChannelResult = Result<Box<dyn Channel>, ChannelError>;
