use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use log::warn;

use crate::channels::{
    channel::{Channel, ChannelContext, ChannelResult},
    error::ChannelError,
    stop_and_wait::{
        message::StopAndWaitMessage, receiver::StopAndWaitReceiver, sender::StopAndWaitSender,
    },
};

pub const DEFAULT_RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// A reliable-ordered [`Channel`] implementation using Stop-and-Wait ARQ.
///
/// No handshake is needed: both ends start at sequence 0 and are in sync as
/// soon as the first DATA/ACK exchange succeeds. A CLOSE from the remote
/// closes this end too.
pub struct StopAndWaitChannel {
    context: Arc<dyn ChannelContext>,
    sender: StopAndWaitSender,
    receiver: StopAndWaitReceiver,
    is_closed: Mutex<bool>,
}

impl StopAndWaitChannel {
    pub fn new(context: Arc<dyn ChannelContext>) -> Result<Self, ChannelError> {
        Self::with_timeout(context, DEFAULT_RETRANSMIT_TIMEOUT)
    }

    pub fn with_timeout(
        context: Arc<dyn ChannelContext>,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        Ok(Self {
            sender: StopAndWaitSender::new(context.clone(), timeout)?,
            receiver: StopAndWaitReceiver::new(context.clone()),
            context,
            is_closed: Mutex::new(false),
        })
    }

    /// Factory function, for passing to `NetworkSession::connect`
    pub fn create(context: Arc<dyn ChannelContext>) -> ChannelResult {
        Ok(Box::new(Self::new(context)?))
    }

    pub fn is_closed(&self) -> bool {
        *self.is_closed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close_locked(&self, is_closed: &mut bool) {
        if *is_closed {
            return;
        }
        *is_closed = true;

        self.context.send_message(&StopAndWaitMessage::Close.write());
        self.sender.close();
    }
}

impl Channel for StopAndWaitChannel {
    fn send(&self, message: &[u8]) {
        let is_closed = self.is_closed.lock().unwrap_or_else(PoisonError::into_inner);
        if *is_closed {
            return;
        }

        self.sender.send(message);
    }

    fn handle(&self, content: &[u8]) {
        let mut is_closed = self.is_closed.lock().unwrap_or_else(PoisonError::into_inner);
        if *is_closed {
            return;
        }

        match StopAndWaitMessage::read(content) {
            Ok(StopAndWaitMessage::Data { sequence, payload }) => {
                self.receiver.handle_data(sequence, payload);
            }
            Ok(StopAndWaitMessage::Ack { sequence }) => self.sender.handle_ack(sequence),
            Ok(StopAndWaitMessage::Close) => self.close_locked(&mut is_closed),
            Err(error) => warn!("Dropping channel message: {}", error),
        }
    }

    fn close(&self) {
        let mut is_closed = self.is_closed.lock().unwrap_or_else(PoisonError::into_inner);
        self.close_locked(&mut is_closed);
    }
}
