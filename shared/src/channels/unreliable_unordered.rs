use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::channels::channel::{Channel, ChannelContext, ChannelResult};

/// A fire-and-forget [`Channel`] for unreliable, unordered communication
pub struct UnreliableUnorderedChannel {
    context: Arc<dyn ChannelContext>,
    is_closed: AtomicBool,
}

impl UnreliableUnorderedChannel {
    pub fn new(context: Arc<dyn ChannelContext>) -> Self {
        Self {
            context,
            is_closed: AtomicBool::new(false),
        }
    }

    /// Factory function, for passing to `NetworkSession::connect`
    pub fn create(context: Arc<dyn ChannelContext>) -> ChannelResult {
        Ok(Box::new(Self::new(context)))
    }
}

impl Channel for UnreliableUnorderedChannel {
    fn send(&self, message: &[u8]) {
        if self.is_closed.load(Ordering::Acquire) {
            return;
        }
        self.context.send_message(message);
    }

    fn handle(&self, content: &[u8]) {
        if self.is_closed.load(Ordering::Acquire) {
            return;
        }
        self.context.take_message(content.to_vec());
    }

    fn close(&self) {
        self.is_closed.store(true, Ordering::Release);
    }
}
