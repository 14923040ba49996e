use std::sync::Mutex;

use crate::channels::channel::ChannelContext;

/// Captures everything a channel pushes down or up
#[derive(Default)]
pub(crate) struct RecordingContext {
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub taken: Mutex<Vec<Vec<u8>>>,
}

impl RecordingContext {
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn taken(&self) -> Vec<Vec<u8>> {
        self.taken.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.taken.lock().unwrap().clear();
    }
}

impl ChannelContext for RecordingContext {
    fn send_message(&self, message: &[u8]) {
        self.sent.lock().unwrap().push(message.to_vec());
    }

    fn take_message(&self, message: Vec<u8>) {
        self.taken.lock().unwrap().push(message);
    }
}
