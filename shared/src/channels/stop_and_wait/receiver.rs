use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

use crate::{
    channels::{channel::ChannelContext, stop_and_wait::message::StopAndWaitMessage},
    types::SequenceNumber,
    wrapping_number::WrappingNumber,
};

/// The "receiver" half of a Stop-and-Wait channel.
///
/// Every DATA is acknowledged, even a duplicate or an out-of-order one, so a
/// sender whose previous ACK was lost can move on. Only the expected sequence
/// number is delivered upward, and exactly once.
pub struct StopAndWaitReceiver {
    context: Arc<dyn ChannelContext>,
    expected_sequence: Mutex<SequenceNumber>,
}

impl StopAndWaitReceiver {
    pub fn new(context: Arc<dyn ChannelContext>) -> Self {
        Self {
            context,
            expected_sequence: Mutex::new(0),
        }
    }

    pub fn handle_data(&self, received_sequence: SequenceNumber, payload: &[u8]) {
        let mut expected_sequence = self
            .expected_sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if received_sequence == *expected_sequence {
            *expected_sequence = expected_sequence.next();
            self.context.take_message(payload.to_vec());
        } else {
            trace!(
                "Not delivering sequence {}, expecting {}",
                received_sequence,
                *expected_sequence
            );
        }

        let ack = StopAndWaitMessage::Ack {
            sequence: received_sequence,
        };
        self.context.send_message(&ack.write());
    }

    pub fn expected_sequence(&self) -> SequenceNumber {
        *self
            .expected_sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
