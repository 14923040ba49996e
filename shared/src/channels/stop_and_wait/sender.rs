use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::{debug, trace};

use crate::{
    channels::{
        channel::ChannelContext, error::ChannelError, stop_and_wait::message::StopAndWaitMessage,
    },
    timer::RetransmitTimer,
    types::SequenceNumber,
    wrapping_number::WrappingNumber,
};

struct SenderState {
    messages_to_send: VecDeque<Vec<u8>>,
    sequence: SequenceNumber,
    // generation of the currently armed retransmit, if any
    armed: Option<u64>,
    next_generation: u64,
    closed: bool,
}

struct SenderShared {
    context: Arc<dyn ChannelContext>,
    timeout: Duration,
    state: Mutex<SenderState>,
}

impl SenderShared {
    fn lock_state(&self) -> MutexGuard<'_, SenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_timeout(&self, generation: u64) -> Option<Duration> {
        let state = self.lock_state();
        if state.closed || state.armed != Some(generation) {
            // replaced or cancelled while the deadline was expiring
            return None;
        }

        let payload = state.messages_to_send.front()?;
        debug!("Retransmitting message with sequence {}", state.sequence);
        let message = StopAndWaitMessage::Data {
            sequence: state.sequence,
            payload,
        }
        .write();
        self.context.send_message(&message);

        Some(self.timeout)
    }
}

/// The "sender" half of a Stop-and-Wait channel.
///
/// Keeps a FIFO of outbound messages, of which only the head is ever in
/// flight. The head is retransmitted every `timeout` until its ACK arrives.
pub struct StopAndWaitSender {
    shared: Arc<SenderShared>,
    timer: RetransmitTimer,
}

impl StopAndWaitSender {
    pub fn new(context: Arc<dyn ChannelContext>, timeout: Duration) -> Result<Self, ChannelError> {
        if timeout.is_zero() {
            return Err(ChannelError::InvalidTimeout);
        }

        let shared = Arc::new(SenderShared {
            context,
            timeout,
            state: Mutex::new(SenderState {
                messages_to_send: VecDeque::new(),
                sequence: 0,
                armed: None,
                next_generation: 0,
                closed: false,
            }),
        });

        let weak_shared = Arc::downgrade(&shared);
        let timer = RetransmitTimer::spawn("lockstep-retransmit", move |generation| {
            weak_shared
                .upgrade()
                .and_then(|shared| shared.on_timeout(generation))
        })?;

        Ok(Self { shared, timer })
    }

    /// Queues a message, transmitting it straight away if nothing is in flight
    pub fn send(&self, message: &[u8]) {
        let mut state = self.shared.lock_state();
        if state.closed {
            return;
        }

        let was_empty = state.messages_to_send.is_empty();
        state.messages_to_send.push_back(message.to_vec());

        if was_empty {
            self.transmit_head(&mut state);
        }
    }

    /// Processes an ACK from the remote receiver
    pub fn handle_ack(&self, acked_sequence: SequenceNumber) {
        let mut state = self.shared.lock_state();
        if state.closed {
            return;
        }

        if acked_sequence != state.sequence || state.messages_to_send.is_empty() {
            trace!(
                "Ignoring ack for {} while waiting on {}",
                acked_sequence,
                state.sequence
            );
            return;
        }

        state.armed = None;
        self.timer.cancel();

        state.sequence = state.sequence.next();
        state.messages_to_send.pop_front();

        if !state.messages_to_send.is_empty() {
            self.transmit_head(&mut state);
        }
    }

    /// Cancels any pending retransmit and stops the timer thread
    pub fn close(&self) {
        {
            let mut state = self.shared.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.armed = None;
            state.messages_to_send.clear();
        }

        // the timer callback takes the state lock, so shut down outside of it
        self.timer.shutdown();
    }

    /// Number of messages queued, including the one in flight
    pub fn pending_messages(&self) -> usize {
        self.shared.lock_state().messages_to_send.len()
    }

    /// Sequence number of the message currently in flight (or the next one sent)
    pub fn sequence(&self) -> SequenceNumber {
        self.shared.lock_state().sequence
    }

    fn transmit_head(&self, state: &mut SenderState) {
        let message = match state.messages_to_send.front() {
            Some(payload) => StopAndWaitMessage::Data {
                sequence: state.sequence,
                payload,
            }
            .write(),
            None => return,
        };
        self.shared.context.send_message(&message);

        let generation = state.next_generation;
        state.next_generation = state.next_generation.wrapping_add(1);
        state.armed = Some(generation);
        self.timer.arm(generation, self.shared.timeout);
    }
}
