use std::sync::{Mutex, PoisonError};

use log::trace;

use crate::channels::{channel::Channel, error::ChannelError};

/// Wraps a [`Channel`] to simulate dropped packets at the framework level.
///
/// Each incoming payload is discarded with the configured probability before
/// the wrapped channel sees it. Outgoing traffic and `close` pass straight
/// through.
pub struct PacketLossChannel {
    channel: Box<dyn Channel>,
    loss_chance: f32,
    random: Mutex<fastrand::Rng>,
}

impl PacketLossChannel {
    /// `loss_chance` is the probability, in `0..=1`, of an incoming packet
    /// being dropped
    pub fn new(channel: Box<dyn Channel>, loss_chance: f32) -> Result<Self, ChannelError> {
        Self::with_rng(channel, loss_chance, fastrand::Rng::new())
    }

    /// Same as [`PacketLossChannel::new`] but with a reproducible drop pattern
    pub fn with_seed(
        channel: Box<dyn Channel>,
        loss_chance: f32,
        seed: u64,
    ) -> Result<Self, ChannelError> {
        Self::with_rng(channel, loss_chance, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(
        channel: Box<dyn Channel>,
        loss_chance: f32,
        random: fastrand::Rng,
    ) -> Result<Self, ChannelError> {
        if !(0.0..=1.0).contains(&loss_chance) {
            return Err(ChannelError::InvalidLossChance {
                chance: loss_chance,
            });
        }

        Ok(Self {
            channel,
            loss_chance,
            random: Mutex::new(random),
        })
    }

    fn should_drop(&self) -> bool {
        if self.loss_chance == 0.0 {
            return false;
        }
        let roll = self
            .random
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .f32();
        roll <= self.loss_chance
    }
}

impl Channel for PacketLossChannel {
    fn send(&self, message: &[u8]) {
        self.channel.send(message);
    }

    fn handle(&self, content: &[u8]) {
        if self.should_drop() {
            trace!("Dropping incoming packet of {} bytes", content.len());
            return;
        }
        self.channel.handle(content);
    }

    fn close(&self) {
        self.channel.close();
    }
}
