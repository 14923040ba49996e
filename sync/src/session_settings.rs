use std::{collections::HashSet, net::SocketAddr};

use lockstep_shared::{channel_codes, ChannelCode, Tick, WrappingNumber};

use crate::error::SettingsError;

/// Settings for a SimulationManager: how far it may run ahead of the slowest
/// peer, how far ahead actions are scheduled, and who the peers are
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    run_ahead: Tick,
    schedule_offset: Tick,
    peers: HashSet<SocketAddr>,
    channel_code: ChannelCode,
}

impl SessionSettings {
    /// `peers` lists every other member of the session, excluding this one
    pub fn new<I>(run_ahead: Tick, schedule_offset: Tick, peers: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = SocketAddr>,
    {
        if run_ahead == 0 {
            return Err(SettingsError::ZeroRunAhead);
        }
        if schedule_offset <= run_ahead {
            return Err(SettingsError::ScheduleOffsetTooSmall {
                run_ahead,
                schedule_offset,
            });
        }
        if schedule_offset >= <Tick as WrappingNumber>::HALF_RANGE {
            return Err(SettingsError::ScheduleOffsetTooLarge { schedule_offset });
        }

        Ok(Self {
            run_ahead,
            schedule_offset,
            peers: peers.into_iter().collect(),
            channel_code: channel_codes::RELIABLE_ORDERED_1,
        })
    }

    /// Uses a different channel code for the per-peer reliable channel
    pub fn with_channel_code(mut self, channel_code: ChannelCode) -> Self {
        self.channel_code = channel_code;
        self
    }

    /// How many ticks the simulation may run ahead of the slowest peer
    pub fn run_ahead(&self) -> Tick {
        self.run_ahead
    }

    /// How many ticks ahead of the slowest peer actions are scheduled for
    pub fn schedule_offset(&self) -> Tick {
        self.schedule_offset
    }

    pub fn peers(&self) -> &HashSet<SocketAddr> {
        &self.peers
    }

    pub fn channel_code(&self) -> ChannelCode {
        self.channel_code
    }
}
