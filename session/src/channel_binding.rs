use std::{fmt, net::SocketAddr};

use lockstep_shared::ChannelCode;

/// Identifies one logical channel: a remote address plus the channel code
/// that prefixes every datagram exchanged on it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelBinding {
    remote_address: SocketAddr,
    channel_code: ChannelCode,
}

impl ChannelBinding {
    pub fn new(remote_address: SocketAddr, channel_code: ChannelCode) -> Self {
        Self {
            remote_address,
            channel_code,
        }
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.remote_address
    }

    pub fn channel_code(&self) -> ChannelCode {
        self.channel_code
    }
}

impl fmt::Display for ChannelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.remote_address, self.channel_code)
    }
}
