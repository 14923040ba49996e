use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a NetworkSession's socket
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Largest datagram that will be received in full. Longer datagrams are
    /// truncated by the socket.
    pub max_packet_size: usize,
    /// Longest time the receive loop blocks on the socket before checking
    /// whether the session has been stopped
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_packet_size: 1400,
            poll_interval: Duration::from_millis(50),
        }
    }
}
