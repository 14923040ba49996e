use thiserror::Error;

/// Errors that can occur while constructing a channel
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// Packet loss probability outside of 0..=1
    #[error("Packet loss chance {chance} is out of range. It must be a probability between 0 and 1")]
    InvalidLossChance { chance: f32 },

    /// Retransmit timeout of zero
    #[error("Retransmit timeout must be greater than zero")]
    InvalidTimeout,

    /// The retransmit timer thread could not be started
    #[error("Failed to spawn retransmit timer thread: {reason}")]
    TimerSpawnFailed { reason: String },
}

/// Errors that can occur while reading a channel-level message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Zero-length payload, there is no tag to read
    #[error("Received an empty channel message. Every message must start with a tag byte")]
    EmptyMessage,

    /// Leading byte is not a known tag
    #[error("Unknown channel message tag {tag}. The message is malformed or from another protocol")]
    UnknownTag { tag: u8 },

    /// Message shorter than its tag requires
    #[error("Truncated {kind} message: need {needed} bytes, have {have}")]
    Truncated {
        kind: &'static str,
        needed: usize,
        have: usize,
    },
}
