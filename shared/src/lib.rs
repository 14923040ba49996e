//! # Lockstep Shared
//! Circular sequence arithmetic and channel primitives shared between the
//! lockstep-session & lockstep-sync crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod channels;
mod timer;
mod types;
mod utils;
mod wrapping_number;

pub use channels::{
    channel::{Channel, ChannelContext, ChannelListener, ChannelResult},
    channel_codes,
    error::{ChannelError, WireError},
    packet_loss::PacketLossChannel,
    stop_and_wait::{
        channel::{StopAndWaitChannel, DEFAULT_RETRANSMIT_TIMEOUT},
        message::StopAndWaitMessage,
        receiver::StopAndWaitReceiver,
        sender::StopAndWaitSender,
    },
    unreliable_unordered::UnreliableUnorderedChannel,
};
pub use timer::RetransmitTimer;
pub use types::{ChannelCode, SequenceNumber, Tick};
pub use utils::{decode_string, encode_string, CodecError};
pub use wrapping_number::{sequence_greater_than, sequence_less_than, WrappingNumber};
