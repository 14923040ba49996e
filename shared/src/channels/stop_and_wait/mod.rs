//! A reliable-ordered channel using Stop-and-Wait ARQ.
//!
//! Each direction has one outstanding message at a time: the sender
//! retransmits it until the matching ACK arrives, the receiver ACKs every
//! DATA it sees but only delivers the one it expects next.

pub mod channel;
pub mod message;
pub mod receiver;
pub mod sender;
