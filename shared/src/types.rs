/// One deterministic simulation step, compared with circular semantics
pub type Tick = u32;
/// Per-direction sequence number of the Stop-and-Wait channel
pub type SequenceNumber = u8;
/// Leading byte of every datagram, selects the channel bound to a remote
pub type ChannelCode = u8;
