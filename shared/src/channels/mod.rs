pub mod channel;
pub mod channel_codes;
pub mod error;
pub mod packet_loss;
pub mod stop_and_wait;
pub mod unreliable_unordered;

#[cfg(test)]
pub(crate) mod recording_context;
