//! # Lockstep Session
//! Owns one unreliable datagram socket per process and demultiplexes it into
//! logical channels, each bound to a (remote address, channel code) pair.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod channel_binding;
mod dispatcher;
mod error;
mod network_session;
mod session_config;

pub mod transport;

pub use channel_binding::ChannelBinding;
pub use error::SessionError;
pub use network_session::NetworkSession;
pub use session_config::SessionConfig;
