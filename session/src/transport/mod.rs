pub mod udp;

pub use inner::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

mod inner {

    use std::{io, net::SocketAddr};

    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum SendError {
        #[error("Transport has been closed")]
        Closed,
        #[error("Failed to send datagram: {0}")]
        Io(#[from] io::Error),
    }

    #[derive(Debug, Error)]
    pub enum RecvError {
        #[error("Transport has been closed")]
        Closed,
        #[error("Failed to receive datagram: {0}")]
        Io(#[from] io::Error),
    }

    /// An unreliable datagram socket, split into halves once a session owns it
    pub trait Socket: Send {
        /// Get the address this Socket is bound to
        fn local_address(&self) -> SocketAddr;
        /// Splits the Socket into its sending and receiving halves
        fn split(self: Box<Self>) -> io::Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)>;
    }

    pub trait PacketSender: Send + Sync {
        /// Sends a datagram to the given address
        fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
    }

    pub trait PacketReceiver: Send {
        /// Receives a datagram, blocking for at most the socket's poll
        /// interval. Returns `Ok(None)` if nothing arrived in that time.
        fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
    }
}
