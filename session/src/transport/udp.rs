use std::{
    io::{self, ErrorKind},
    net::{self, SocketAddr, ToSocketAddrs},
};

use super::{PacketReceiver, PacketSender, RecvError, SendError, Socket};
use crate::session_config::SessionConfig;

/// A [`Socket`] over a std UDP socket
pub struct UdpSocket {
    socket: net::UdpSocket,
    local_address: SocketAddr,
    max_packet_size: usize,
}

impl UdpSocket {
    pub fn bind<A: ToSocketAddrs>(address: A, config: &SessionConfig) -> io::Result<Self> {
        let socket = net::UdpSocket::bind(address)?;
        socket.set_read_timeout(Some(config.poll_interval))?;
        let local_address = socket.local_addr()?;

        Ok(Self {
            socket,
            local_address,
            max_packet_size: config.max_packet_size,
        })
    }
}

impl Socket for UdpSocket {
    fn local_address(&self) -> SocketAddr {
        self.local_address
    }

    fn split(self: Box<Self>) -> io::Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)> {
        let buffer = vec![0; self.max_packet_size];
        let sender = UdpPacketSender {
            socket: self.socket.try_clone()?,
        };
        let receiver = UdpPacketReceiver {
            socket: self.socket,
            buffer,
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct UdpPacketSender {
    socket: net::UdpSocket,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        self.socket.send_to(payload, address)?;
        Ok(())
    }
}

struct UdpPacketReceiver {
    socket: net::UdpSocket,
    buffer: Vec<u8>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, &self.buffer[..length]))),
            Err(error)
                if error.kind() == ErrorKind::WouldBlock || error.kind() == ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(error) => Err(RecvError::Io(error)),
        }
    }
}
