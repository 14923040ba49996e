/// In-memory sockets for end-to-end testing
/// Routes datagrams between sessions without network I/O, optionally
/// dropping or duplicating them on the way
use std::{
    collections::HashMap,
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::{
        atomic::{AtomicU16, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use lockstep_session::{
    transport::{PacketReceiver, PacketSender, RecvError, SendError, Socket},
    NetworkSession,
};

type Datagram = (SocketAddr, Vec<u8>);

/// How the in-memory network mistreats datagrams
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkConditions {
    /// Probability of a datagram being lost
    pub drop_chance: f32,
    /// Probability of a delivered datagram arriving twice
    pub duplicate_chance: f32,
}

struct NetworkInner {
    inboxes: Mutex<HashMap<SocketAddr, Sender<Datagram>>>,
    conditions: LinkConditions,
    random: Mutex<fastrand::Rng>,
    next_port: AtomicU16,
    poll_interval: Duration,
}

impl NetworkInner {
    fn roll(&self, chance: f32) -> bool {
        chance > 0.0 && self.random.lock().unwrap().f32() < chance
    }

    fn deliver(&self, from: SocketAddr, to: &SocketAddr, payload: &[u8]) {
        if self.roll(self.conditions.drop_chance) {
            return;
        }
        let duplicate = self.roll(self.conditions.duplicate_chance);

        let inboxes = self.inboxes.lock().unwrap();
        // like UDP, nobody listening means the datagram is lost
        let Some(inbox) = inboxes.get(to) else {
            return;
        };
        let _ = inbox.send((from, payload.to_vec()));
        if duplicate {
            let _ = inbox.send((from, payload.to_vec()));
        }
    }
}

/// A hub of [`LocalSocket`]s, addressed as 127.0.0.1:<port>
#[derive(Clone)]
pub struct LocalNetwork {
    inner: Arc<NetworkInner>,
}

impl LocalNetwork {
    /// A network that delivers every datagram exactly once
    pub fn new() -> Self {
        Self::with_conditions(LinkConditions::default(), 0)
    }

    /// A network that drops and duplicates datagrams, reproducibly for a seed
    pub fn with_conditions(conditions: LinkConditions, seed: u64) -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                inboxes: Mutex::new(HashMap::new()),
                conditions,
                random: Mutex::new(fastrand::Rng::with_seed(seed)),
                next_port: AtomicU16::new(10_000),
                poll_interval: Duration::from_millis(10),
            }),
        }
    }

    pub fn socket(&self) -> LocalSocket {
        let port = self.inner.next_port.fetch_add(1, Ordering::Relaxed);
        let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let (sender, inbox) = channel::unbounded();
        self.inner.inboxes.lock().unwrap().insert(address, sender);

        LocalSocket {
            address,
            network: self.inner.clone(),
            inbox,
        }
    }

    /// A started session over a new socket on this network
    pub fn session(&self) -> Arc<NetworkSession> {
        let session = NetworkSession::new(Box::new(self.socket())).unwrap();
        session.start().unwrap();
        Arc::new(session)
    }

    /// Delivers a raw datagram, as if sent from `from`
    pub fn inject(&self, from: SocketAddr, to: &SocketAddr, payload: &[u8]) {
        self.inner.deliver(from, to, payload);
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// A socket on a [`LocalNetwork`]
pub struct LocalSocket {
    address: SocketAddr,
    network: Arc<NetworkInner>,
    inbox: Receiver<Datagram>,
}

impl Socket for LocalSocket {
    fn local_address(&self) -> SocketAddr {
        self.address
    }

    fn split(self: Box<Self>) -> io::Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)> {
        let sender = LocalPacketSender {
            address: self.address,
            network: self.network.clone(),
        };
        let receiver = LocalPacketReceiver {
            address: self.address,
            poll_interval: self.network.poll_interval,
            network: self.network,
            inbox: self.inbox,
            current: None,
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct LocalPacketSender {
    address: SocketAddr,
    network: Arc<NetworkInner>,
}

impl PacketSender for LocalPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        self.network.deliver(self.address, address, payload);
        Ok(())
    }
}

struct LocalPacketReceiver {
    address: SocketAddr,
    poll_interval: Duration,
    network: Arc<NetworkInner>,
    inbox: Receiver<Datagram>,
    current: Option<Vec<u8>>,
}

impl PacketReceiver for LocalPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.inbox.recv_timeout(self.poll_interval) {
            Ok((from, payload)) => {
                let payload = self.current.insert(payload);
                Ok(Some((from, payload.as_slice())))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(RecvError::Closed),
        }
    }
}

impl Drop for LocalPacketReceiver {
    fn drop(&mut self) {
        self.network.inboxes.lock().unwrap().remove(&self.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_address() {
        let network = LocalNetwork::new();
        let a = Box::new(network.socket());
        let b = Box::new(network.socket());
        let a_address = a.local_address();
        let b_address = b.local_address();
        let (a_sender, _a_receiver) = a.split().unwrap();
        let (_b_sender, mut b_receiver) = b.split().unwrap();

        a_sender.send(&b_address, b"hello").unwrap();

        let received = b_receiver
            .receive()
            .unwrap()
            .map(|(from, payload)| (from, payload.to_vec()));
        assert_eq!(received, Some((a_address, b"hello".to_vec())));
        assert!(b_receiver.receive().unwrap().is_none());
    }

    #[test]
    fn drops_and_duplicates() {
        let conditions = LinkConditions {
            drop_chance: 0.5,
            duplicate_chance: 0.5,
        };
        let network = LocalNetwork::with_conditions(conditions, 3);
        let a = Box::new(network.socket());
        let b = Box::new(network.socket());
        let b_address = b.local_address();
        let (a_sender, _a_receiver) = a.split().unwrap();
        let (_b_sender, mut b_receiver) = b.split().unwrap();

        for _ in 0..1000 {
            a_sender.send(&b_address, b"x").unwrap();
        }
        let mut received = 0;
        while let Ok(Some(_)) = b_receiver.receive() {
            received += 1;
        }

        // about 500 survive, and about half of those arrive twice
        assert!(received > 600 && received < 900, "received {}", received);
    }
}
