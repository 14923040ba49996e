use std::{
    collections::{HashMap, HashSet},
    net::{SocketAddr, ToSocketAddrs},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, trace, warn};

use lockstep_shared::{Channel, ChannelContext, ChannelListener, ChannelResult};

use crate::{
    channel_binding::ChannelBinding,
    dispatcher::ListenerDispatcher,
    error::SessionError,
    session_config::SessionConfig,
    transport::{udp::UdpSocket, PacketReceiver, PacketSender, RecvError, Socket},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

struct BoundChannel {
    channel: Arc<dyn Channel>,
    dispatcher: Arc<ListenerDispatcher>,
}

struct SessionState {
    lifecycle: Lifecycle,
    // held here until the receive loop takes it over
    receiver: Option<Box<dyn PacketReceiver>>,
    bindings: HashMap<ChannelBinding, BoundChannel>,
}

struct SessionInner {
    local_address: SocketAddr,
    // back-off after a failed receive
    poll_interval: Duration,
    sender: Mutex<Option<Box<dyn PacketSender>>>,
    state: Mutex<SessionState>,
    running: AtomicBool,
}

impl SessionInner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send_datagram(&self, address: &SocketAddr, datagram: &[u8]) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            trace!("Session is closed, dropping datagram for {}", address);
            return;
        };
        if let Err(error) = sender.send(address, datagram) {
            warn!("Failed to send datagram to {}: {}", address, error);
        }
    }

    fn route(&self, address: SocketAddr, datagram: &[u8]) {
        let Some((&channel_code, payload)) = datagram.split_first() else {
            warn!("Dropping empty datagram from {}", address);
            return;
        };
        let binding = ChannelBinding::new(address, channel_code);

        let channel = match self.lock_state().bindings.get(&binding) {
            Some(bound) => bound.channel.clone(),
            None => {
                warn!("No binding found for datagram from {}", binding);
                return;
            }
        };

        // outside the session lock, the channel may block on its own state
        channel.handle(payload);
    }
}

/// The Context handed to each Channel: prefixes the binding's channel code on
/// the way down, and queues delivered messages for the listener on the way up
struct SessionContext {
    binding: ChannelBinding,
    session: Weak<SessionInner>,
    dispatcher: Arc<ListenerDispatcher>,
}

impl ChannelContext for SessionContext {
    fn send_message(&self, message: &[u8]) {
        let Some(session) = self.session.upgrade() else {
            return;
        };

        let mut datagram = Vec::with_capacity(message.len() + 1);
        datagram.push(self.binding.channel_code());
        datagram.extend_from_slice(message);

        session.send_datagram(&self.binding.remote_address(), &datagram);
    }

    fn take_message(&self, message: Vec<u8>) {
        self.dispatcher.dispatch(message);
    }
}

/// Owns one datagram socket and demultiplexes it into logical channels.
///
/// Every incoming datagram starts with a channel code. Together with the
/// sender's address it selects the [`ChannelBinding`] whose channel handles
/// the rest of the datagram. Datagrams with no matching binding are dropped.
pub struct NetworkSession {
    inner: Arc<SessionInner>,
    receive_thread: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkSession {
    /// Creates a session over a UDP socket bound to `address`
    pub fn bind<A: ToSocketAddrs>(address: A, config: &SessionConfig) -> Result<Self, SessionError> {
        let socket = UdpSocket::bind(address, config)?;
        Self::with_config(Box::new(socket), config)
    }

    /// Creates a session over any [`Socket`], with the default config.
    /// Nothing is received until [`NetworkSession::start`] is called.
    pub fn new(socket: Box<dyn Socket>) -> Result<Self, SessionError> {
        Self::with_config(socket, &SessionConfig::default())
    }

    pub fn with_config(socket: Box<dyn Socket>, config: &SessionConfig) -> Result<Self, SessionError> {
        let local_address = socket.local_address();
        let (sender, receiver) = socket.split()?;

        Ok(Self {
            inner: Arc::new(SessionInner {
                local_address,
                poll_interval: config.poll_interval,
                sender: Mutex::new(Some(sender)),
                state: Mutex::new(SessionState {
                    lifecycle: Lifecycle::Idle,
                    receiver: Some(receiver),
                    bindings: HashMap::new(),
                }),
                running: AtomicBool::new(false),
            }),
            receive_thread: Mutex::new(None),
        })
    }

    /// Starts the receive loop
    pub fn start(&self) -> Result<(), SessionError> {
        let receiver = {
            let mut state = self.inner.lock_state();
            if state.lifecycle != Lifecycle::Idle {
                return Err(SessionError::AlreadyStarted);
            }
            let Some(receiver) = state.receiver.take() else {
                return Err(SessionError::AlreadyStarted);
            };
            state.lifecycle = Lifecycle::Running;
            self.inner.running.store(true, Ordering::Release);
            receiver
        };

        let inner = self.inner.clone();
        let spawned = thread::Builder::new()
            .name(format!("lockstep-session-{}", self.inner.local_address))
            .spawn(move || run_receive(inner, receiver));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(error) => {
                self.inner.running.store(false, Ordering::Release);
                self.inner.lock_state().lifecycle = Lifecycle::Stopped;
                return Err(error.into());
            }
        };
        *self
            .receive_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        info!("Session listening on {}", self.inner.local_address);
        Ok(())
    }

    /// Opens a channel on the given binding.
    ///
    /// `factory` builds the channel around the context the session supplies.
    /// Messages the channel delivers are handed to `listener` on a worker
    /// thread dedicated to this binding, in delivery order.
    pub fn connect<F, L>(
        &self,
        binding: ChannelBinding,
        factory: F,
        listener: L,
    ) -> Result<(), SessionError>
    where
        F: FnOnce(Arc<dyn ChannelContext>) -> ChannelResult,
        L: ChannelListener,
    {
        let mut state = self.inner.lock_state();
        if state.lifecycle != Lifecycle::Running {
            return Err(SessionError::NotRunning);
        }
        if state.bindings.contains_key(&binding) {
            return Err(SessionError::BindingInUse { binding });
        }

        let dispatcher = Arc::new(ListenerDispatcher::spawn(
            format!("lockstep-dispatch-{}", binding),
            Box::new(listener),
        )?);
        let context: Arc<dyn ChannelContext> = Arc::new(SessionContext {
            binding,
            session: Arc::downgrade(&self.inner),
            dispatcher: dispatcher.clone(),
        });
        let channel: Arc<dyn Channel> = Arc::from(factory(context)?);

        state.bindings.insert(
            binding,
            BoundChannel {
                channel,
                dispatcher,
            },
        );
        info!("Connected channel {}", binding);
        Ok(())
    }

    /// Sends a message on the channel with the given binding. The delivery
    /// guarantees depend on the channel.
    pub fn send(&self, binding: &ChannelBinding, message: &[u8]) -> Result<(), SessionError> {
        let channel = {
            let state = self.inner.lock_state();
            match state.bindings.get(binding) {
                Some(bound) => bound.channel.clone(),
                None if state.lifecycle != Lifecycle::Running => {
                    return Err(SessionError::NotRunning)
                }
                None => return Err(SessionError::UnknownBinding { binding: *binding }),
            }
        };
        channel.send(message);
        Ok(())
    }

    /// Closes the channel on the given binding and frees the binding.
    /// Messages already delivered by the channel still reach its listener.
    pub fn disconnect(&self, binding: &ChannelBinding) -> Result<(), SessionError> {
        let bound = {
            let mut state = self.inner.lock_state();
            match state.bindings.remove(binding) {
                Some(bound) => bound,
                None => return Err(SessionError::UnknownBinding { binding: *binding }),
            }
        };

        bound.channel.close();
        bound.dispatcher.shutdown();
        info!("Disconnected channel {}", binding);
        Ok(())
    }

    /// Snapshot of the addresses with at least one bound channel
    pub fn peers(&self) -> HashSet<SocketAddr> {
        self.inner
            .lock_state()
            .bindings
            .keys()
            .map(ChannelBinding::remote_address)
            .collect()
    }

    /// Snapshot of the current bindings
    pub fn bindings(&self) -> HashSet<ChannelBinding> {
        self.inner.lock_state().bindings.keys().copied().collect()
    }

    /// Snapshot of the current channels
    pub fn channels(&self) -> Vec<Arc<dyn Channel>> {
        self.inner
            .lock_state()
            .bindings
            .values()
            .map(|bound| bound.channel.clone())
            .collect()
    }

    pub fn local_address(&self) -> SocketAddr {
        self.inner.local_address
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Stops the receive loop, closes every channel, then the socket.
    /// Calling it more than once has no further effect.
    pub fn stop(&self) {
        {
            let mut state = self.inner.lock_state();
            if state.lifecycle == Lifecycle::Stopped {
                return;
            }
            state.lifecycle = Lifecycle::Stopped;
            state.receiver = None;
        }
        self.inner.running.store(false, Ordering::Release);

        let handle = self
            .receive_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        let bindings: Vec<BoundChannel> = self
            .inner
            .lock_state()
            .bindings
            .drain()
            .map(|(_, bound)| bound)
            .collect();
        for bound in &bindings {
            bound.channel.close();
        }
        for bound in &bindings {
            bound.dispatcher.shutdown();
        }

        self.inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        info!("Session on {} stopped", self.inner.local_address);
    }
}

impl Drop for NetworkSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_receive(inner: Arc<SessionInner>, mut receiver: Box<dyn PacketReceiver>) {
    while inner.running.load(Ordering::Acquire) {
        match receiver.receive() {
            Ok(Some((address, datagram))) => {
                trace!("Received {} bytes from {}", datagram.len(), address);
                inner.route(address, datagram);
            }
            Ok(None) => {}
            Err(RecvError::Closed) => {
                warn!("Socket on {} closed, stopping receive loop", inner.local_address);
                return;
            }
            Err(error) => {
                warn!("{}", error);
                thread::sleep(inner.poll_interval);
            }
        }
    }
}
