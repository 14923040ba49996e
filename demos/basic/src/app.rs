use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use log::{info, warn};
use thiserror::Error;

use lockstep_session::{NetworkSession, SessionConfig, SessionError};
use lockstep_sync::{SessionSettings, SettingsError, Simulation, SimulationManager, SyncError};

use crate::strange_simulation::{decode_action, StrangeAction, StrangeSimulation};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Sync(#[from] SyncError),
}

pub struct AppConfig {
    pub tag: String,
    pub port: u16,
    pub peer_ports: Vec<u16>,
    pub run_ahead: u32,
    pub schedule_offset: u32,
    pub submit_actions: bool,
    pub max_work_delay: Option<Duration>,
}

pub struct App {
    session: Arc<NetworkSession>,
    manager: SimulationManager<StrangeSimulation>,
    submit_actions: bool,
    next_submit: Instant,
    random: fastrand::Rng,
}

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

impl App {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        info!("Lockstep demo {} started on port {}", config.tag, config.port);

        let session = Arc::new(NetworkSession::bind(
            SocketAddr::new(LOCALHOST, config.port),
            &SessionConfig::default(),
        )?);
        session.start()?;

        let peers = config
            .peer_ports
            .iter()
            .map(|port| SocketAddr::new(LOCALHOST, *port));
        let settings = SessionSettings::new(config.run_ahead, config.schedule_offset, peers)?;

        let mut simulation = StrangeSimulation::new(&config.tag);
        if let Some(max_delay) = config.max_work_delay {
            simulation = simulation.with_work_delay(max_delay);
        }

        let manager = SimulationManager::new(session.clone(), settings, decode_action, simulation);
        manager.start()?;

        Ok(Self {
            session,
            manager,
            submit_actions: config.submit_actions,
            next_submit: Instant::now(),
            random: fastrand::Rng::new(),
        })
    }

    pub fn update(&mut self) {
        if !self.submit_actions || Instant::now() < self.next_submit {
            return;
        }

        let action = if self.random.bool() {
            StrangeAction::Jump(3)
        } else {
            StrangeAction::Flip
        };
        match self.manager.submit_action(action) {
            Ok(tick) => info!("Submitted {:?} for tick {}", action, tick),
            Err(error) => warn!("Could not submit {:?}: {}", action, error),
        }

        self.next_submit = Instant::now() + Duration::from_millis(self.random.u64(0..7000));
    }

    pub fn tick(&self) -> u32 {
        self.manager.tick()
    }

    /// Stops the manager and the session, returning the final state hash
    pub fn stop(self) -> Option<i64> {
        let simulation = self.manager.stop();
        self.session.stop();

        simulation.map(|simulation| simulation.state_hash())
    }
}
