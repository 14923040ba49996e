//! Runs one peer of the counter/toggle lockstep demo.
//!
//! Start two processes pointing at each other, e.g.
//! `app --port 1234 --peer 4567 --submit` and `app --port 4567 --peer 1234 --tag B`.

use std::{
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use log::{error, info};

use app::{App, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "lockstep-demo")]
#[command(about = "Run a counter/toggle simulation in lockstep with its peers", long_about = None)]
struct Args {
    /// Local UDP port
    #[arg(short, long)]
    port: u16,

    /// UDP port of a peer on localhost, repeat for several peers
    #[arg(long = "peer")]
    peers: Vec<u16>,

    /// Name printed in front of every log line of the simulation
    #[arg(short, long, default_value = "A")]
    tag: String,

    /// How many ticks the simulation may run ahead of the slowest peer
    #[arg(long, default_value = "1")]
    run_ahead: u32,

    /// How many ticks ahead of the slowest peer actions are scheduled
    #[arg(long, default_value = "3")]
    schedule_offset: u32,

    /// Submit a random action every few seconds
    #[arg(short, long)]
    submit: bool,

    /// Upper bound of the random per-tick work delay, in milliseconds
    #[arg(long, default_value = "3000")]
    max_delay_ms: u64,

    /// Stop after this many seconds instead of running forever
    #[arg(short, long)]
    duration: Option<u64>,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let config = AppConfig {
        tag: args.tag,
        port: args.port,
        peer_ports: args.peers,
        run_ahead: args.run_ahead,
        schedule_offset: args.schedule_offset,
        submit_actions: args.submit,
        max_work_delay: (args.max_delay_ms > 0).then(|| Duration::from_millis(args.max_delay_ms)),
    };

    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(error) => {
            error!("Failed to start: {}", error);
            std::process::exit(1);
        }
    };

    let deadline = args
        .duration
        .map(|seconds| Instant::now() + Duration::from_secs(seconds));
    while deadline.map_or(true, |deadline| Instant::now() < deadline) {
        app.update();
        thread::sleep(Duration::from_millis(100));
    }

    let tick = app.tick();
    match app.stop() {
        Some(hash) => info!("Stopped at tick {} with state hash {}", tick, hash),
        None => info!("Stopped at tick {}", tick),
    }
}
