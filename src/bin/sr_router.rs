//! Thin CLI entry point for the software router. Loads interface/routing
//! config and drives a [`Router`] from a cooperative event loop. The actual
//! frame I/O is the explicit out-of-scope collaborator (SPEC_FULL.md §1) —
//! this binary wires a [`ChannelLink`] as a stand-in; a real deployment
//! supplies its own `Link` backed by raw sockets or a packet-capture library.

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use net_dataplane::link::{ChannelLink, Link};
use net_dataplane::net::config::RouterConfig;
use net_dataplane::net::router::Router;

/// Software IPv4 router: Ethernet + ARP + IPv4 forwarding + ICMP.
#[derive(Parser, Debug)]
#[command(name = "sr-router")]
struct Args {
    /// Path to the interface/routing config file.
    #[arg(long)]
    config: String,

    /// How often to run the event loop's periodic tick, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    tick_interval_ms: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let file = match File::open(&args.config) {
        Ok(f) => f,
        Err(e) => {
            log::error!("failed to open config {}: {e}", args.config);
            return ExitCode::FAILURE;
        }
    };

    let config = match RouterConfig::parse(BufReader::new(file)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to parse config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut router = Router::new(config.interfaces, config.routes);
    let mut link = ChannelLink::new();

    log::info!("router started, ticking every {}ms", args.tick_interval_ms);
    loop {
        if let Some((frame, ingress)) = link.poll() {
            router.handle_frame(&frame, &ingress, &mut link);
        }
        router.tick_with_link(&mut link);
        std::thread::sleep(Duration::from_millis(args.tick_interval_ms));
    }
}
