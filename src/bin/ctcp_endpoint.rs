//! Thin CLI entry point for a cTCP endpoint. Wires one [`Connection`] to
//! stdin/stdout and a [`ChannelLink`] peer, and drives both the app-input
//! and timer sides of the cooperative event loop.

use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use net_dataplane::ctcp::app::{AppIo, AppReadOutcome};
use net_dataplane::ctcp::config::TransportConfig;
use net_dataplane::ctcp::segment::MAX_PAYLOAD;
use net_dataplane::ctcp::{ConnId, Connection};
use net_dataplane::link::{ChannelLink, Link};

/// A reliable transport endpoint ("cTCP") over an unreliable datagram channel.
#[derive(Parser, Debug)]
#[command(name = "ctcp-endpoint")]
struct Args {
    #[arg(long, default_value_t = 3200)]
    recv_window: u16,
    #[arg(long, default_value_t = 3200)]
    send_window: u16,
    #[arg(long, default_value_t = 10)]
    timer_interval_ms: u64,
    #[arg(long, default_value_t = 200)]
    rt_timeout_ms: u64,
}

/// Reads all of stdin up front and serves it in `MAX_PAYLOAD`-sized chunks;
/// writes delivered data straight to stdout.
struct StdioApp {
    input: Vec<u8>,
    cursor: usize,
}

impl StdioApp {
    fn new() -> io::Result<Self> {
        let mut input = Vec::new();
        io::stdin().read_to_end(&mut input)?;
        Ok(Self { input, cursor: 0 })
    }
}

impl AppIo for StdioApp {
    fn read(&mut self, buf: &mut [u8; MAX_PAYLOAD]) -> AppReadOutcome {
        if self.cursor >= self.input.len() {
            return AppReadOutcome::Eof;
        }
        let n = (self.input.len() - self.cursor).min(MAX_PAYLOAD);
        buf[..n].copy_from_slice(&self.input[self.cursor..self.cursor + n]);
        self.cursor += n;
        AppReadOutcome::Data(n)
    }

    fn bufspace(&self) -> usize {
        usize::MAX
    }

    fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            return; // EOF signal, nothing to flush
        }
        let _ = io::stdout().write_all(data);
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = TransportConfig {
        recv_window: args.recv_window,
        send_window: args.send_window,
        timer_interval_ms: args.timer_interval_ms,
        rt_timeout_ms: args.rt_timeout_ms,
    };

    let mut app = match StdioApp::new() {
        Ok(app) => app,
        Err(e) => {
            log::error!("failed to read stdin: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut link = ChannelLink::new();
    let mut conn = Connection::new(ConnId(0), "peer", config);

    log::info!("cTCP endpoint started, ticking every {}ms", config.timer_interval_ms);
    loop {
        conn.poll_app_input(&mut app);
        conn.admit_and_send(&mut link);
        if let Some((datagram, _peer)) = link.poll() {
            conn.receive(&datagram, &mut app, &mut link);
        }
        if conn.on_timer(&mut link).destroyed {
            return ExitCode::SUCCESS;
        }
        std::thread::sleep(Duration::from_millis(config.timer_interval_ms));
    }
}
