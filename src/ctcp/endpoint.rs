//! Top-level transport orchestrator: owns every [`Connection`] keyed by
//! [`ConnId`], replacing the original's process-wide `state_list`
//! (SPEC_FULL.md §9), and drives them from the cooperative event loop.

use std::collections::HashMap;

use log::info;

use crate::link::Link;
use crate::time::Tickable;

use super::app::AppIo;
use super::config::TransportConfig;
use super::connection::{Connection, ConnId};

pub struct Endpoint {
    config: TransportConfig,
    connections: HashMap<ConnId, Connection>,
}

impl Endpoint {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            connections: HashMap::new(),
        }
    }

    /// Opens a new connection over `egress`, returning its id.
    pub fn open(&mut self, id: ConnId, egress: impl Into<String>) {
        self.connections.insert(id, Connection::new(id, egress, self.config));
    }

    pub fn close(&mut self, id: ConnId) {
        self.connections.remove(&id);
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Pulls outbound application data for every open connection and sends
    /// whatever the admission gate allows (SPEC_FULL.md §4.6/§4.8).
    pub fn poll_app_input(&mut self, id: ConnId, app: &mut dyn AppIo, link: &mut dyn Link) {
        let Some(conn) = self.connections.get_mut(&id) else { return };
        conn.poll_app_input(app);
        conn.admit_and_send(link);
    }

    /// Feeds one inbound datagram to its connection (SPEC_FULL.md §4.7).
    pub fn handle_datagram(&mut self, id: ConnId, bytes: &[u8], app: &mut dyn AppIo, link: &mut dyn Link) {
        let Some(conn) = self.connections.get_mut(&id) else { return };
        let outcome = conn.receive(bytes, app, link);
        if outcome.destroyed {
            info!("connection {id:?} destroyed after receive");
            self.connections.remove(&id);
        }
    }

    /// Drives retransmission/teardown for every connection. Call once per
    /// scheduled timer tick (SPEC_FULL.md §4.10).
    pub fn tick_connections(&mut self, link: &mut dyn Link) {
        let mut destroyed = Vec::new();
        for (id, conn) in self.connections.iter_mut() {
            if conn.on_timer(link).destroyed {
                destroyed.push(*id);
            }
        }
        for id in destroyed {
            info!("connection {id:?} destroyed by timer");
            self.connections.remove(&id);
        }
    }
}

impl Tickable for Endpoint {
    fn tick(&mut self) {
        // Retransmission/teardown needs a `Link` to act on; callers use
        // `tick_connections` from the event loop instead of this no-op.
    }
}
