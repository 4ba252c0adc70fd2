use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use crate::time::now;

use super::ipv4::{Ipv4Address, Ipv4Packet};
use super::mac::MacAddress;

const ENTRY_TTL: Duration = Duration::from_secs(15);
const PROBE_INTERVAL: Duration = Duration::from_secs(1);
const MAX_PROBE_ATTEMPTS: u8 = 5;

#[derive(Debug, Clone, Copy)]
struct ArpEntry {
    mac: MacAddress,
    inserted_at: SystemTime,
}

/// A fully-formed outbound IPv4 packet waiting on ARP resolution, plus the
/// interfaces needed to either send it on once resolved or bounce an ICMP
/// Host Unreachable back to its sender if resolution ultimately fails.
///
/// Owned exclusively by its `ArpRequest` (SPEC_FULL.md §9 — no back-pointers).
#[derive(Debug, Clone)]
pub struct PendingFrame {
    pub packet: Ipv4Packet,
    pub egress: String,
    pub ingress: String,
    /// Ethernet source of the frame that carried this packet to us —
    /// who to address an eventual Host Unreachable reply to.
    pub origin_mac: MacAddress,
}

struct ArpRequest {
    attempts: u8,
    last_sent: SystemTime,
    egress: String,
    pending: Vec<PendingFrame>,
}

/// Expiring map from IPv4 address to link-layer address, with a
/// per-destination queue of frames awaiting resolution. Shared between the
/// packet-processing path and the periodic probe/eviction sweep; callers are
/// expected to guard it with a mutex when the sweep runs on its own thread
/// (SPEC_FULL.md §5).
#[derive(Default)]
pub struct ArpCache {
    entries: HashMap<Ipv4Address, ArpEntry>,
    requests: HashMap<Ipv4Address, ArpRequest>,
}

/// What the router should do as a result of a cache sweep or insertion.
pub enum ArpOutcome {
    /// Resolution completed: these pending frames can now be sent, each
    /// addressed to `mac`, in the FIFO order they were queued.
    Resolved { mac: MacAddress, frames: Vec<PendingFrame> },
    /// Resolution failed after the maximum probe attempts: each pending
    /// frame should get an ICMP Host Unreachable back to its source
    /// (SPEC_FULL.md §9 Open Question — default to per-frame).
    Failed { frames: Vec<PendingFrame> },
}

impl ArpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, ip: Ipv4Address) -> Option<MacAddress> {
        self.entries.get(&ip).map(|e| e.mac)
    }

    /// Inserts or refreshes a resolved mapping. If an ArpRequest was
    /// outstanding for `ip`, returns its pending frames for delivery.
    pub fn insert(&mut self, ip: Ipv4Address, mac: MacAddress) -> Option<ArpOutcome> {
        self.entries.insert(
            ip,
            ArpEntry {
                mac,
                inserted_at: now(),
            },
        );

        self.requests.remove(&ip).map(|req| ArpOutcome::Resolved {
            mac,
            frames: req.pending,
        })
    }

    /// Enqueues `frame` for delivery to `target_ip`, creating an ArpRequest
    /// if one doesn't already exist for that target. Returns `true` if a
    /// fresh probe should be sent immediately (new request).
    pub fn queue(&mut self, target_ip: Ipv4Address, egress: String, frame: PendingFrame) -> bool {
        match self.requests.get_mut(&target_ip) {
            Some(req) => {
                req.pending.push(frame);
                false
            }
            None => {
                self.requests.insert(
                    target_ip,
                    ArpRequest {
                        attempts: 1,
                        last_sent: now(),
                        egress,
                        pending: vec![frame],
                    },
                );
                true
            }
        }
    }

    /// Evicts entries older than 15s, independent of the probe sweep.
    pub fn evict_stale(&mut self) {
        let n = now();
        self.entries
            .retain(|_, entry| n.duration_since(entry.inserted_at).unwrap_or(Duration::ZERO) < ENTRY_TTL);
    }

    /// Runs the 1Hz maintenance pass (SPEC_FULL.md §4.5): re-probes
    /// outstanding requests at most once per second, failing (and removing)
    /// any that have exhausted their attempts.
    ///
    /// Returns `(target_ip, egress)` pairs that need a fresh ARP broadcast,
    /// and the outcomes for any requests that just failed.
    pub fn sweep(&mut self) -> (Vec<(Ipv4Address, String)>, Vec<ArpOutcome>) {
        let n = now();
        let mut to_probe = Vec::new();
        let mut failed_targets = Vec::new();

        for (target, req) in self.requests.iter_mut() {
            if n.duration_since(req.last_sent).unwrap_or(Duration::ZERO) < PROBE_INTERVAL {
                continue;
            }
            if req.attempts >= MAX_PROBE_ATTEMPTS {
                failed_targets.push(*target);
                continue;
            }
            req.attempts += 1;
            req.last_sent = n;
            to_probe.push((*target, req.egress.clone()));
        }

        let mut outcomes = Vec::new();
        for target in failed_targets {
            if let Some(req) = self.requests.remove(&target) {
                outcomes.push(ArpOutcome::Failed { frames: req.pending });
            }
        }

        (to_probe, outcomes)
    }
}
