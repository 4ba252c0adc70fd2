//! The router core: Packet Dispatcher, ARP Handler, IPv4 Forwarder and
//! Local Delivery/ICMP Responder (SPEC_FULL.md §4.1–§4.4), plus the 1Hz ARP
//! cache maintenance sweep (§4.5) driven off its own background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};

use super::arp::{ArpFrame, ArpOperation};
use super::arp_cache::{ArpCache, ArpOutcome, PendingFrame};
use super::ethernet::{EtherType, EthernetFrame};
use super::icmp::{IcmpPacket, IcmpType};
use super::interface::InterfaceTable;
use super::ipv4::{Ipv4Address, Ipv4Packet, Ipv4Protocol, INIT_TTL};
use super::mac::{self, MacAddress};
use super::route::RoutingTable;

use crate::link::Link;
use crate::time::Tickable;

const ARP_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const ICMP_ERROR_DATA_LEN: usize = 28; // original IPv4 header (20) + 8 bytes of payload

/// Work handed from the background ARP-sweep thread to the main loop. The
/// thread only ever touches the mutex-guarded `ArpCache`; actually sending a
/// frame happens here, on the thread that owns the `Link`.
enum SweepEvent {
    Probe { target: Ipv4Address, egress: String },
    Failed { frames: Vec<PendingFrame> },
}

/// A software IPv4 router: immutable interface/routing configuration plus
/// the ARP cache, which is the only state shared with the sweep thread.
pub struct Router {
    interfaces: InterfaceTable,
    routes: RoutingTable,
    arp_cache: Arc<Mutex<ArpCache>>,
    sweep_rx: mpsc::Receiver<SweepEvent>,
    sweep_stop: Arc<AtomicBool>,
    sweep_handle: Option<thread::JoinHandle<()>>,
}

impl Router {
    pub fn new(interfaces: InterfaceTable, routes: RoutingTable) -> Self {
        let arp_cache = Arc::new(Mutex::new(ArpCache::new()));
        let (tx, sweep_rx) = mpsc::channel();
        let sweep_stop = Arc::new(AtomicBool::new(false));

        let thread_cache = arp_cache.clone();
        let thread_stop = sweep_stop.clone();
        let sweep_handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::Relaxed) {
                thread::sleep(ARP_SWEEP_INTERVAL);
                let (to_probe, outcomes) = {
                    let mut cache = thread_cache.lock().unwrap();
                    cache.evict_stale();
                    cache.sweep()
                };
                for (target, egress) in to_probe {
                    if tx.send(SweepEvent::Probe { target, egress }).is_err() {
                        return;
                    }
                }
                for outcome in outcomes {
                    if let ArpOutcome::Failed { frames } = outcome {
                        if tx.send(SweepEvent::Failed { frames }).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            interfaces,
            routes,
            arp_cache,
            sweep_rx,
            sweep_stop,
            sweep_handle: Some(sweep_handle),
        }
    }

    /// Dispatches a single inbound frame by ethertype (SPEC_FULL.md §4.1).
    pub fn handle_frame(&mut self, bytes: &[u8], ingress: &str, link: &mut dyn Link) {
        let eth = match EthernetFrame::from_bytes(bytes) {
            Ok(eth) => eth,
            Err(e) => {
                warn!("dropping runt frame on {ingress}: {e}");
                return;
            }
        };

        match eth.ether_type {
            EtherType::Arp => self.handle_arp(eth, ingress, link),
            EtherType::Ipv4 => self.handle_ipv4(eth, ingress, link),
            EtherType::Other(t) => trace!("dropping frame with unhandled ethertype {t:#06x} on {ingress}"),
        }
    }

    fn handle_arp(&mut self, eth: EthernetFrame, ingress: &str, link: &mut dyn Link) {
        let arp = match ArpFrame::from_bytes(&eth.payload) {
            Ok(arp) => arp,
            Err(e) => {
                warn!("dropping malformed ARP frame on {ingress}: {e}");
                return;
            }
        };

        let resolved = {
            let mut cache = self.arp_cache.lock().unwrap();
            cache.insert(arp.sender_ip, arp.sender_mac)
        };
        if let Some(ArpOutcome::Resolved { mac, frames }) = resolved {
            self.flush_resolved(mac, frames, link);
        }

        if arp.opcode != ArpOperation::Request {
            return;
        }

        let Some(iface) = self.interfaces.get(ingress) else {
            return;
        };
        if iface.ipv4 != arp.target_ip {
            return; // not addressed to us
        }

        let reply = ArpFrame::reply(iface.mac, iface.ipv4, arp.sender_mac, arp.sender_ip);
        let frame = EthernetFrame::new(arp.sender_mac, iface.mac, EtherType::Arp, reply.to_bytes());
        debug!("replying to ARP request for {:?} on {ingress}", arp.target_ip);
        link.send(frame.to_bytes(), ingress);
    }

    fn handle_ipv4(&mut self, eth: EthernetFrame, ingress: &str, link: &mut dyn Link) {
        let packet = match Ipv4Packet::from_bytes(&eth.payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("dropping malformed IPv4 packet on {ingress}: {e}");
                return;
            }
        };

        if !packet.checksum_valid() {
            warn!("dropping IPv4 packet with bad checksum on {ingress}");
            return;
        }

        if self.interfaces.find_by_ipv4(packet.destination).is_some() {
            self.local_delivery(packet, ingress, eth.source, link);
            return;
        }

        // Net Unreachable and Time Exceeded are sourced from the interface
        // the packet arrived on (SPEC_FULL.md §4.4), unlike Port
        // Unreachable's matched-destination-interface source above.
        let ingress_ip = self.interfaces.get(ingress).map(|i| i.ipv4).unwrap_or([0, 0, 0, 0]);

        let Some(route) = self.routes.longest_prefix_match(packet.destination) else {
            self.send_icmp_error(IcmpType::DestNetUnreachable, &packet, ingress_ip, ingress, eth.source, link);
            return;
        };
        let egress = route.egress.clone();
        let next_hop = if route.gateway == [0, 0, 0, 0] {
            packet.destination
        } else {
            route.gateway
        };

        if packet.ttl <= 1 {
            self.send_icmp_error(IcmpType::TimeExceeded, &packet, ingress_ip, ingress, eth.source, link);
            return;
        }

        let mut packet = packet;
        packet.ttl -= 1;
        packet.recompute_checksum();

        let resolved = self.arp_cache.lock().unwrap().lookup(next_hop);
        match resolved {
            Some(mac) => self.emit_ipv4(packet, mac, &egress, link),
            None => {
                let pending = PendingFrame {
                    packet,
                    egress: egress.clone(),
                    ingress: ingress.to_string(),
                    origin_mac: eth.source,
                };
                let fresh = self.arp_cache.lock().unwrap().queue(next_hop, egress.clone(), pending);
                if fresh {
                    self.send_arp_request(next_hop, &egress, link);
                }
            }
        }
    }

    fn local_delivery(&mut self, packet: Ipv4Packet, ingress: &str, origin_mac: MacAddress, link: &mut dyn Link) {
        match packet.protocol {
            Ipv4Protocol::Icmp => {
                let Ok(icmp) = IcmpPacket::from_bytes(&packet.payload) else {
                    warn!("dropping malformed ICMP packet on {ingress}");
                    return;
                };
                if icmp.icmp_type != IcmpType::EchoRequest {
                    return;
                }
                if !icmp.checksum_valid_over(icmp.to_bytes().len()) {
                    warn!("dropping ICMP echo request with bad checksum on {ingress}");
                    return;
                }
                // Swap src/dst: the reply's source is the address the
                // request was addressed to — the *matched* interface, which
                // may differ from `ingress` if this router is multi-homed
                // on one link (SPEC_FULL.md §4.4).
                let reply = IcmpPacket::echo_reply_to(&icmp);
                self.send_icmp(reply, packet.source, packet.destination, ingress, origin_mac, link);
            }
            Ipv4Protocol::Other(_) => {
                // Port Unreachable's source is the interface that matched
                // the packet's destination, i.e. `packet.destination` itself.
                self.send_icmp_error(IcmpType::PortUnreachable, &packet, packet.destination, ingress, origin_mac, link);
            }
        }
    }

    /// Sends an ICMP error addressed back to the sender of `offending`,
    /// straight out the interface it arrived on. `source_ip` is the
    /// interface address to source the reply from — the interface the
    /// packet arrived on for Net/Host Unreachable and Time Exceeded, or the
    /// interface that matched the packet's destination for Port Unreachable
    /// (SPEC_FULL.md §4.4, these can differ on a multi-homed router).
    /// Destination MAC is the sender's, taken directly from the arriving
    /// frame — no ARP lookup needed.
    fn send_icmp_error(
        &mut self,
        icmp_type: IcmpType,
        offending: &Ipv4Packet,
        source_ip: Ipv4Address,
        ingress: &str,
        origin_mac: MacAddress,
        link: &mut dyn Link,
    ) {
        let mut data = offending.to_bytes();
        data.truncate(ICMP_ERROR_DATA_LEN);
        let icmp = IcmpPacket::error(icmp_type, data);
        self.send_icmp(icmp, offending.source, source_ip, ingress, origin_mac, link);
    }

    fn send_icmp(
        &mut self,
        icmp: IcmpPacket,
        destination: Ipv4Address,
        source_ip: Ipv4Address,
        ingress: &str,
        origin_mac: MacAddress,
        link: &mut dyn Link,
    ) {
        let Some(iface) = self.interfaces.get(ingress) else {
            return;
        };
        let reply = Ipv4Packet::new(source_ip, destination, INIT_TTL, Ipv4Protocol::Icmp, icmp.to_bytes());
        let frame = EthernetFrame::new(origin_mac, iface.mac, EtherType::Ipv4, reply.to_bytes());
        link.send(frame.to_bytes(), ingress);
    }

    fn emit_ipv4(&mut self, packet: Ipv4Packet, next_hop_mac: MacAddress, egress: &str, link: &mut dyn Link) {
        let Some(iface) = self.interfaces.get(egress) else {
            warn!("dropping packet destined for unknown egress interface {egress}");
            return;
        };
        let frame = EthernetFrame::new(next_hop_mac, iface.mac, EtherType::Ipv4, packet.to_bytes());
        link.send(frame.to_bytes(), egress);
    }

    fn send_arp_request(&mut self, target_ip: Ipv4Address, egress: &str, link: &mut dyn Link) {
        let Some(iface) = self.interfaces.get(egress) else {
            return;
        };
        let request = ArpFrame::request(iface.mac, iface.ipv4, target_ip);
        let frame = EthernetFrame::new(mac::BROADCAST, iface.mac, EtherType::Arp, request.to_bytes());
        link.send(frame.to_bytes(), egress);
    }

    fn flush_resolved(&mut self, mac: MacAddress, frames: Vec<PendingFrame>, link: &mut dyn Link) {
        for pending in frames {
            self.emit_ipv4(pending.packet, mac, &pending.egress, link);
        }
    }

    /// Generates one ICMP Host Unreachable per queued frame, per the
    /// Open Question default (SPEC_FULL.md §9).
    fn flush_failed(&mut self, frames: Vec<PendingFrame>, link: &mut dyn Link) {
        for pending in frames {
            // Host Unreachable is sourced from the interface the packet
            // arrived on, same as Net Unreachable/Time Exceeded.
            let ingress_ip = self.interfaces.get(&pending.ingress).map(|i| i.ipv4).unwrap_or([0, 0, 0, 0]);
            self.send_icmp_error(
                IcmpType::DestHostUnreachable,
                &pending.packet,
                ingress_ip,
                &pending.ingress,
                pending.origin_mac,
                link,
            );
        }
    }

    /// Drains whatever the ARP-sweep thread has queued since the last tick
    /// and turns it into actual frames on `link`. Call once per iteration
    /// of the cooperative event loop.
    pub fn tick_with_link(&mut self, link: &mut dyn Link) {
        while let Ok(event) = self.sweep_rx.try_recv() {
            match event {
                SweepEvent::Probe { target, egress } => self.send_arp_request(target, &egress, link),
                SweepEvent::Failed { frames } => self.flush_failed(frames, link),
            }
        }
    }
}

/// The router has no per-tick bookkeeping that doesn't need a `Link` to act
/// on, so `Tickable` is a thin no-op; callers use [`Router::tick_with_link`]
/// from the event loop instead.
impl Tickable for Router {
    fn tick(&mut self) {}
}

impl Drop for Router {
    fn drop(&mut self) {
        self.sweep_stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.sweep_handle.take() {
            let _ = handle.join();
        }
    }
}
