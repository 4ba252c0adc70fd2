//! The I/O substrate, modeled as a trait so the router and transport cores
//! never touch raw sockets directly.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// A link-layer (router) or datagram (transport) send/receive sink.
///
/// `poll` is the cooperative event loop's inbound hook: it's called once per
/// iteration and processes at most the frames it returns, rather than
/// blocking on a callback registration.
pub trait Link {
    fn send(&mut self, frame: Vec<u8>, egress: &str);
    fn poll(&mut self) -> Option<(Vec<u8>, String)>;
}

/// An in-process reference `Link` built from a pair of `Rc<RefCell<_>>`
/// ports drained on each `transmit`. Used to wire topologies together in
/// tests and the bundled binaries without any real socket or raw-capture
/// dependency.
#[derive(Debug, Clone, Default)]
pub struct ChannelPort {
    incoming: VecDeque<Vec<u8>>,
    outgoing: VecDeque<Vec<u8>>,
    peer: Option<Rc<RefCell<ChannelPort>>>,
}

impl ChannelPort {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Connects two ports bidirectionally.
    ///
    /// # Panics
    /// Panics if either port already has a peer.
    pub fn connect(a: &Rc<RefCell<ChannelPort>>, b: &Rc<RefCell<ChannelPort>>) {
        if a.borrow().peer.is_some() || b.borrow().peer.is_some() {
            panic!("ChannelPort already connected");
        }
        a.borrow_mut().peer = Some(b.clone());
        b.borrow_mut().peer = Some(a.clone());
    }

    pub fn disconnect(&mut self) {
        if let Some(peer) = self.peer.take() {
            peer.borrow_mut().peer = None;
        }
    }
}

/// Simulates the physical medium: on each `transmit`, every port's outgoing
/// buffer drains into its peer's incoming buffer.
#[derive(Default)]
pub struct CableSimulator {
    ports: Vec<Rc<RefCell<ChannelPort>>>,
}

impl CableSimulator {
    pub fn add(&mut self, port: Rc<RefCell<ChannelPort>>) {
        self.ports.push(port);
    }

    pub fn transmit(&mut self) {
        for port in &self.ports {
            let mut port = port.borrow_mut();
            let outgoing: Vec<_> = port.outgoing.drain(..).collect();
            if let Some(peer) = port.peer.clone() {
                peer.borrow_mut().incoming.extend(outgoing);
            }
        }
    }
}

/// A named collection of [`ChannelPort`]s, one per interface, implementing
/// [`Link`]. Each egress name maps to exactly one port.
pub struct ChannelLink {
    ports: HashMap<String, Rc<RefCell<ChannelPort>>>,
}

impl ChannelLink {
    pub fn new() -> Self {
        Self {
            ports: HashMap::new(),
        }
    }

    pub fn add_port(&mut self, name: impl Into<String>, port: Rc<RefCell<ChannelPort>>) {
        self.ports.insert(name.into(), port);
    }
}

impl Default for ChannelLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Link for ChannelLink {
    fn send(&mut self, frame: Vec<u8>, egress: &str) {
        if let Some(port) = self.ports.get(egress) {
            port.borrow_mut().outgoing.push_back(frame);
        }
    }

    fn poll(&mut self) -> Option<(Vec<u8>, String)> {
        for (name, port) in self.ports.iter() {
            let mut port = port.borrow_mut();
            if let Some(frame) = port.incoming.pop_front() {
                return Some((frame, name.clone()));
            }
        }
        None
    }
}
