use std::collections::HashMap;

use super::ipv4::Ipv4Address;
use super::mac::MacAddress;

/// A router interface: immutable once the router is built.
#[derive(Debug, Clone, Copy)]
pub struct Interface {
    pub mac: MacAddress,
    pub ipv4: Ipv4Address,
}

/// Immutable map from interface name to its link/network address.
#[derive(Debug, Default)]
pub struct InterfaceTable {
    by_name: HashMap<String, Interface>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, interface: Interface) {
        self.by_name.insert(name.into(), interface);
    }

    pub fn get(&self, name: &str) -> Option<&Interface> {
        self.by_name.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// The interface whose IPv4 address matches `addr`, if any — used to
    /// decide whether a packet is destined for local delivery.
    pub fn find_by_ipv4(&self, addr: Ipv4Address) -> Option<(&str, &Interface)> {
        self.by_name
            .iter()
            .find(|(_, iface)| iface.ipv4 == addr)
            .map(|(name, iface)| (name.as_str(), iface))
    }
}
