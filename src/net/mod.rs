//! The router half of the data plane: Ethernet/ARP/IPv4/ICMP framing,
//! the ARP cache, the routing table and the `Router` core that ties them
//! together (SPEC_FULL.md §3–§4.5).

pub mod arp;
pub mod arp_cache;
pub mod checksum;
pub mod config;
pub mod ethernet;
pub mod icmp;
pub mod interface;
pub mod ipv4;
pub mod mac;
pub mod route;
pub mod router;

pub use router::Router;
