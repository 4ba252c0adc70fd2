use std::io;

use super::checksum::internet_checksum;

pub type Ipv4Address = [u8; 4];

pub const IPV4_HEADER_LEN: usize = 20; // no options
pub const INIT_TTL: u8 = 64;

pub fn format_ipv4(addr: Ipv4Address) -> String {
    format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
}

pub fn parse_ipv4(s: &str) -> Option<Ipv4Address> {
    let mut out = [0u8; 4];
    let parts: Vec<_> = s.split('.').collect();
    if parts.len() != 4 {
        return None;
    }
    for (i, p) in parts.iter().enumerate() {
        out[i] = p.parse().ok()?;
    }
    Some(out)
}

/// The network address of `addr` under `mask` (`addr & mask`).
pub fn network_address(addr: Ipv4Address, mask: Ipv4Address) -> Ipv4Address {
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = addr[i] & mask[i];
    }
    out
}

pub fn mask_len(mask: Ipv4Address) -> u32 {
    u32::from_be_bytes(mask).count_ones()
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Ipv4Protocol {
    Icmp,
    Other(u8),
}

impl Ipv4Protocol {
    fn to_u8(self) -> u8 {
        match self {
            Ipv4Protocol::Icmp => 1,
            Ipv4Protocol::Other(v) => v,
        }
    }
}

impl From<u8> for Ipv4Protocol {
    fn from(item: u8) -> Self {
        match item {
            1 => Self::Icmp,
            other => Self::Other(other),
        }
    }
}

/// An IPv4 datagram. No options, no fragmentation (both explicit non-goals).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Ipv4Packet {
    pub ttl: u8,
    pub protocol: Ipv4Protocol,
    pub checksum: u16,
    pub source: Ipv4Address,
    pub destination: Ipv4Address,
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    pub fn new(
        source: Ipv4Address,
        destination: Ipv4Address,
        ttl: u8,
        protocol: Ipv4Protocol,
        payload: Vec<u8>,
    ) -> Self {
        let mut pkt = Self {
            ttl,
            protocol,
            checksum: 0,
            source,
            destination,
            payload,
        };
        pkt.recompute_checksum();
        pkt
    }

    /// Recomputes `checksum` over the 20-byte header with the checksum
    /// field zeroed, per the one's-complement convention.
    pub fn recompute_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.header_bytes());
    }

    pub fn checksum_valid(&self) -> bool {
        internet_checksum(&self.header_bytes_with_checksum_zeroed()) == self.checksum
    }

    fn header_bytes_with_checksum_zeroed(&self) -> Vec<u8> {
        let mut h = self.header_bytes();
        h[10] = 0;
        h[11] = 0;
        h
    }

    fn header_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(IPV4_HEADER_LEN);
        bytes.push(0x45); // version 4, IHL 5 words
        bytes.push(0); // type of service
        let total_len = (IPV4_HEADER_LEN + self.payload.len()) as u16;
        bytes.extend_from_slice(&total_len.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes()); // identification
        bytes.extend_from_slice(&0u16.to_be_bytes()); // flags + fragment offset
        bytes.push(self.ttl);
        bytes.push(self.protocol.to_u8());
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        bytes.extend_from_slice(&self.source);
        bytes.extend_from_slice(&self.destination);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        if bytes.len() < IPV4_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "runt frame: shorter than the IPv4 header",
            ));
        }

        let ttl = bytes[8];
        let protocol = Ipv4Protocol::from(bytes[9]);
        let checksum = u16::from_be_bytes([bytes[10], bytes[11]]);
        let source: Ipv4Address = bytes[12..16].try_into().unwrap();
        let destination: Ipv4Address = bytes[16..20].try_into().unwrap();
        let payload = bytes[IPV4_HEADER_LEN..].to_vec();

        Ok(Self {
            ttl,
            protocol,
            checksum,
            source,
            destination,
            payload,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
