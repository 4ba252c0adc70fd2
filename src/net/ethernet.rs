use std::io;

use super::mac::MacAddress;

pub const ETHERNET_HEADER_LEN: usize = 14; // dst(6) + src(6) + ethertype(2)

/// Ethernet II EtherType field.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EtherType {
    Ipv4,
    Arp,
    Other(u16),
}

impl EtherType {
    fn to_u16(self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
            EtherType::Other(v) => v,
        }
    }

    /// The minimum total frame length (header + payload) this crate accepts
    /// for the given ethertype: enough room to parse the protocol header
    /// that follows.
    pub fn minimum_frame_len(self) -> usize {
        match self {
            EtherType::Arp => ETHERNET_HEADER_LEN + 28,
            EtherType::Ipv4 => ETHERNET_HEADER_LEN + 20,
            EtherType::Other(_) => ETHERNET_HEADER_LEN,
        }
    }
}

impl From<u16> for EtherType {
    fn from(item: u16) -> Self {
        match item {
            0x0800 => Self::Ipv4,
            0x0806 => Self::Arp,
            other => Self::Other(other),
        }
    }
}

/// An Ethernet II frame: 14-byte header (destination, source, ethertype)
/// followed by the payload. No preamble/SFD/FCS — the simulated medium
/// carries exact frames.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EthernetFrame {
    pub destination: MacAddress,
    pub source: MacAddress,
    pub ether_type: EtherType,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(
        destination: MacAddress,
        source: MacAddress,
        ether_type: EtherType,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            destination,
            source,
            ether_type,
            payload,
        }
    }

    /// Parses a frame, rejecting anything shorter than the minimum length
    /// for its declared ethertype (runt frame).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        if bytes.len() < ETHERNET_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "runt frame: shorter than the Ethernet header",
            ));
        }

        let destination: MacAddress = bytes[0..6].try_into().unwrap();
        let source: MacAddress = bytes[6..12].try_into().unwrap();
        let ether_type: EtherType = u16::from_be_bytes([bytes[12], bytes[13]]).into();

        if bytes.len() < ether_type.minimum_frame_len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "runt frame: shorter than the minimum for its ethertype",
            ));
        }

        Ok(Self {
            destination,
            source,
            ether_type,
            payload: bytes[ETHERNET_HEADER_LEN..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ETHERNET_HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&self.destination);
        bytes.extend_from_slice(&self.source);
        bytes.extend_from_slice(&self.ether_type.to_u16().to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
