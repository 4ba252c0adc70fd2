use std::io;

use super::ipv4::Ipv4Address;
use super::mac::MacAddress;

pub const ARP_FRAME_LEN: usize = 28;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArpOperation {
    Request,
    Reply,
}

impl ArpOperation {
    fn to_u16(self) -> u16 {
        match self {
            ArpOperation::Request => 1,
            ArpOperation::Reply => 2,
        }
    }
}

impl TryFrom<u16> for ArpOperation {
    type Error = io::Error;

    fn try_from(item: u16) -> Result<Self, Self::Error> {
        match item {
            1 => Ok(Self::Request),
            2 => Ok(Self::Reply),
            _ => Err(io::Error::new(io::ErrorKind::InvalidData, "invalid ARP opcode")),
        }
    }
}

/// The IPv4-over-Ethernet ARP variant: 28 bytes, no options.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ArpFrame {
    pub opcode: ArpOperation,
    pub sender_mac: MacAddress,
    pub sender_ip: Ipv4Address,
    pub target_mac: MacAddress,
    pub target_ip: Ipv4Address,
}

impl ArpFrame {
    pub fn new(
        opcode: ArpOperation,
        sender_mac: MacAddress,
        sender_ip: Ipv4Address,
        target_mac: MacAddress,
        target_ip: Ipv4Address,
    ) -> Self {
        Self {
            opcode,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    pub fn request(sender_mac: MacAddress, sender_ip: Ipv4Address, target_ip: Ipv4Address) -> Self {
        Self::new(
            ArpOperation::Request,
            sender_mac,
            sender_ip,
            [0; 6],
            target_ip,
        )
    }

    pub fn reply(
        sender_mac: MacAddress,
        sender_ip: Ipv4Address,
        target_mac: MacAddress,
        target_ip: Ipv4Address,
    ) -> Self {
        Self::new(ArpOperation::Reply, sender_mac, sender_ip, target_mac, target_ip)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        if bytes.len() != ARP_FRAME_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid ARP frame length"));
        }

        // hardware_type (2) + protocol_type (2) + hardware_size (1) + protocol_size (1) = bytes[0..6]
        let opcode = u16::from_be_bytes([bytes[6], bytes[7]]).try_into()?;
        let sender_mac: MacAddress = bytes[8..14].try_into().unwrap();
        let sender_ip: Ipv4Address = bytes[14..18].try_into().unwrap();
        let target_mac: MacAddress = bytes[18..24].try_into().unwrap();
        let target_ip: Ipv4Address = bytes[24..28].try_into().unwrap();

        Ok(Self {
            opcode,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ARP_FRAME_LEN);
        bytes.extend_from_slice(&1u16.to_be_bytes()); // hardware_type: Ethernet
        bytes.extend_from_slice(&0x0800u16.to_be_bytes()); // protocol_type: IPv4
        bytes.push(6); // hardware_size
        bytes.push(4); // protocol_size
        bytes.extend_from_slice(&self.opcode.to_u16().to_be_bytes());
        bytes.extend_from_slice(&self.sender_mac);
        bytes.extend_from_slice(&self.sender_ip);
        bytes.extend_from_slice(&self.target_mac);
        bytes.extend_from_slice(&self.target_ip);
        bytes
    }
}
