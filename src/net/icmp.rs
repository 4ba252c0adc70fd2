use std::io;

use super::checksum::internet_checksum;

pub const ICMP_HEADER_LEN: usize = 8;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IcmpType {
    EchoReply,
    EchoRequest,
    DestNetUnreachable,
    DestHostUnreachable,
    PortUnreachable,
    TimeExceeded,
}

impl IcmpType {
    fn type_code(self) -> (u8, u8) {
        match self {
            IcmpType::EchoReply => (0, 0),
            IcmpType::EchoRequest => (8, 0),
            IcmpType::DestNetUnreachable => (3, 0),
            IcmpType::DestHostUnreachable => (3, 1),
            IcmpType::PortUnreachable => (3, 3),
            IcmpType::TimeExceeded => (11, 0),
        }
    }

    fn from_type_code(t: u8, code: u8) -> Option<Self> {
        Some(match (t, code) {
            (0, 0) => IcmpType::EchoReply,
            (8, 0) => IcmpType::EchoRequest,
            (3, 0) => IcmpType::DestNetUnreachable,
            (3, 1) => IcmpType::DestHostUnreachable,
            (3, 3) => IcmpType::PortUnreachable,
            (11, 0) => IcmpType::TimeExceeded,
            _ => return None,
        })
    }
}

/// An ICMP message. Error messages (unreachable/time-exceeded) carry the
/// offending IPv4 header and the first 8 bytes of its payload as `data`,
/// matching the original's `send_icmp_error_packet`; echo messages carry
/// the echoed payload verbatim.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IcmpPacket {
    pub icmp_type: IcmpType,
    pub identifier: u16,
    pub sequence_number: u16,
    pub checksum: u16,
    pub data: Vec<u8>,
}

impl IcmpPacket {
    pub fn new(icmp_type: IcmpType, identifier: u16, sequence_number: u16, data: Vec<u8>) -> Self {
        let mut pkt = Self {
            icmp_type,
            identifier,
            sequence_number,
            checksum: 0,
            data,
        };
        pkt.recompute_checksum();
        pkt
    }

    pub fn echo_reply_to(request: &IcmpPacket) -> Self {
        Self::new(
            IcmpType::EchoReply,
            request.identifier,
            request.sequence_number,
            request.data.clone(),
        )
    }

    pub fn error(icmp_type: IcmpType, offending_ipv4_header_and_payload: Vec<u8>) -> Self {
        Self::new(icmp_type, 0, 0, offending_ipv4_header_and_payload)
    }

    pub fn recompute_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.to_bytes());
    }

    pub fn checksum_valid_over(&self, declared_len: usize) -> bool {
        let mut bytes = self.to_bytes();
        bytes.truncate(declared_len);
        let mut zeroed = bytes.clone();
        zeroed[2] = 0;
        zeroed[3] = 0;
        internet_checksum(&zeroed) == self.checksum
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        if bytes.len() < ICMP_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "runt frame: shorter than the ICMP header",
            ));
        }

        let icmp_type = IcmpType::from_type_code(bytes[0], bytes[1])
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unrecognized ICMP type/code"))?;
        let checksum = u16::from_be_bytes([bytes[2], bytes[3]]);
        let identifier = u16::from_be_bytes([bytes[4], bytes[5]]);
        let sequence_number = u16::from_be_bytes([bytes[6], bytes[7]]);
        let data = bytes[ICMP_HEADER_LEN..].to_vec();

        Ok(Self {
            icmp_type,
            identifier,
            sequence_number,
            checksum,
            data,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let (t, code) = self.icmp_type.type_code();
        let mut bytes = Vec::with_capacity(ICMP_HEADER_LEN + self.data.len());
        bytes.push(t);
        bytes.push(code);
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        bytes.extend_from_slice(&self.identifier.to_be_bytes());
        bytes.extend_from_slice(&self.sequence_number.to_be_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }
}
