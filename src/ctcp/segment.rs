//! The cTCP wire segment: a 16-byte header (seqno, ackno, len, flags,
//! window, cksum) followed by up to `MAX_PAYLOAD` bytes of data
//! (SPEC_FULL.md §3). Grounded in `original_source/lab3/ctcp.c`'s
//! `ctcp_segment_t`, with the one's-complement checksum actually computed
//! rather than TODO-stubbed (SPEC_FULL.md §9).

use std::io;

use bitflags::bitflags;

use crate::net::checksum::internet_checksum;

pub const SEGMENT_HEADER_LEN: usize = 16;
pub const MAX_PAYLOAD: usize = 1400;

bitflags! {
    /// Segment flags. `ACK` is set on every segment carrying a valid ackno;
    /// `FIN` marks end-of-stream and consumes no sequence space
    /// (SPEC_FULL.md §9).
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct SegmentFlags: u16 {
        const ACK = 0b01;
        const FIN = 0b10;
    }
}

/// A single cTCP segment.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Segment {
    pub seqno: u32,
    pub ackno: u32,
    pub flags: SegmentFlags,
    pub window: u16,
    pub checksum: u16,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(seqno: u32, ackno: u32, flags: SegmentFlags, window: u16, data: Vec<u8>) -> Self {
        let mut seg = Self {
            seqno,
            ackno,
            flags,
            window,
            checksum: 0,
            data,
        };
        seg.recompute_checksum();
        seg
    }

    /// The declared on-wire length: header plus payload, never `strlen`
    /// (SPEC_FULL.md §9 — checksums and lengths are computed over exactly
    /// this many bytes).
    pub fn len(&self) -> u16 {
        (SEGMENT_HEADER_LEN + self.data.len()) as u16
    }

    pub fn recompute_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.to_bytes());
    }

    pub fn checksum_valid(&self) -> bool {
        let mut bytes = self.to_bytes();
        bytes[14] = 0;
        bytes[15] = 0;
        internet_checksum(&bytes) == self.checksum
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        if bytes.len() < SEGMENT_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "runt segment: shorter than the cTCP header",
            ));
        }

        let seqno = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let ackno = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let len = u16::from_be_bytes(bytes[8..10].try_into().unwrap()) as usize;
        let flags = SegmentFlags::from_bits_truncate(u16::from_be_bytes(bytes[10..12].try_into().unwrap()));
        let window = u16::from_be_bytes(bytes[12..14].try_into().unwrap());
        let checksum = u16::from_be_bytes(bytes[14..16].try_into().unwrap());

        if len < SEGMENT_HEADER_LEN || bytes.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "segment shorter than its declared length",
            ));
        }

        let data = bytes[SEGMENT_HEADER_LEN..len].to_vec();

        Ok(Self {
            seqno,
            ackno,
            flags,
            window,
            checksum,
            data,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SEGMENT_HEADER_LEN + self.data.len());
        bytes.extend_from_slice(&self.seqno.to_be_bytes());
        bytes.extend_from_slice(&self.ackno.to_be_bytes());
        bytes.extend_from_slice(&self.len().to_be_bytes());
        bytes.extend_from_slice(&self.flags.bits().to_be_bytes());
        bytes.extend_from_slice(&self.window.to_be_bytes());
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }
}
