/// A data-link physical address.
pub type MacAddress = [u8; 6];

pub const BROADCAST: MacAddress = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Builds a MAC address out of a seed, clearing the multicast bit.
#[macro_export]
macro_rules! mac_addr {
    ($num:expr) => {{
        let num = $num as u64;
        [
            (((num >> 40) & 0xff) as u8 & 0xFE), // clear multicast bit
            ((num >> 32) & 0xff) as u8,
            ((num >> 24) & 0xff) as u8,
            ((num >> 16) & 0xff) as u8,
            ((num >> 8) & 0xff) as u8,
            (num & 0xff) as u8,
        ]
    }};
}

pub fn is_multicast_or_broadcast(addr: MacAddress) -> bool {
    addr[0] & 0x01 == 0x01 || addr == BROADCAST
}

pub fn format_mac(addr: MacAddress) -> String {
    addr.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

pub fn parse_mac(s: &str) -> Option<MacAddress> {
    let mut out = [0u8; 6];
    let parts: Vec<_> = s.split(':').collect();
    if parts.len() != 6 {
        return None;
    }
    for (i, p) in parts.iter().enumerate() {
        out[i] = u8::from_str_radix(p, 16).ok()?;
    }
    Some(out)
}
