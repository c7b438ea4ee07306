//! Frame parsing
//!
//! Bounds-checked extraction of the IPv4 destination from a raw
//! Ethernet frame. Every field read is guarded by a length check
//! against the frame; truncated or non-IPv4 input yields `None` and
//! nothing else.

/// Ethernet header length
pub const ETH_HDR_LEN: usize = 14;
/// Minimum IPv4 header length
pub const IPV4_HDR_LEN: usize = 20;
/// EtherType for IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Extract the destination address from an IPv4 frame.
#[inline(always)]
pub fn ipv4_dest(frame: &[u8]) -> Option<u32> {
    if frame.len() < ETH_HDR_LEN {
        return None;
    }
    let ethertype = u16::from_be_bytes([frame[12], frame[13]]);
    if ethertype != ETHERTYPE_IPV4 {
        return None;
    }
    if frame.len() < ETH_HDR_LEN + IPV4_HDR_LEN {
        return None;
    }
    Some(u32::from_be_bytes([
        frame[ETH_HDR_LEN + 16],
        frame[ETH_HDR_LEN + 17],
        frame[ETH_HDR_LEN + 18],
        frame[ETH_HDR_LEN + 19],
    ]))
}
