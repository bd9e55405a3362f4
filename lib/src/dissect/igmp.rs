//! Minimal IGMPv2 header view
//!
//! pnet ships no IGMP packet view, so the fixed 8-byte header is read
//! directly: type, max response time, checksum, group address.

use std::net::Ipv4Addr;

pub(crate) const MEMBERSHIP_QUERY: u8 = 0x11;
pub(crate) const MEMBERSHIP_REPORT: u8 = 0x16;
pub(crate) const LEAVE_GROUP: u8 = 0x17;

const IGMP_V2_HEADER_LEN: usize = 8;

pub(crate) struct IgmpV2Header {
    pub igmp_type: u8,
    pub group: Ipv4Addr,
}

pub(crate) fn parse(payload: &[u8]) -> Option<IgmpV2Header> {
    if payload.len() < IGMP_V2_HEADER_LEN {
        return None;
    }

    Some(IgmpV2Header {
        igmp_type: payload[0],
        group: Ipv4Addr::new(payload[4], payload[5], payload[6], payload[7]),
    })
}
