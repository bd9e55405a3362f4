//! The protocol dissection pipeline
//!
//! [`dissect`] is a pure function from raw frame bytes plus capture metadata
//! to a [`DecodedPacket`]. It holds no state and performs no I/O, so the
//! same inputs always reproduce the same decoded packet - the property the
//! capture-file import path relies on.
//!
//! The classifier is an exhaustive match over a closed set of link types,
//! network protocols, and transport protocols. Every branch either returns
//! a fully populated packet or a named [`DissectionError`]; there are no
//! partially constructed packets.

use pnet::packet::{
    Packet, arp, ethernet, icmp, icmpv6, ip, ipv4, ipv6, tcp, udp,
};
use thiserror::Error;

use crate::packet::{
    ArpOp, DecodedPacket, LinkLayer, LinkType, NetworkLayer, PacketRecord,
    TransportLayer,
};

mod igmp;

// BSD null/loopback encapsulation family tags
const NULL_FAMILY_INET: u32 = 2;
const NULL_FAMILY_INET6_LINUX: u32 = 10;
const NULL_FAMILY_INET6_BSD: u32 = 24;
const NULL_FAMILY_INET6_FREEBSD: u32 = 28;
const NULL_FAMILY_INET6_DARWIN: u32 = 30;

/// Errors scoped to the dissection of a single frame
///
/// These never terminate a capture session; the arrival path drops the
/// offending frame and continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DissectionError {
    /// The capture device delivered a link type the dissector does not
    /// understand
    #[error("unsupported link type: {_0}")]
    UnsupportedLinkType(String),

    /// The layer stack was structured but not one the dissector recognizes
    #[error("unsupported layer stack: {_0}")]
    UnsupportedStack(String),

    /// The network layer carried an unrecognized transport protocol number
    #[error("unsupported transport protocol number: {_0}")]
    UnsupportedTransport(u8),

    /// A layer failed to parse as the structure its container promised
    #[error("malformed {_0} layer")]
    MalformedLayer(&'static str),
}

/// Dissects a raw captured frame into a [`DecodedPacket`]
///
/// `sequence` and `arrival_offset` are assigned by the capture session at
/// arrival time and carried through unchanged.
pub fn dissect(
    raw: &[u8],
    link_type: LinkType,
    sequence: u64,
    arrival_offset: f64,
    wire_length: u32,
    captured_length: u32,
) -> Result<DecodedPacket, DissectionError> {
    let (link, network) = match link_type {
        LinkType::Ethernet => dissect_ethernet(raw)?,
        LinkType::Null => dissect_null(raw)?,
        LinkType::Other(dlt) => {
            return Err(DissectionError::UnsupportedLinkType(format!(
                "DLT{}",
                dlt
            )));
        }
    };

    let layer_count = count_layers(&network);
    let summary = summarize(&link, &network);

    Ok(DecodedPacket {
        sequence,
        arrival_offset,
        wire_length,
        captured_length,
        link_type,
        raw: raw.to_vec(),
        layer_count,
        link,
        network,
        protocol: summary.protocol,
        source: summary.source,
        destination: summary.destination,
        info: summary.info,
    })
}

/// Dissects a persisted [`PacketRecord`] back into a [`DecodedPacket`]
///
/// Derived fields are recomputed from `raw` and `link_type`; nothing cached
/// in the record is trusted.
pub fn dissect_record(
    record: &PacketRecord,
) -> Result<DecodedPacket, DissectionError> {
    dissect(
        &record.raw,
        record.link_type,
        record.sequence,
        record.arrival_offset,
        record.wire_length,
        record.captured_length,
    )
}

fn dissect_ethernet(
    raw: &[u8],
) -> Result<(LinkLayer, NetworkLayer), DissectionError> {
    let eth = ethernet::EthernetPacket::new(raw)
        .ok_or(DissectionError::MalformedLayer("ethernet"))?;

    let link = LinkLayer::Ethernet {
        source: eth.get_source(),
        destination: eth.get_destination(),
        ethertype: eth.get_ethertype().0,
    };

    let network = match eth.get_ethertype() {
        ethernet::EtherTypes::Arp => dissect_arp(eth.payload())?,
        ethernet::EtherTypes::Ipv4 => dissect_ipv4(eth.payload())?,
        ethernet::EtherTypes::Ipv6 => dissect_ipv6(eth.payload())?,
        // any other ethertype stops the layer walk at the link layer
        _ => NetworkLayer::LinkOnly,
    };

    Ok((link, network))
}

fn dissect_null(
    raw: &[u8],
) -> Result<(LinkLayer, NetworkLayer), DissectionError> {
    if raw.len() < 4 {
        return Err(DissectionError::MalformedLayer("null"));
    }

    // the family tag is written in the capturing host's byte order
    let mut family =
        u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    if family > 0xff {
        family = family.swap_bytes();
    }

    let link = LinkLayer::Null { family };

    let network = match family {
        NULL_FAMILY_INET => dissect_ipv4(&raw[4..])?,
        NULL_FAMILY_INET6_LINUX | NULL_FAMILY_INET6_BSD
        | NULL_FAMILY_INET6_FREEBSD | NULL_FAMILY_INET6_DARWIN => {
            dissect_ipv6(&raw[4..])?
        }
        other => {
            return Err(DissectionError::UnsupportedStack(format!(
                "null encapsulation family {}",
                other
            )));
        }
    };

    Ok((link, network))
}

fn dissect_arp(payload: &[u8]) -> Result<NetworkLayer, DissectionError> {
    let header = arp::ArpPacket::new(payload)
        .ok_or(DissectionError::MalformedLayer("arp"))?;

    let operation = match header.get_operation() {
        arp::ArpOperations::Request => ArpOp::Request,
        arp::ArpOperations::Reply => ArpOp::Reply,
        op => {
            return Err(DissectionError::UnsupportedStack(format!(
                "arp operation {}",
                op.0
            )));
        }
    };

    Ok(NetworkLayer::Arp {
        operation,
        sender_mac: header.get_sender_hw_addr(),
        sender_ip: header.get_sender_proto_addr(),
        target_ip: header.get_target_proto_addr(),
    })
}

fn dissect_ipv4(payload: &[u8]) -> Result<NetworkLayer, DissectionError> {
    let header = ipv4::Ipv4Packet::new(payload)
        .ok_or(DissectionError::MalformedLayer("ipv4"))?;

    let protocol = header.get_next_level_protocol();
    let transport = dissect_transport(protocol, header.payload())?;

    Ok(NetworkLayer::Ipv4 {
        source: header.get_source(),
        destination: header.get_destination(),
        protocol: protocol.0,
        transport: Some(transport),
    })
}

fn dissect_ipv6(payload: &[u8]) -> Result<NetworkLayer, DissectionError> {
    let header = ipv6::Ipv6Packet::new(payload)
        .ok_or(DissectionError::MalformedLayer("ipv6"))?;

    let protocol = header.get_next_header();
    let transport = dissect_transport(protocol, header.payload())?;

    Ok(NetworkLayer::Ipv6 {
        source: header.get_source(),
        destination: header.get_destination(),
        protocol: protocol.0,
        transport: Some(transport),
    })
}

fn dissect_transport(
    protocol: ip::IpNextHeaderProtocol,
    payload: &[u8],
) -> Result<TransportLayer, DissectionError> {
    match protocol {
        ip::IpNextHeaderProtocols::Tcp => {
            let header = tcp::TcpPacket::new(payload)
                .ok_or(DissectionError::MalformedLayer("tcp"))?;
            Ok(TransportLayer::Tcp {
                source_port: header.get_source(),
                destination_port: header.get_destination(),
                flags: header.get_flags(),
                sequence: header.get_sequence(),
                acknowledgement: header.get_acknowledgement(),
                window: header.get_window(),
            })
        }
        ip::IpNextHeaderProtocols::Udp => {
            let header = udp::UdpPacket::new(payload)
                .ok_or(DissectionError::MalformedLayer("udp"))?;
            Ok(TransportLayer::Udp {
                source_port: header.get_source(),
                destination_port: header.get_destination(),
                length: header.get_length(),
            })
        }
        ip::IpNextHeaderProtocols::Icmp => {
            let header = icmp::IcmpPacket::new(payload)
                .ok_or(DissectionError::MalformedLayer("icmpv4"))?;
            Ok(TransportLayer::IcmpV4 {
                icmp_type: header.get_icmp_type().0,
                icmp_code: header.get_icmp_code().0,
            })
        }
        ip::IpNextHeaderProtocols::Icmpv6 => {
            let header = icmpv6::Icmpv6Packet::new(payload)
                .ok_or(DissectionError::MalformedLayer("icmpv6"))?;
            Ok(TransportLayer::IcmpV6 {
                icmp_type: header.get_icmpv6_type().0,
                icmp_code: header.get_icmpv6_code().0,
            })
        }
        ip::IpNextHeaderProtocols::Igmp => {
            let header = igmp::parse(payload)
                .ok_or(DissectionError::MalformedLayer("igmp"))?;
            Ok(TransportLayer::IgmpV2 {
                igmp_type: header.igmp_type,
                group: header.group,
            })
        }
        other => Err(DissectionError::UnsupportedTransport(other.0)),
    }
}

fn count_layers(network: &NetworkLayer) -> u8 {
    match network {
        NetworkLayer::LinkOnly => 1,
        NetworkLayer::Arp { .. } => 2,
        NetworkLayer::Ipv4 { transport, .. }
        | NetworkLayer::Ipv6 { transport, .. } => {
            2 + transport.is_some() as u8
        }
    }
}

struct Summary {
    protocol: String,
    source: String,
    destination: String,
    info: String,
}

fn summarize(link: &LinkLayer, network: &NetworkLayer) -> Summary {
    match network {
        // A single-layer frame is summarized as broadcast regardless of the
        // actual destination address in the header.
        NetworkLayer::LinkOnly => match link {
            LinkLayer::Ethernet {
                source, ethertype, ..
            } => Summary {
                protocol: ethertype_name(*ethertype),
                source: source.to_string(),
                destination: "broadcast".to_string(),
                info: "Ethernet II".to_string(),
            },
            LinkLayer::Null { family } => Summary {
                protocol: "Null".to_string(),
                source: "-".to_string(),
                destination: "-".to_string(),
                info: format!("Null/Loopback family {}", family),
            },
        },
        NetworkLayer::Arp {
            operation,
            sender_mac,
            sender_ip,
            target_ip,
        } => {
            let info = match operation {
                ArpOp::Request => {
                    format!("Who has {}? Tell {}", target_ip, sender_ip)
                }
                ArpOp::Reply => {
                    format!("{} is at {}", sender_ip, sender_mac)
                }
            };
            Summary {
                protocol: "Arp".to_string(),
                source: sender_ip.to_string(),
                destination: target_ip.to_string(),
                info,
            }
        }
        NetworkLayer::Ipv4 {
            source,
            destination,
            protocol,
            transport,
        } => ip_summary(
            source.to_string(),
            destination.to_string(),
            *protocol,
            transport.as_ref(),
        ),
        NetworkLayer::Ipv6 {
            source,
            destination,
            protocol,
            transport,
        } => ip_summary(
            source.to_string(),
            destination.to_string(),
            *protocol,
            transport.as_ref(),
        ),
    }
}

fn ip_summary(
    source: String,
    destination: String,
    protocol: u8,
    transport: Option<&TransportLayer>,
) -> Summary {
    let (protocol, info) = match transport {
        Some(transport) => transport_summary(transport),
        // unreachable today: an IP layer without a parsed transport is
        // rejected before summarization
        None => ("IP".to_string(), format!("Protocol {}", protocol)),
    };

    Summary {
        protocol,
        source,
        destination,
        info,
    }
}

fn transport_summary(transport: &TransportLayer) -> (String, String) {
    match transport {
        TransportLayer::Tcp {
            source_port,
            destination_port,
            flags,
            sequence,
            acknowledgement,
            window,
        } => (
            "TCP".to_string(),
            format!(
                "{} -> {} [{}] Seq={} Ack={} Win={}",
                source_port,
                destination_port,
                tcp_flags_text(*flags),
                sequence,
                acknowledgement,
                window
            ),
        ),
        TransportLayer::Udp {
            source_port,
            destination_port,
            length,
        } => (
            "UDP".to_string(),
            format!("{} -> {} Len={}", source_port, destination_port, length),
        ),
        TransportLayer::IcmpV4 {
            icmp_type,
            icmp_code,
        } => {
            let info = match (icmp_type, icmp_code) {
                (8, 0) => "Echo (ping) request".to_string(),
                (0, 0) => "Echo (ping) reply".to_string(),
                (t, c) => format!("Type={} Code={}", t, c),
            };
            ("ICMPv4".to_string(), info)
        }
        TransportLayer::IcmpV6 {
            icmp_type,
            icmp_code,
        } => (
            "ICMPv6".to_string(),
            format!("Type={} Code={}", icmp_type, icmp_code),
        ),
        TransportLayer::IgmpV2 { igmp_type, group } => {
            let info = match *igmp_type {
                igmp::MEMBERSHIP_QUERY => {
                    format!("Membership Query group={}", group)
                }
                igmp::MEMBERSHIP_REPORT => {
                    format!("Membership Report group={}", group)
                }
                igmp::LEAVE_GROUP => format!("Leave Group group={}", group),
                t => format!("Type=0x{:02x} group={}", t, group),
            };
            ("IGMPv2".to_string(), info)
        }
    }
}

fn tcp_flags_text(flags: u8) -> String {
    let mut names: Vec<&str> = Vec::new();

    if flags & tcp::TcpFlags::FIN != 0 {
        names.push("FIN");
    }
    if flags & tcp::TcpFlags::SYN != 0 {
        names.push("SYN");
    }
    if flags & tcp::TcpFlags::RST != 0 {
        names.push("RST");
    }
    if flags & tcp::TcpFlags::PSH != 0 {
        names.push("PSH");
    }
    if flags & tcp::TcpFlags::ACK != 0 {
        names.push("ACK");
    }
    if flags & tcp::TcpFlags::URG != 0 {
        names.push("URG");
    }

    names.join(", ")
}

fn ethertype_name(ethertype: u16) -> String {
    match ethernet::EtherType(ethertype) {
        ethernet::EtherTypes::Ipv4 => "IPv4".to_string(),
        ethernet::EtherTypes::Ipv6 => "IPv6".to_string(),
        ethernet::EtherTypes::Arp => "Arp".to_string(),
        other => format!("0x{:04x}", other.0),
    }
}

#[cfg(test)]
#[path = "./dissect/frames.rs"]
#[doc(hidden)]
pub mod frames;

#[cfg(test)]
#[path = "./dissect_tests.rs"]
mod tests;
