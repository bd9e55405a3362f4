//! Data structures for decoded packets and their persisted record form

use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr},
};

// pcap DLT values for the link types we recognize
const DLT_NULL: u16 = 0;
const DLT_EN10MB: u16 = 1;

fn serialize_to_string<S, T>(val: &T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: std::fmt::Display,
{
    s.serialize_str(&val.to_string())
}

/// The link-layer framing of a captured frame as reported by the capture
/// device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Ethernet II framing
    Ethernet,
    /// BSD null/loopback encapsulation
    Null,
    /// Any other pcap DLT value, carried through persistence untouched but
    /// never dissectable
    Other(u16),
}

impl LinkType {
    /// Returns the LinkType for a pcap DLT value
    pub fn from_dlt(dlt: u16) -> Self {
        match dlt {
            DLT_EN10MB => Self::Ethernet,
            DLT_NULL => Self::Null,
            other => Self::Other(other),
        }
    }

    /// Returns the pcap DLT value for this LinkType
    pub fn dlt(&self) -> u16 {
        match self {
            Self::Ethernet => DLT_EN10MB,
            Self::Null => DLT_NULL,
            Self::Other(dlt) => *dlt,
        }
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ethernet => write!(f, "Ethernet"),
            Self::Null => write!(f, "Null"),
            Self::Other(dlt) => write!(f, "DLT{}", dlt),
        }
    }
}

/// The parsed link layer of a decoded packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkLayer {
    /// An Ethernet II frame header
    Ethernet {
        /// Source hardware address
        #[serde(serialize_with = "serialize_to_string")]
        source: MacAddr,
        /// Destination hardware address
        #[serde(serialize_with = "serialize_to_string")]
        destination: MacAddr,
        /// Raw ethertype value
        ethertype: u16,
    },
    /// A BSD null/loopback pseudo header
    Null {
        /// Protocol family tag for the encapsulated payload
        family: u32,
    },
}

/// ARP operation kinds recognized by the dissector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArpOp {
    /// ARP request
    Request,
    /// ARP reply
    Reply,
}

/// The parsed network layer of a decoded packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NetworkLayer {
    /// No parseable structured payload below the link layer
    LinkOnly,
    /// An ARP packet riding directly on the link layer
    Arp {
        /// Request or reply
        operation: ArpOp,
        /// Sender hardware address
        #[serde(serialize_with = "serialize_to_string")]
        sender_mac: MacAddr,
        /// Sender protocol address
        sender_ip: Ipv4Addr,
        /// Target protocol address
        target_ip: Ipv4Addr,
    },
    /// An IPv4 header
    Ipv4 {
        /// Source address
        source: Ipv4Addr,
        /// Destination address
        destination: Ipv4Addr,
        /// IP protocol number of the payload
        protocol: u8,
        /// The parsed transport layer, if the payload was structured
        transport: Option<TransportLayer>,
    },
    /// An IPv6 header
    Ipv6 {
        /// Source address
        source: Ipv6Addr,
        /// Destination address
        destination: Ipv6Addr,
        /// Next-header protocol number of the payload
        protocol: u8,
        /// The parsed transport layer, if the payload was structured
        transport: Option<TransportLayer>,
    },
}

impl NetworkLayer {
    /// Returns the parsed transport layer if one is present
    pub fn transport(&self) -> Option<&TransportLayer> {
        match self {
            Self::Ipv4 { transport, .. } | Self::Ipv6 { transport, .. } => {
                transport.as_ref()
            }
            _ => None,
        }
    }
}

/// The parsed transport layer of a decoded packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransportLayer {
    /// A TCP segment header
    Tcp {
        /// Source port
        source_port: u16,
        /// Destination port
        destination_port: u16,
        /// Raw flag bits
        flags: u8,
        /// Sequence number
        sequence: u32,
        /// Acknowledgement number
        acknowledgement: u32,
        /// Receive window size
        window: u16,
    },
    /// A UDP datagram header
    Udp {
        /// Source port
        source_port: u16,
        /// Destination port
        destination_port: u16,
        /// Datagram length including header
        length: u16,
    },
    /// An ICMPv4 message header
    IcmpV4 {
        /// Message type
        icmp_type: u8,
        /// Message code
        icmp_code: u8,
    },
    /// An ICMPv6 message header
    IcmpV6 {
        /// Message type
        icmp_type: u8,
        /// Message code
        icmp_code: u8,
    },
    /// An IGMPv2 message header
    IgmpV2 {
        /// Message type
        igmp_type: u8,
        /// Multicast group address
        group: Ipv4Addr,
    },
}

/// A single captured frame decoded into its protocol-layer stack along with
/// a derived one-line summary
///
/// Instances are immutable once constructed; the summary fields are computed
/// exactly once by the dissector and are always consistent with the parsed
/// layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPacket {
    /// 1-based position of this packet within its capture session; unique
    /// and strictly increasing
    pub sequence: u64,
    /// Seconds elapsed between session start and frame arrival
    pub arrival_offset: f64,
    /// Length of the frame as it appeared on the wire
    pub wire_length: u32,
    /// Number of bytes actually captured
    pub captured_length: u32,
    /// Link-layer framing of the capture device
    pub link_type: LinkType,
    /// The full captured frame, retained for re-dissection and export
    pub raw: Vec<u8>,
    /// Number of successfully parsed layers starting at the link layer
    pub layer_count: u8,
    /// The parsed link layer
    pub link: LinkLayer,
    /// The parsed network layer
    pub network: NetworkLayer,
    /// Derived protocol name, e.g. "TCP" or "Arp"
    pub protocol: String,
    /// Derived textual source address
    pub source: String,
    /// Derived textual destination address
    pub destination: String,
    /// Derived one-line packet description
    pub info: String,
}

/// The persisted form of a captured frame
///
/// Holds exactly the inputs the dissector needs to reproduce a
/// [`DecodedPacket`]; derived fields are never persisted, so importing a
/// capture file always re-validates dissection logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// 1-based position of the packet within its capture session
    pub sequence: u64,
    /// Seconds elapsed between session start and frame arrival
    pub arrival_offset: f64,
    /// Length of the frame as it appeared on the wire
    pub wire_length: u32,
    /// Number of bytes actually captured
    pub captured_length: u32,
    /// Link-layer framing of the capture device
    pub link_type: LinkType,
    /// The full captured frame
    pub raw: Vec<u8>,
}

impl From<&DecodedPacket> for PacketRecord {
    fn from(packet: &DecodedPacket) -> Self {
        Self {
            sequence: packet.sequence,
            arrival_offset: packet.arrival_offset,
            wire_length: packet.wire_length,
            captured_length: packet.captured_length,
            link_type: packet.link_type,
            raw: packet.raw.clone(),
        }
    }
}

#[cfg(test)]
#[path = "./packet_tests.rs"]
mod tests;
