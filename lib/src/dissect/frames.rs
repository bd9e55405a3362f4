//! Frame builders shared by tests across the crate
#![allow(missing_docs)]

use pnet::{
    packet::{MutablePacket, arp, ethernet, icmp, icmpv6, ip, ipv4, ipv6, tcp, udp},
    util,
};
use std::net;

const PKT_ETH_SIZE: usize = ethernet::EthernetPacket::minimum_packet_size();
const PKT_ARP_SIZE: usize = arp::ArpPacket::minimum_packet_size();
const PKT_IP4_SIZE: usize = ipv4::Ipv4Packet::minimum_packet_size();
const PKT_IP6_SIZE: usize = ipv6::Ipv6Packet::minimum_packet_size();
const PKT_TCP_SIZE: usize = tcp::TcpPacket::minimum_packet_size();
const PKT_UDP_SIZE: usize = udp::UdpPacket::minimum_packet_size();
const PKT_ICMP_SIZE: usize = icmp::IcmpPacket::minimum_packet_size();
const PKT_ICMP6_SIZE: usize = icmpv6::Icmpv6Packet::minimum_packet_size();

// 20 bytes of zeroed TCP options gives the canonical 74-byte SYN frame
const TCP_OPTIONS_SIZE: usize = 20;

fn build_ipv4_packet(
    source_ip: net::Ipv4Addr,
    dest_ip: net::Ipv4Addr,
    protocol: ip::IpNextHeaderProtocol,
    payload: &[u8],
) -> Vec<u8> {
    let ip_len = PKT_IP4_SIZE + payload.len();
    let mut ip_buffer = vec![0u8; ip_len];

    let mut ip_header = ipv4::MutableIpv4Packet::new(&mut ip_buffer)
        .expect("failed to generate ip header");

    ip_header.set_version(4);
    ip_header.set_header_length(5);
    ip_header.set_ttl(64);
    ip_header.set_total_length(ip_len as u16);
    ip_header.set_next_level_protocol(protocol);
    ip_header.set_source(source_ip);
    ip_header.set_destination(dest_ip);
    ip_header.set_payload(payload);
    ip_header.set_checksum(ipv4::checksum(&ip_header.to_immutable()));

    ip_buffer
}

fn build_ipv6_packet(
    source_ip: net::Ipv6Addr,
    dest_ip: net::Ipv6Addr,
    next_header: ip::IpNextHeaderProtocol,
    payload: &[u8],
) -> Vec<u8> {
    let mut ip_buffer = vec![0u8; PKT_IP6_SIZE + payload.len()];

    let mut ip_header = ipv6::MutableIpv6Packet::new(&mut ip_buffer)
        .expect("failed to generate ipv6 header");

    ip_header.set_version(6);
    ip_header.set_payload_length(payload.len() as u16);
    ip_header.set_next_header(next_header);
    ip_header.set_hop_limit(64);
    ip_header.set_source(source_ip);
    ip_header.set_destination(dest_ip);
    ip_header.set_payload(payload);

    ip_buffer
}

fn wrap_ethernet(
    ethertype: ethernet::EtherType,
    payload: &[u8],
) -> Vec<u8> {
    let mut pkt_buf = vec![0u8; PKT_ETH_SIZE + payload.len()];

    let mut eth_header = ethernet::MutableEthernetPacket::new(&mut pkt_buf)
        .expect("failed to generate ethernet header");

    eth_header.set_source(util::MacAddr::default());
    eth_header.set_destination(util::MacAddr::broadcast());
    eth_header.set_ethertype(ethertype);
    eth_header.set_payload(payload);

    pkt_buf
}

pub fn create_tcp_frame(
    source_ip: net::Ipv4Addr,
    source_port: u16,
    dest_ip: net::Ipv4Addr,
    dest_port: u16,
    flags: u8,
) -> Vec<u8> {
    let mut tcp_buffer = [0u8; PKT_TCP_SIZE + TCP_OPTIONS_SIZE];

    let mut tcp_header = tcp::MutableTcpPacket::new(&mut tcp_buffer)
        .expect("failed to generate tcp header");

    tcp_header.set_source(source_port);
    tcp_header.set_destination(dest_port);
    tcp_header.set_flags(flags);
    tcp_header.set_data_offset(10);
    tcp_header.set_sequence(0);
    tcp_header.set_window(64240);
    tcp_header.set_checksum(tcp::ipv4_checksum(
        &tcp_header.to_immutable(),
        &source_ip,
        &dest_ip,
    ));

    wrap_ethernet(
        ethernet::EtherTypes::Ipv4,
        &build_ipv4_packet(
            source_ip,
            dest_ip,
            ip::IpNextHeaderProtocols::Tcp,
            &tcp_buffer,
        ),
    )
}

pub fn create_udp_frame(
    source_ip: net::Ipv4Addr,
    source_port: u16,
    dest_ip: net::Ipv4Addr,
    dest_port: u16,
) -> Vec<u8> {
    let mut udp_buffer = [0u8; PKT_UDP_SIZE];

    let mut udp_header = udp::MutableUdpPacket::new(&mut udp_buffer)
        .expect("failed to generate udp header");

    udp_header.set_source(source_port);
    udp_header.set_destination(dest_port);
    udp_header.set_length(PKT_UDP_SIZE as u16);
    udp_header.set_checksum(udp::ipv4_checksum(
        &udp_header.to_immutable(),
        &source_ip,
        &dest_ip,
    ));

    wrap_ethernet(
        ethernet::EtherTypes::Ipv4,
        &build_ipv4_packet(
            source_ip,
            dest_ip,
            ip::IpNextHeaderProtocols::Udp,
            &udp_buffer,
        ),
    )
}

pub fn create_icmp_echo_frame(
    source_ip: net::Ipv4Addr,
    dest_ip: net::Ipv4Addr,
) -> Vec<u8> {
    let mut icmp_buffer = [0u8; PKT_ICMP_SIZE];

    let mut icmp_header = icmp::MutableIcmpPacket::new(&mut icmp_buffer)
        .expect("failed to generate icmp header");

    icmp_header.set_icmp_type(icmp::IcmpTypes::EchoRequest);
    icmp_header.set_icmp_code(icmp::IcmpCode(0));
    icmp_header.set_checksum(icmp::checksum(&icmp_header.to_immutable()));

    wrap_ethernet(
        ethernet::EtherTypes::Ipv4,
        &build_ipv4_packet(
            source_ip,
            dest_ip,
            ip::IpNextHeaderProtocols::Icmp,
            &icmp_buffer,
        ),
    )
}

pub fn create_igmp_report_frame(
    source_ip: net::Ipv4Addr,
    group: net::Ipv4Addr,
) -> Vec<u8> {
    // IGMPv2 membership report: type, max resp time, checksum, group
    let mut igmp_buffer = [0u8; 8];
    igmp_buffer[0] = 0x16;
    igmp_buffer[4..8].copy_from_slice(&group.octets());

    wrap_ethernet(
        ethernet::EtherTypes::Ipv4,
        &build_ipv4_packet(
            source_ip,
            group,
            ip::IpNextHeaderProtocols::Igmp,
            &igmp_buffer,
        ),
    )
}

pub fn create_unknown_transport_frame(
    source_ip: net::Ipv4Addr,
    dest_ip: net::Ipv4Addr,
    protocol: u8,
) -> Vec<u8> {
    wrap_ethernet(
        ethernet::EtherTypes::Ipv4,
        &build_ipv4_packet(
            source_ip,
            dest_ip,
            ip::IpNextHeaderProtocol(protocol),
            &[0u8; 4],
        ),
    )
}

pub fn create_ipv6_tcp_frame(
    source_ip: net::Ipv6Addr,
    source_port: u16,
    dest_ip: net::Ipv6Addr,
    dest_port: u16,
    flags: u8,
) -> Vec<u8> {
    let mut tcp_buffer = [0u8; PKT_TCP_SIZE];

    let mut tcp_header = tcp::MutableTcpPacket::new(&mut tcp_buffer)
        .expect("failed to generate tcp header");

    tcp_header.set_source(source_port);
    tcp_header.set_destination(dest_port);
    tcp_header.set_flags(flags);
    tcp_header.set_data_offset(5);
    tcp_header.set_window(64240);
    tcp_header.set_checksum(tcp::ipv6_checksum(
        &tcp_header.to_immutable(),
        &source_ip,
        &dest_ip,
    ));

    wrap_ethernet(
        ethernet::EtherTypes::Ipv6,
        &build_ipv6_packet(
            source_ip,
            dest_ip,
            ip::IpNextHeaderProtocols::Tcp,
            &tcp_buffer,
        ),
    )
}

pub fn create_icmpv6_echo_frame(
    source_ip: net::Ipv6Addr,
    dest_ip: net::Ipv6Addr,
) -> Vec<u8> {
    let mut icmp_buffer = [0u8; PKT_ICMP6_SIZE];

    let mut icmp_header = icmpv6::MutableIcmpv6Packet::new(&mut icmp_buffer)
        .expect("failed to generate icmpv6 header");

    icmp_header.set_icmpv6_type(icmpv6::Icmpv6Types::EchoRequest);
    icmp_header.set_icmpv6_code(icmpv6::Icmpv6Code(0));
    icmp_header.set_checksum(icmpv6::checksum(
        &icmp_header.to_immutable(),
        &source_ip,
        &dest_ip,
    ));

    wrap_ethernet(
        ethernet::EtherTypes::Ipv6,
        &build_ipv6_packet(
            source_ip,
            dest_ip,
            ip::IpNextHeaderProtocols::Icmpv6,
            &icmp_buffer,
        ),
    )
}

pub fn create_arp_request_frame(
    sender_mac: util::MacAddr,
    sender_ip: net::Ipv4Addr,
    target_ip: net::Ipv4Addr,
) -> Vec<u8> {
    let mut arp_buffer = [0u8; PKT_ARP_SIZE];

    let mut arp_header = arp::MutableArpPacket::new(&mut arp_buffer)
        .expect("failed to generate arp header");

    arp_header.set_hardware_type(arp::ArpHardwareTypes::Ethernet);
    arp_header.set_protocol_type(ethernet::EtherTypes::Ipv4);
    arp_header.set_hw_addr_len(6);
    arp_header.set_proto_addr_len(4);
    arp_header.set_operation(arp::ArpOperations::Request);
    arp_header.set_sender_hw_addr(sender_mac);
    arp_header.set_sender_proto_addr(sender_ip);
    arp_header.set_target_hw_addr(util::MacAddr::zero());
    arp_header.set_target_proto_addr(target_ip);

    wrap_ethernet(ethernet::EtherTypes::Arp, &arp_buffer)
}

pub fn create_arp_reply_frame(
    sender_mac: util::MacAddr,
    sender_ip: net::Ipv4Addr,
    target_mac: util::MacAddr,
    target_ip: net::Ipv4Addr,
) -> Vec<u8> {
    let mut arp_buffer = [0u8; PKT_ARP_SIZE];

    let mut arp_header = arp::MutableArpPacket::new(&mut arp_buffer)
        .expect("failed to generate arp header");

    arp_header.set_hardware_type(arp::ArpHardwareTypes::Ethernet);
    arp_header.set_protocol_type(ethernet::EtherTypes::Ipv4);
    arp_header.set_hw_addr_len(6);
    arp_header.set_proto_addr_len(4);
    arp_header.set_operation(arp::ArpOperations::Reply);
    arp_header.set_sender_hw_addr(sender_mac);
    arp_header.set_sender_proto_addr(sender_ip);
    arp_header.set_target_hw_addr(target_mac);
    arp_header.set_target_proto_addr(target_ip);

    wrap_ethernet(ethernet::EtherTypes::Arp, &arp_buffer)
}

pub fn create_link_only_frame(source_mac: util::MacAddr) -> Vec<u8> {
    let mut pkt_buf = vec![0u8; PKT_ETH_SIZE + 46];

    let mut eth_header = ethernet::MutableEthernetPacket::new(&mut pkt_buf)
        .expect("failed to generate ethernet header");

    eth_header.set_source(source_mac);
    eth_header.set_destination(util::MacAddr::new(1, 2, 3, 4, 5, 6));
    // experimental ethertype: not a structured payload the dissector
    // descends into
    eth_header.set_ethertype(ethernet::EtherType(0x88b5));

    pkt_buf
}

pub fn create_truncated_arp_frame() -> Vec<u8> {
    // claims an ARP payload but carries too few bytes to parse one
    wrap_ethernet(ethernet::EtherTypes::Arp, &[0u8; 4])
}

pub fn create_null_udp_frame(
    source_ip: net::Ipv4Addr,
    source_port: u16,
    dest_ip: net::Ipv4Addr,
    dest_port: u16,
) -> Vec<u8> {
    let mut udp_buffer = [0u8; PKT_UDP_SIZE];

    let mut udp_header = udp::MutableUdpPacket::new(&mut udp_buffer)
        .expect("failed to generate udp header");

    udp_header.set_source(source_port);
    udp_header.set_destination(dest_port);
    udp_header.set_length(PKT_UDP_SIZE as u16);
    udp_header.set_checksum(udp::ipv4_checksum(
        &udp_header.to_immutable(),
        &source_ip,
        &dest_ip,
    ));

    let ip_packet = build_ipv4_packet(
        source_ip,
        dest_ip,
        ip::IpNextHeaderProtocols::Udp,
        &udp_buffer,
    );

    let mut pkt_buf = vec![0u8; 4 + ip_packet.len()];
    pkt_buf[..4].copy_from_slice(&2u32.to_le_bytes());
    pkt_buf[4..].copy_from_slice(&ip_packet);

    pkt_buf
}
