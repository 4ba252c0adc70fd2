#![allow(non_snake_case)]

use crate::link::{CableSimulator, ChannelLink, ChannelPort, Link};
use crate::mac_addr;
use crate::net::arp::{ArpFrame, ArpOperation};
use crate::net::ethernet::{EtherType, EthernetFrame};
use crate::net::icmp::{IcmpPacket, IcmpType};
use crate::net::interface::{Interface, InterfaceTable};
use crate::net::ipv4::{Ipv4Packet, Ipv4Protocol, INIT_TTL};
use crate::net::route::{Route, RoutingTable};
use crate::net::router::Router;

fn host_mac() -> [u8; 6] {
    mac_addr!(2)
}

fn router_mac_eth0() -> [u8; 6] {
    mac_addr!(1)
}

/// Wires one router interface to one simulated host over a `ChannelPort`
/// pair, with both ends wrapped in their own `ChannelLink` so the test only
/// touches the public `Link` API.
fn single_interface_router() -> (Router, ChannelLink, ChannelLink, CableSimulator) {
    let mut interfaces = InterfaceTable::new();
    interfaces.insert(
        "eth0",
        Interface {
            mac: router_mac_eth0(),
            ipv4: [10, 0, 0, 1],
        },
    );
    let router = Router::new(interfaces, RoutingTable::new());

    let router_port = ChannelPort::new();
    let host_port = ChannelPort::new();
    ChannelPort::connect(&router_port, &host_port);

    let mut router_link = ChannelLink::new();
    router_link.add_port("eth0", router_port.clone());
    let mut host_link = ChannelLink::new();
    host_link.add_port("host", host_port.clone());

    let mut sim = CableSimulator::default();
    sim.add(router_port);
    sim.add(host_port);

    (router, router_link, host_link, sim)
}

#[test]
fn EchoRequest_ToRouterInterface_RepliesWithEchoReply() {
    // Arrange
    let (mut router, mut router_link, mut host_link, mut sim) = single_interface_router();
    let request = IcmpPacket::new(IcmpType::EchoRequest, 1, 1, vec![0xde, 0xad]);
    let ip_packet = Ipv4Packet::new([10, 0, 0, 2], [10, 0, 0, 1], INIT_TTL, Ipv4Protocol::Icmp, request.to_bytes());
    let frame = EthernetFrame::new(router_mac_eth0(), host_mac(), EtherType::Ipv4, ip_packet.to_bytes());
    host_link.send(frame.to_bytes(), "host");

    // Act
    sim.transmit();
    let (bytes, ingress) = router_link.poll().expect("router should have received a frame");
    router.handle_frame(&bytes, &ingress, &mut router_link);
    sim.transmit();

    // Assert
    let (reply_bytes, _) = host_link.poll().expect("host should receive a reply");
    let reply_frame = EthernetFrame::from_bytes(&reply_bytes).unwrap();
    assert_eq!(reply_frame.destination, host_mac());
    let reply_ip = Ipv4Packet::from_bytes(&reply_frame.payload).unwrap();
    assert_eq!(reply_ip.destination, [10, 0, 0, 2]);
    let reply_icmp = IcmpPacket::from_bytes(&reply_ip.payload).unwrap();
    assert_eq!(reply_icmp.icmp_type, IcmpType::EchoReply);
    assert_eq!(reply_icmp.data, vec![0xde, 0xad]);
}

#[test]
fn IpPacket_NoMatchingRoute_RepliesWithDestNetUnreachable() {
    // Arrange
    let (mut router, mut router_link, mut host_link, mut sim) = single_interface_router();
    let ip_packet = Ipv4Packet::new([10, 0, 0, 2], [172, 16, 0, 1], INIT_TTL, Ipv4Protocol::Other(17), vec![1, 2, 3]);
    let frame = EthernetFrame::new(router_mac_eth0(), host_mac(), EtherType::Ipv4, ip_packet.to_bytes());
    host_link.send(frame.to_bytes(), "host");

    // Act
    sim.transmit();
    let (bytes, ingress) = router_link.poll().expect("router should have received a frame");
    router.handle_frame(&bytes, &ingress, &mut router_link);
    sim.transmit();

    // Assert
    let (reply_bytes, _) = host_link.poll().expect("host should receive an ICMP error");
    let reply_frame = EthernetFrame::from_bytes(&reply_bytes).unwrap();
    let reply_ip = Ipv4Packet::from_bytes(&reply_frame.payload).unwrap();
    let reply_icmp = IcmpPacket::from_bytes(&reply_ip.payload).unwrap();
    assert_eq!(reply_icmp.icmp_type, IcmpType::DestNetUnreachable);
}

#[test]
fn ArpRequest_ForRouterInterface_RepliesWithArpReply() {
    // Arrange
    let (mut router, mut router_link, mut host_link, mut sim) = single_interface_router();
    let request = ArpFrame::request(host_mac(), [10, 0, 0, 2], [10, 0, 0, 1]);
    let frame = EthernetFrame::new(crate::net::mac::BROADCAST, host_mac(), EtherType::Arp, request.to_bytes());
    host_link.send(frame.to_bytes(), "host");

    // Act
    sim.transmit();
    let (bytes, ingress) = router_link.poll().expect("router should have received a frame");
    router.handle_frame(&bytes, &ingress, &mut router_link);
    sim.transmit();

    // Assert
    let (reply_bytes, _) = host_link.poll().expect("host should receive an ARP reply");
    let reply_frame = EthernetFrame::from_bytes(&reply_bytes).unwrap();
    assert_eq!(reply_frame.destination, host_mac());
    let reply_arp = ArpFrame::from_bytes(&reply_frame.payload).unwrap();
    assert_eq!(reply_arp.opcode, ArpOperation::Reply);
    assert_eq!(reply_arp.sender_mac, router_mac_eth0());
    assert_eq!(reply_arp.sender_ip, [10, 0, 0, 1]);
}

#[test]
fn IpPacket_DestinationUnresolved_QueuesAndSendsArpRequestOnEgress() {
    // Arrange: a route to a next hop the router has never seen.
    let mut interfaces = InterfaceTable::new();
    interfaces.insert(
        "eth0",
        Interface {
            mac: router_mac_eth0(),
            ipv4: [10, 0, 0, 1],
        },
    );
    interfaces.insert(
        "eth1",
        Interface {
            mac: mac_addr!(3),
            ipv4: [192, 168, 0, 1],
        },
    );
    let mut routes = RoutingTable::new();
    routes.push(Route {
        dest: [192, 168, 1, 0],
        mask: [255, 255, 255, 0],
        gateway: [192, 168, 0, 2],
        egress: "eth1".to_string(),
    });
    let mut router = Router::new(interfaces, routes);

    let router_port0 = ChannelPort::new();
    let host_port0 = ChannelPort::new();
    ChannelPort::connect(&router_port0, &host_port0);
    let router_port1 = ChannelPort::new();
    let host_port1 = ChannelPort::new();
    ChannelPort::connect(&router_port1, &host_port1);

    let mut router_link = ChannelLink::new();
    router_link.add_port("eth0", router_port0.clone());
    router_link.add_port("eth1", router_port1.clone());
    let mut host0_link = ChannelLink::new();
    host0_link.add_port("host0", host_port0.clone());
    let mut host1_link = ChannelLink::new();
    host1_link.add_port("host1", host_port1.clone());

    let mut sim = CableSimulator::default();
    sim.add(router_port0);
    sim.add(host_port0);
    sim.add(router_port1);
    sim.add(host_port1);

    let ip_packet = Ipv4Packet::new([10, 0, 0, 2], [192, 168, 1, 5], INIT_TTL, Ipv4Protocol::Other(17), vec![7, 7]);
    let frame = EthernetFrame::new(router_mac_eth0(), host_mac(), EtherType::Ipv4, ip_packet.to_bytes());
    host0_link.send(frame.to_bytes(), "host0");

    // Act: router receives the packet, can't resolve the next hop, and should
    // broadcast an ARP request out eth1 instead of dropping the packet.
    sim.transmit();
    let (bytes, ingress) = router_link.poll().expect("router should have received a frame");
    router.handle_frame(&bytes, &ingress, &mut router_link);
    sim.transmit();

    // Assert
    let (arp_bytes, _) = host1_link.poll().expect("eth1 should see an ARP request");
    let arp_frame = EthernetFrame::from_bytes(&arp_bytes).unwrap();
    assert_eq!(arp_frame.ether_type, EtherType::Arp);
    let arp = ArpFrame::from_bytes(&arp_frame.payload).unwrap();
    assert_eq!(arp.opcode, ArpOperation::Request);
    assert_eq!(arp.target_ip, [192, 168, 0, 2]);
}
