#![allow(non_snake_case)]

use crate::net::icmp::{IcmpPacket, IcmpType};
use crate::net::ipv4::{Ipv4Packet, Ipv4Protocol, INIT_TTL};

#[test]
fn Ipv4Packet_Constructed_ChecksumIsValid() {
    // Arrange / Act
    let packet = Ipv4Packet::new([10, 0, 0, 1], [10, 0, 0, 2], INIT_TTL, Ipv4Protocol::Icmp, vec![1, 2, 3, 4]);

    // Assert
    assert!(packet.checksum_valid());
}

#[test]
fn Ipv4Packet_TamperedTtl_ChecksumInvalid() {
    // Arrange
    let mut packet = Ipv4Packet::new([10, 0, 0, 1], [10, 0, 0, 2], INIT_TTL, Ipv4Protocol::Icmp, vec![]);

    // Act
    packet.ttl -= 1; // changed without recomputing the checksum

    // Assert
    assert!(!packet.checksum_valid());
}

#[test]
fn Ipv4Packet_ToBytes_ThenFromBytes_RoundTrips() {
    // Arrange
    let packet = Ipv4Packet::new([192, 168, 1, 1], [192, 168, 1, 2], 64, Ipv4Protocol::Other(17), vec![9, 9, 9]);

    // Act
    let parsed = Ipv4Packet::from_bytes(&packet.to_bytes()).unwrap();

    // Assert
    assert_eq!(parsed, packet);
}

#[test]
fn IcmpPacket_EchoReply_MirrorsRequestIdentifiers() {
    // Arrange
    let request = IcmpPacket::new(IcmpType::EchoRequest, 42, 7, vec![0xaa, 0xbb]);

    // Act
    let reply = IcmpPacket::echo_reply_to(&request);

    // Assert
    assert_eq!(reply.icmp_type, IcmpType::EchoReply);
    assert_eq!(reply.identifier, 42);
    assert_eq!(reply.sequence_number, 7);
    assert_eq!(reply.data, vec![0xaa, 0xbb]);
    assert!(reply.checksum_valid_over(reply.to_bytes().len()));
}

#[test]
fn IcmpPacket_Error_CarriesOffendingHeaderAsData() {
    // Arrange
    let offending = Ipv4Packet::new([10, 0, 0, 1], [10, 0, 0, 9], 1, Ipv4Protocol::Other(6), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    let mut offending_bytes = offending.to_bytes();
    offending_bytes.truncate(28);

    // Act
    let error = IcmpPacket::error(IcmpType::DestHostUnreachable, offending_bytes.clone());

    // Assert
    assert_eq!(error.icmp_type, IcmpType::DestHostUnreachable);
    assert_eq!(error.data, offending_bytes);
}
