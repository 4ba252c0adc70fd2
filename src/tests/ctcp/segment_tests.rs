#![allow(non_snake_case)]

use crate::ctcp::segment::{Segment, SegmentFlags, SEGMENT_HEADER_LEN};

#[test]
fn Segment_Constructed_ChecksumIsValid() {
    // Arrange / Act
    let segment = Segment::new(1, 0, SegmentFlags::ACK, 3200, vec![1, 2, 3, 4]);

    // Assert
    assert!(segment.checksum_valid());
    assert_eq!(segment.len() as usize, SEGMENT_HEADER_LEN + 4);
}

#[test]
fn Segment_TamperedPayload_ChecksumInvalid() {
    // Arrange
    let mut segment = Segment::new(1, 0, SegmentFlags::ACK, 3200, vec![1, 2, 3, 4]);

    // Act
    segment.data[0] ^= 0xff; // corrupt without recomputing

    // Assert
    assert!(!segment.checksum_valid());
}

#[test]
fn Segment_ToBytes_ThenFromBytes_RoundTrips() {
    // Arrange
    let segment = Segment::new(42, 7, SegmentFlags::ACK | SegmentFlags::FIN, 1024, vec![9, 9, 9]);

    // Act
    let parsed = Segment::from_bytes(&segment.to_bytes()).unwrap();

    // Assert
    assert_eq!(parsed, segment);
    assert!(parsed.flags.contains(SegmentFlags::FIN));
}

#[test]
fn Segment_FinFlag_CarriesNoPayloadBytes() {
    // Arrange / Act
    let fin = Segment::new(5, 0, SegmentFlags::ACK | SegmentFlags::FIN, 3200, vec![]);

    // Assert: FIN consumes no sequence space, so its wire length is exactly
    // the header.
    assert_eq!(fin.len() as usize, SEGMENT_HEADER_LEN);
}

#[test]
fn FromBytes_ShorterThanHeader_IsRejected() {
    // Arrange
    let bytes = [0u8; 8];

    // Act
    let result = Segment::from_bytes(&bytes);

    // Assert
    assert!(result.is_err());
}

#[test]
fn FromBytes_DeclaredLengthExceedsBuffer_IsRejected() {
    // Arrange: header claims more data than actually follows.
    let segment = Segment::new(1, 0, SegmentFlags::ACK, 3200, vec![1, 2, 3, 4]);
    let mut bytes = segment.to_bytes();
    bytes.truncate(SEGMENT_HEADER_LEN + 2); // drop the last two payload bytes

    // Act
    let result = Segment::from_bytes(&bytes);

    // Assert
    assert!(result.is_err());
}
