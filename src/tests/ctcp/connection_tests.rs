#![allow(non_snake_case)]

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::ctcp::app::{AppIo, AppReadOutcome};
use crate::ctcp::config::TransportConfig;
use crate::ctcp::connection::{ConnId, Connection};
use crate::ctcp::segment::{Segment, SegmentFlags, MAX_PAYLOAD};
use crate::link::Link;

/// A scripted application: serves queued chunks, then NoData, then Eof once
/// told to. Records whatever the connection hands back via `write`.
#[derive(Default)]
struct ScriptedApp {
    input: VecDeque<Vec<u8>>,
    eof: bool,
    written: Vec<u8>,
    eof_signaled: bool,
}

impl AppIo for ScriptedApp {
    fn read(&mut self, buf: &mut [u8; MAX_PAYLOAD]) -> AppReadOutcome {
        match self.input.pop_front() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                AppReadOutcome::Data(chunk.len())
            }
            None if self.eof => AppReadOutcome::Eof,
            None => AppReadOutcome::NoData,
        }
    }

    fn bufspace(&self) -> usize {
        usize::MAX
    }

    fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            self.eof_signaled = true;
        } else {
            self.written.extend_from_slice(data);
        }
    }
}

#[derive(Default)]
struct RecordingLink {
    sent: Vec<(Vec<u8>, String)>,
}

impl Link for RecordingLink {
    fn send(&mut self, frame: Vec<u8>, egress: &str) {
        self.sent.push((frame, egress.to_string()));
    }

    fn poll(&mut self) -> Option<(Vec<u8>, String)> {
        None
    }
}

fn new_connection() -> Connection {
    Connection::new(ConnId(0), "eth0", TransportConfig::default())
}

#[test]
fn PollAppInput_DataAvailable_SendsDataSegment() {
    // Arrange
    let mut conn = new_connection();
    let mut app = ScriptedApp {
        input: VecDeque::from([b"hello".to_vec()]),
        ..Default::default()
    };
    let mut link = RecordingLink::default();

    // Act
    conn.poll_app_input(&mut app);
    conn.admit_and_send(&mut link);

    // Assert
    assert_eq!(link.sent.len(), 1);
    let sent = Segment::from_bytes(&link.sent[0].0).unwrap();
    assert_eq!(sent.data, b"hello");
    assert_eq!(link.sent[0].1, "eth0");
}

#[test]
fn PollAppInput_EofWithNothingQueued_SendsFinSegment() {
    // Arrange
    let mut conn = new_connection();
    let mut app = ScriptedApp {
        eof: true,
        ..Default::default()
    };
    let mut link = RecordingLink::default();

    // Act
    conn.poll_app_input(&mut app);
    conn.admit_and_send(&mut link);

    // Assert
    assert_eq!(link.sent.len(), 1);
    let sent = Segment::from_bytes(&link.sent[0].0).unwrap();
    assert!(sent.flags.contains(SegmentFlags::FIN));
    assert!(sent.data.is_empty());
}

#[test]
fn Receive_DataSegment_DeliversToAppAndAcks() {
    // Arrange
    let mut conn = new_connection();
    let mut app = ScriptedApp::default();
    let mut link = RecordingLink::default();
    let incoming = Segment::new(1, 1, SegmentFlags::ACK, 3200, b"hi".to_vec());

    // Act
    let outcome = conn.receive(&incoming.to_bytes(), &mut app, &mut link);

    // Assert
    assert!(!outcome.destroyed);
    assert_eq!(app.written, b"hi");
    assert_eq!(link.sent.len(), 1);
    let ack = Segment::from_bytes(&link.sent[0].0).unwrap();
    assert!(ack.flags.contains(SegmentFlags::ACK));
    assert_eq!(ack.ackno, 3); // seqno(1) + data.len()(2)
}

#[test]
fn Receive_DuplicateSegment_DoesNotRedeliverToApp() {
    // Arrange
    let mut conn = new_connection();
    let mut app = ScriptedApp::default();
    let mut link = RecordingLink::default();
    let incoming = Segment::new(1, 1, SegmentFlags::ACK, 3200, b"hi".to_vec());

    // Act
    conn.receive(&incoming.to_bytes(), &mut app, &mut link);
    conn.receive(&incoming.to_bytes(), &mut app, &mut link);

    // Assert: delivered exactly once despite arriving twice.
    assert_eq!(app.written, b"hi");
}

#[test]
fn Receive_FinFromPeer_SignalsEofToAppAndAcks() {
    // Arrange
    let mut conn = new_connection();
    let mut app = ScriptedApp::default();
    let mut link = RecordingLink::default();
    let fin = Segment::new(1, 1, SegmentFlags::ACK | SegmentFlags::FIN, 3200, vec![]);

    // Act
    let outcome = conn.receive(&fin.to_bytes(), &mut app, &mut link);

    // Assert
    assert!(!outcome.destroyed);
    assert!(app.eof_signaled);
    assert_eq!(link.sent.len(), 1);
    let ack = Segment::from_bytes(&link.sent[0].0).unwrap();
    assert!(ack.flags.contains(SegmentFlags::ACK));
    assert!(!ack.flags.contains(SegmentFlags::FIN));
}

#[test]
fn OnTimer_PastRtTimeout_RetransmitsUnackedSegment() {
    // Arrange
    let config = TransportConfig {
        rt_timeout_ms: 1,
        ..TransportConfig::default()
    };
    let mut conn = Connection::new(ConnId(0), "eth0", config);
    let mut app = ScriptedApp {
        input: VecDeque::from([b"retry-me".to_vec()]),
        ..Default::default()
    };
    let mut link = RecordingLink::default();
    conn.poll_app_input(&mut app);
    conn.admit_and_send(&mut link);
    assert_eq!(link.sent.len(), 1);

    // Act
    thread::sleep(Duration::from_millis(5));
    let outcome = conn.on_timer(&mut link);

    // Assert
    assert!(!outcome.destroyed);
    assert_eq!(link.sent.len(), 2);
    let first = Segment::from_bytes(&link.sent[0].0).unwrap();
    let retransmitted = Segment::from_bytes(&link.sent[1].0).unwrap();
    assert_eq!(first.seqno, retransmitted.seqno);
    assert_eq!(first.data, retransmitted.data);
}

#[test]
fn OnTimer_ExceedsMaxRetransmits_DestroysConnection() {
    // Arrange
    let config = TransportConfig {
        rt_timeout_ms: 1,
        ..TransportConfig::default()
    };
    let mut conn = Connection::new(ConnId(0), "eth0", config);
    let mut app = ScriptedApp {
        input: VecDeque::from([b"x".to_vec()]),
        ..Default::default()
    };
    let mut link = RecordingLink::default();
    conn.poll_app_input(&mut app);
    conn.admit_and_send(&mut link);

    // Act: five retransmits are tolerated, the sixth timeout tears it down.
    let mut last_outcome = conn.on_timer(&mut link);
    for _ in 0..6 {
        thread::sleep(Duration::from_millis(5));
        last_outcome = conn.on_timer(&mut link);
    }

    // Assert
    assert!(last_outcome.destroyed);
}
