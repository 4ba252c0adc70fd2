//! One cTCP connection: send path, receive path, the sliding-window/pacing
//! admission gate, and the retransmission/teardown timer (SPEC_FULL.md
//! §4.6–§4.10). Grounded in `original_source/lab3/ctcp.c`'s `ctcp_state_t`
//! and its `ctcp_read`/`ctcp_receive`/`ctcp_output`/`ctcp_send_sliding_window`
//! /`ctcp_timer` functions, restructured around owned queues instead of an
//! intrusive linked list and a process-wide `state_list` (SPEC_FULL.md §9).

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

use log::{debug, trace, warn};

use crate::link::Link;
use crate::time::now;

use super::app::{AppIo, AppReadOutcome};
use super::bbr::BbrState;
use super::bdp::BdpSink;
use super::config::TransportConfig;
use super::segment::{Segment, SegmentFlags, MAX_PAYLOAD};

const INIT_SEQ_NUM: u32 = 1;
const INIT_ACK_NUM: u32 = 1;
const MAX_NUM_RETRANSMIT: u8 = 5;

/// Opaque connection identifier — a source/destination socket pair,
/// replacing the original's intrusive `state_list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

/// A segment plus the bookkeeping needed to retransmit or retire it. Owned
/// by exactly one of [`Connection::to_send`] / [`Connection::in_flight`]
/// (SPEC_FULL.md §3 — no shared ownership, no back-pointers).
struct OutboundSegment {
    segment: Segment,
    sent_at: Option<SystemTime>,
    retransmit_count: u8,
    app_limited: bool,
}

impl OutboundSegment {
    fn fresh(segment: Segment) -> Self {
        Self {
            segment,
            sent_at: None,
            retransmit_count: 0,
            app_limited: false,
        }
    }
}

/// What a connection wants the caller to do after processing an event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConnectionOutcome {
    /// The connection has finished teardown and should be dropped.
    pub destroyed: bool,
}

pub struct Connection {
    id: ConnId,
    egress: String,
    config: TransportConfig,

    curr_seqno: u32,
    curr_ackno: u32,
    prev_ackno: u32,

    /// Bytes admitted into the window (queued in `in_flight`, sent or not).
    curr_window_size: u32,

    /// Snapshot of `curr_seqno` marking the end of the round in progress —
    /// a round completes once an incoming ackno passes it (SPEC_FULL.md
    /// §9: "an RTT round is the interval during which all data outstanding
    /// at the round's start has been acknowledged", not a per-ACK counter).
    round_end_seq: u32,
    round_bytes_acked: u32,
    round_rtt_ms: u32,
    round_app_limited: bool,

    eof_sent: bool,
    fin_from_peer: bool,
    final_packet_time: Option<SystemTime>,

    to_send: VecDeque<OutboundSegment>,
    in_flight: VecDeque<OutboundSegment>,

    bbr: BbrState,
    next_send_at: Option<SystemTime>,
    bdp_sink: Option<BdpSink>,
}

impl Connection {
    pub fn new(id: ConnId, egress: impl Into<String>, config: TransportConfig) -> Self {
        Self {
            id,
            egress: egress.into(),
            config,
            curr_seqno: INIT_SEQ_NUM,
            curr_ackno: INIT_ACK_NUM,
            prev_ackno: INIT_ACK_NUM,
            curr_window_size: 0,
            round_end_seq: INIT_SEQ_NUM,
            round_bytes_acked: 0,
            round_rtt_ms: 0,
            round_app_limited: false,
            eof_sent: false,
            fin_from_peer: false,
            final_packet_time: None,
            to_send: VecDeque::new(),
            in_flight: VecDeque::new(),
            bbr: BbrState::new(),
            next_send_at: None,
            bdp_sink: None,
        }
    }

    pub fn with_bdp_sink(mut self, sink: BdpSink) -> Self {
        self.bdp_sink = Some(sink);
        self
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    fn is_fully_torn_down(&self) -> bool {
        self.fin_from_peer && self.eof_sent && self.to_send.is_empty() && self.in_flight.is_empty()
    }

    // ---- Send path (SPEC_FULL.md §4.6) ----------------------------------

    /// Drains outbound application data into `to_send`, emitting a
    /// flag-only FIN once EOF is reached and everything queued has drained
    /// (`ctcp.c: ctcp_read`). Does not itself transmit — call
    /// [`Connection::admit_and_send`] afterward.
    pub fn poll_app_input(&mut self, app: &mut dyn AppIo) {
        if self.eof_sent {
            return;
        }

        loop {
            let mut buf = [0u8; MAX_PAYLOAD];
            match app.read(&mut buf) {
                AppReadOutcome::Data(n) => self.prep_data_segment(buf[..n].to_vec()),
                AppReadOutcome::NoData => return,
                AppReadOutcome::Eof => {
                    if self.to_send.is_empty() {
                        self.eof_sent = true;
                        self.send_non_data_segment(SegmentFlags::FIN);
                    }
                    return;
                }
            }
        }
    }

    fn prep_data_segment(&mut self, data: Vec<u8>) {
        let segment = Segment::new(
            self.curr_seqno,
            self.curr_ackno,
            SegmentFlags::ACK,
            self.config.recv_window,
            data.clone(),
        );
        self.curr_seqno += data.len() as u32;
        self.to_send.push_back(OutboundSegment::fresh(segment));
    }

    /// A FIN, like any other control segment, carries no sequence-space
    /// advance (SPEC_FULL.md §9) — it still rides the to_send/in_flight
    /// queues so it benefits from the same retransmission machinery,
    /// generalizing the original's fire-and-forget `conn_send`.
    fn send_non_data_segment(&mut self, flags: SegmentFlags) {
        let segment = Segment::new(self.curr_seqno, self.curr_ackno, flags | SegmentFlags::ACK, self.config.recv_window, Vec::new());
        self.to_send.push_back(OutboundSegment::fresh(segment));
    }

    // ---- Sliding window & pacing gate (SPEC_FULL.md §4.8) ---------------

    /// Admits queued segments into the window and paces their transmission.
    /// Never busy-waits: if the pacing clock says "not yet", this simply
    /// returns and relies on the next tick or event to re-evaluate
    /// (SPEC_FULL.md §9).
    pub fn admit_and_send(&mut self, link: &mut dyn Link) {
        let effective_window = self.config.send_window as u32;
        while self.curr_window_size < effective_window {
            let Some(wrapper) = self.to_send.pop_front() else { break };
            self.curr_window_size += wrapper.segment.data.len() as u32;
            self.in_flight.push_back(wrapper);
        }

        let bdp = (self.bbr.bdp_bytes() as f64 * 2.885) as u32;
        if bdp != 0 && self.bbr.inflight_bytes() >= bdp {
            return;
        }

        let bytes_to_send = self.curr_window_size.saturating_sub(self.bbr.inflight_bytes());
        if bytes_to_send == 0 && !self.to_send.is_empty() {
            self.bbr.note_app_limited();
            return;
        }

        let n = now();
        for wrapper in self.in_flight.iter_mut() {
            if wrapper.sent_at.is_some() {
                continue;
            }
            if let Some(next_send_at) = self.next_send_at {
                if n < next_send_at {
                    break; // not yet time; re-check on the next tick
                }
            }

            let len = wrapper.segment.data.len() as u32;
            wrapper.app_limited = self.bbr.inflight_bytes() > 0 && bytes_to_send == 0;
            wrapper.sent_at = Some(n);
            self.bbr.note_sent(len);
            link.send(wrapper.segment.to_bytes(), &self.egress);
            trace!("connection {:?} sent seqno {}", self.id, wrapper.segment.seqno);

            self.next_send_at = Some(n + self.bbr.pacing_delay(len));
        }
    }

    // ---- Receive path (SPEC_FULL.md §4.7) --------------------------------

    /// Processes one inbound segment. Returns an outcome telling the
    /// caller whether the connection just finished teardown.
    pub fn receive(&mut self, bytes: &[u8], app: &mut dyn AppIo, link: &mut dyn Link) -> ConnectionOutcome {
        let segment = match Segment::from_bytes(bytes) {
            Ok(s) => s,
            Err(e) => {
                trace!("dropping truncated segment: {e}");
                return ConnectionOutcome::default();
            }
        };
        if !segment.checksum_valid() {
            trace!("dropping segment with bad checksum");
            return ConnectionOutcome::default();
        }

        if segment.flags.contains(SegmentFlags::FIN) && !self.fin_from_peer {
            self.fin_from_peer = true;
            self.send_non_data_segment(SegmentFlags::ACK);
            self.admit_and_send(link);
            app.write(&[]); // signal EOF to the application
            return ConnectionOutcome::default();
        }

        if segment.flags.contains(SegmentFlags::ACK) {
            self.process_ack(&segment);
        }

        let data_len = segment.data.len() as u32;
        self.curr_ackno = segment.seqno.wrapping_add(data_len);
        let duplicate = segment.seqno < self.prev_ackno;
        if !duplicate {
            self.prev_ackno = self.curr_ackno;
        }

        if !segment.data.is_empty() && !duplicate {
            self.deliver_to_app(segment.data, app, link);
        }

        if !self.in_flight.is_empty() && !self.to_send.is_empty() {
            self.admit_and_send(link);
        }

        ConnectionOutcome::default()
    }

    /// Hands data to the application only once it has room, matching
    /// `ctcp.c: ctcp_output`'s bufspace gate; otherwise the data is simply
    /// dropped and recovered via retransmission, as the original does.
    fn deliver_to_app(&mut self, data: Vec<u8>, app: &mut dyn AppIo, link: &mut dyn Link) {
        if app.bufspace() < data.len() {
            return;
        }
        self.send_non_data_segment(SegmentFlags::ACK);
        self.admit_and_send(link);
        app.write(&data);
    }

    fn process_ack(&mut self, ack: &Segment) {
        while let Some(front) = self.in_flight.front() {
            if front.segment.seqno >= ack.ackno {
                break;
            }
            let wrapper = self.in_flight.pop_front().unwrap();
            let len = wrapper.segment.data.len() as u32;
            let rtt_ms = wrapper
                .sent_at
                .and_then(|sent| now().duration_since(sent).ok())
                .map(|d| d.as_millis() as u32)
                .unwrap_or(0);

            let app_limited = self.bbr.note_acked(len);
            self.round_bytes_acked += len;
            self.round_rtt_ms = rtt_ms;
            self.round_app_limited |= app_limited || wrapper.app_limited;

            self.curr_window_size = self.curr_window_size.saturating_sub(len);
            debug!("connection {:?} acked seqno {} rtt={}ms", self.id, wrapper.segment.seqno, rtt_ms);
        }

        // A round completes once an ackno passes the send pointer snapshotted
        // at the round's start — not once per ACK (SPEC_FULL.md §9).
        if ack.ackno > self.round_end_seq && self.round_bytes_acked > 0 {
            self.bbr
                .on_round_complete(self.round_rtt_ms, self.round_bytes_acked, self.round_app_limited);
            if let Some(sink) = self.bdp_sink.as_mut() {
                sink.record(self.bbr.btl_bw(), self.round_rtt_ms);
            }
            self.round_end_seq = self.curr_seqno;
            self.round_bytes_acked = 0;
            self.round_app_limited = false;
        }
    }

    // ---- Retransmission & teardown timer (SPEC_FULL.md §4.10) ------------

    /// Drives retransmission and the time-wait teardown. Call once per
    /// scheduled timer tick.
    pub fn on_timer(&mut self, link: &mut dyn Link) -> ConnectionOutcome {
        let n = now();
        let rt_timeout = Duration::from_millis(self.config.rt_timeout_ms);

        for wrapper in self.in_flight.iter_mut() {
            let Some(sent_at) = wrapper.sent_at else { continue };
            if n.duration_since(sent_at).unwrap_or(Duration::ZERO) <= rt_timeout {
                continue;
            }
            if wrapper.retransmit_count >= MAX_NUM_RETRANSMIT {
                warn!("connection {:?} exceeded max retransmits, tearing down", self.id);
                return ConnectionOutcome { destroyed: true };
            }
            wrapper.retransmit_count += 1;
            wrapper.sent_at = Some(n);
            link.send(wrapper.segment.to_bytes(), &self.egress);
            debug!(
                "connection {:?} retransmitting seqno {} (attempt {})",
                self.id, wrapper.segment.seqno, wrapper.retransmit_count
            );
        }

        if self.is_fully_torn_down() {
            match self.final_packet_time {
                None => self.final_packet_time = Some(n),
                Some(final_at) => {
                    if n.duration_since(final_at).unwrap_or(Duration::ZERO) > rt_timeout * 2 {
                        return ConnectionOutcome { destroyed: true };
                    }
                }
            }
        }

        ConnectionOutcome::default()
    }
}
