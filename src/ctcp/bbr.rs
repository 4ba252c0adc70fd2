//! BBR-style congestion control (SPEC_FULL.md §4.9). Grounded in
//! `original_source/lab3/ctcp_bbr.c`/`.h`: the mode state machine, the
//! 8-entry pacing-gain table and the per-mode cwnd/gain formulas are carried
//! over directly. The bandwidth filter is implemented as the real BBR
//! algorithm intends — a 3-sample max filter excluding app-limited samples —
//! rather than the original's dead `bbr_update_bw` return value, which is
//! computed but never folded back into `btlbw`.

use std::time::{Duration, SystemTime};

use crate::time::now;

/// The gain applied to the bandwidth-delay product to get a pacing rate at
/// each point in the `PROBE_BW` gain cycle. Index 0/1 are also reused by
/// `STARTUP`/`DRAIN`.
const PACING_GAIN: [f64; 8] = [2.885, 1.0 / 2.885, 1.25, 0.75, 1.0, 1.0, 1.0, 1.0];
const FULL_BW_COUNT: u32 = 3;
const DRAIN_ROUNDS: u32 = 4;
const PROBE_RTT_ROUNDS: u32 = 4;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BbrMode {
    Startup,
    Drain,
    ProbeBw,
    ProbeRtt,
}

/// Congestion-control state for one connection.
pub struct BbrState {
    mode: BbrMode,
    pacing_gain: f64,
    /// Bottleneck bandwidth estimate, bytes/ms.
    btl_bw: f64,
    /// Minimum observed RTT, ms — the `rtt_prop` filter.
    rtt_prop_ms: u32,
    rtt_cnt: u32,
    rtt_updated_at: SystemTime,
    /// 3-entry max-filter shift register over non-app-limited bandwidth
    /// samples, one slot retired per `STARTUP` round.
    startup_bw_samples: [f64; 3],
    probe_bw_bytes_sent: u32,
    probe_bw_pacing_idx: usize,
    drain_round: u32,
    probe_rtt_round: u32,
    cwnd: u32,
    inflight_bytes: u32,
    app_limited_until: u32,
}

impl BbrState {
    /// Seeds matching `ctcp_bbr.c: bbr_init` (`btlbw = 11520`, `rtt_prop = 200`).
    /// Sets `cwnd`/`pacing_gain` directly rather than running `update_model`
    /// at seed time: `startup_state` treats `rtt_cnt % 3 == 0` with an empty
    /// sample window as "no growth" and would transition straight to
    /// `DRAIN` before a single round has ever completed.
    pub fn new() -> Self {
        let rtt_prop_ms = 200;
        let btl_bw = 11520.0 / 1000.0;
        Self {
            mode: BbrMode::Startup,
            pacing_gain: PACING_GAIN[0],
            btl_bw,
            rtt_prop_ms,
            rtt_cnt: 0,
            rtt_updated_at: now(),
            startup_bw_samples: [0.0; 3],
            probe_bw_bytes_sent: 0,
            probe_bw_pacing_idx: 2,
            drain_round: 0,
            probe_rtt_round: 0,
            cwnd: (rtt_prop_ms as f64 * btl_bw * PACING_GAIN[0]) as u32,
            inflight_bytes: 0,
            app_limited_until: 0,
        }
    }

    pub fn mode(&self) -> BbrMode {
        self.mode
    }

    pub fn cwnd(&self) -> u32 {
        self.cwnd
    }

    pub fn pacing_gain(&self) -> f64 {
        self.pacing_gain
    }

    /// Bandwidth-delay product, in bytes, at the current bandwidth/RTT estimate.
    /// Bottleneck bandwidth estimate, bytes/ms.
    pub fn btl_bw(&self) -> f64 {
        self.btl_bw
    }

    pub fn bdp_bytes(&self) -> u32 {
        (self.btl_bw * self.rtt_prop_ms as f64) as u32
    }

    /// Advances the model by one RTT round: an interval during which all
    /// data outstanding at the round's start has been acknowledged
    /// (SPEC_FULL.md §9 — not a per-ACK counter).
    pub fn on_round_complete(&mut self, round_trip_time_ms: u32, bytes_acked: u32, app_limited: bool) {
        self.rtt_cnt += 1;

        if !app_limited {
            let sample = if round_trip_time_ms == 0 {
                0.0
            } else {
                bytes_acked as f64 / round_trip_time_ms as f64
            };
            self.startup_bw_samples.rotate_left(1);
            self.startup_bw_samples[2] = sample;
            self.btl_bw = self
                .startup_bw_samples
                .iter()
                .cloned()
                .fold(self.btl_bw, f64::max);
        }

        self.update_rtt(round_trip_time_ms);
        self.update_model();
    }

    /// Tracks the min-RTT filter and transitions in/out of `PROBE_RTT`
    /// (`ctcp_bbr.c: bbr_update_rtt`).
    fn update_rtt(&mut self, round_trip_time_ms: u32) {
        if self.mode == BbrMode::ProbeRtt {
            self.rtt_prop_ms = round_trip_time_ms;
        }

        let elapsed = now()
            .duration_since(self.rtt_updated_at)
            .unwrap_or(Duration::ZERO);
        if elapsed.as_millis() as u32 >= self.rtt_prop_ms && self.mode == BbrMode::ProbeBw {
            self.probe_rtt_round = self.rtt_cnt;
            self.mode = BbrMode::ProbeRtt;
        }

        if round_trip_time_ms < self.rtt_prop_ms {
            self.rtt_prop_ms = round_trip_time_ms;
            self.rtt_updated_at = now();
            match self.mode {
                BbrMode::ProbeBw => {
                    self.probe_rtt_round = self.rtt_cnt;
                    self.mode = BbrMode::ProbeRtt;
                }
                BbrMode::ProbeRtt => self.mode = BbrMode::Startup,
                _ => {}
            }
        }
    }

    /// Dispatches to the current mode's handler (`ctcp_bbr.c: bbr_update_model`).
    fn update_model(&mut self) {
        match self.mode {
            BbrMode::Startup => self.startup_state(),
            BbrMode::Drain => self.drain_state(),
            BbrMode::ProbeBw => self.probe_bw_state(),
            BbrMode::ProbeRtt => self.probe_rtt_state(),
        }
    }

    fn startup_state(&mut self) {
        if self.rtt_cnt % FULL_BW_COUNT == 0 {
            let pipe_full = if self.startup_bw_samples[0] == 0.0 {
                true
            } else {
                let growth = (self.startup_bw_samples[2] - self.startup_bw_samples[0]) / self.startup_bw_samples[0];
                growth * 100.0 < 25.0
            };
            if pipe_full {
                self.mode = BbrMode::Drain;
                self.drain_round = self.rtt_cnt;
                return;
            }
        }
        self.pacing_gain = PACING_GAIN[0];
        self.cwnd = (self.rtt_prop_ms as f64 * self.btl_bw * PACING_GAIN[0]) as u32;
    }

    fn drain_state(&mut self) {
        if self.rtt_cnt.saturating_sub(self.drain_round) >= DRAIN_ROUNDS {
            self.mode = BbrMode::ProbeBw;
            self.probe_bw_bytes_sent = 0;
            self.probe_bw_pacing_idx = 2;
            return;
        }
        self.pacing_gain = PACING_GAIN[1];
        self.cwnd = (self.rtt_prop_ms as f64 * self.btl_bw * PACING_GAIN[1]) as u32;
    }

    fn probe_bw_state(&mut self) {
        let bdp = self.bdp_bytes();
        if self.probe_bw_bytes_sent >= bdp {
            self.probe_bw_bytes_sent = 0;
            self.probe_bw_pacing_idx = if self.probe_bw_pacing_idx >= 7 {
                2
            } else {
                self.probe_bw_pacing_idx + 1
            };
        }
        self.pacing_gain = PACING_GAIN[self.probe_bw_pacing_idx];
        self.cwnd = (self.rtt_prop_ms as f64 * self.btl_bw * PACING_GAIN[0]) as u32;
    }

    fn probe_rtt_state(&mut self) {
        if self.rtt_cnt.saturating_sub(self.probe_rtt_round) >= PROBE_RTT_ROUNDS {
            self.mode = BbrMode::ProbeBw;
            self.probe_bw_bytes_sent = 0;
            self.probe_bw_pacing_idx = 2;
        }
        self.pacing_gain = PACING_GAIN[7];
        self.cwnd = (self.rtt_prop_ms as f64 * self.btl_bw * self.pacing_gain) as u32;
    }

    pub fn inflight_bytes(&self) -> u32 {
        self.inflight_bytes
    }

    /// Records that `bytes` were just pushed onto the wire.
    pub fn note_sent(&mut self, bytes: u32) {
        self.inflight_bytes += bytes;
        if self.mode == BbrMode::ProbeBw {
            self.probe_bw_bytes_sent += bytes;
        }
    }

    /// Records that `bytes` worth of previously-sent data were just
    /// acknowledged. Returns whether that data was sent while app-limited —
    /// callers exclude app-limited samples from the bandwidth filter
    /// (SPEC_FULL.md §4.9).
    pub fn note_acked(&mut self, bytes: u32) -> bool {
        let was_app_limited = self.app_limited_until > 0;
        if was_app_limited {
            self.app_limited_until = self.app_limited_until.saturating_sub(bytes);
        }
        self.inflight_bytes = self.inflight_bytes.saturating_sub(bytes);
        was_app_limited
    }

    /// Marks the connection as momentarily out of application data to
    /// send, excluding samples taken before `inflight_bytes` drains from
    /// the bandwidth filter.
    pub fn note_app_limited(&mut self) {
        self.app_limited_until = self.inflight_bytes;
    }

    /// How long to wait before the next segment may be paced out, given
    /// the current gain and bandwidth estimate.
    pub fn pacing_delay(&self, segment_len: u32) -> Duration {
        if self.btl_bw <= 0.0 {
            return Duration::ZERO;
        }
        let ms = segment_len as f64 / (self.pacing_gain * self.btl_bw);
        Duration::from_millis(ms.max(0.0) as u64)
    }
}

impl Default for BbrState {
    fn default() -> Self {
        Self::new()
    }
}
