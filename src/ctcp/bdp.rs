//! Optional BDP measurement sink (SPEC_FULL.md §3 "Persisted state"),
//! grounded in `original_source/lab3/ctcp.c: print_bdp_results`: one
//! `now_ms,bdp_bits` CSV line per RTT sample.

use std::fs::File;
use std::io::{self, Write};
use std::time::SystemTime;

use crate::time::now;

const BITS_PER_BYTE: u64 = 8;

pub struct BdpSink {
    file: File,
}

impl BdpSink {
    pub fn create(path: &str) -> io::Result<Self> {
        Ok(Self { file: File::create(path)? })
    }

    /// Appends one sample: `btl_bw` in bytes/ms, `round_trip_time_ms` as
    /// measured for the segment that triggered this bandwidth update.
    pub fn record(&mut self, btl_bw_bytes_per_ms: f64, round_trip_time_ms: u32) {
        let bdp_bits = (btl_bw_bytes_per_ms * round_trip_time_ms as f64) as u64 * BITS_PER_BYTE;
        let now_ms = now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let _ = writeln!(self.file, "{now_ms},{bdp_bits}");
    }
}
