//! The application-facing side of a connection: reading outbound bytes and
//! writing inbound ones (`conn_input`/`conn_output`/`conn_bufspace` in
//! `original_source/lab3/ctcp.c`), modeled as a trait so the connection core
//! never touches a real socket or pipe directly.

use super::segment::MAX_PAYLOAD;

/// Result of a single outbound read attempt.
pub enum AppReadOutcome {
    /// `n` bytes were copied into the caller's buffer (1..=MAX_PAYLOAD).
    Data(usize),
    /// No data currently available; try again later.
    NoData,
    /// The application has no more data to send, ever.
    Eof,
}

pub trait AppIo {
    /// Reads up to `buf.len()` (at most [`MAX_PAYLOAD`]) bytes of outbound data.
    fn read(&mut self, buf: &mut [u8; MAX_PAYLOAD]) -> AppReadOutcome;

    /// Bytes of buffer space the application currently has free to accept
    /// delivered data — gates when buffered inbound data is handed up
    /// (SPEC_FULL.md §4.7's deferred-ACK-on-buffer-space rule).
    fn bufspace(&self) -> usize;

    /// Delivers `data` to the application. Called only once `bufspace()`
    /// has been confirmed sufficient.
    fn write(&mut self, data: &[u8]);
}
