//! The transport half of the data plane: the cTCP segment codec, BBR
//! congestion control, one connection's send/receive/retransmission logic,
//! and the endpoint that multiplexes many connections (SPEC_FULL.md
//! §3–§4.10).

pub mod app;
pub mod bbr;
pub mod bdp;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod segment;

pub use connection::{ConnId, Connection};
pub use endpoint::Endpoint;
