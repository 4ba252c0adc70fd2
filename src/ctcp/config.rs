//! Transport endpoint configuration (SPEC_FULL.md §6), parsed from CLI
//! flags in the bundled binary rather than a text file — there's no
//! interface/route table on the transport side, just a handful of scalars.

/// Tunables for one transport endpoint. Defaults mirror
/// `original_source/lab3/ctcp_bbr.c: bbr_init`'s seed values where the
/// spec is silent (SPEC_FULL.md §6).
#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    pub recv_window: u16,
    pub send_window: u16,
    pub timer_interval_ms: u64,
    pub rt_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            recv_window: 3200,
            send_window: 3200,
            timer_interval_ms: 10,
            rt_timeout_ms: 200,
        }
    }
}
