//! Multiplexer metrics.
//!
//! # Metrics
//! - `agent_mux_dials_total` (counter): transport dials by role (destination, gateway)
//! - `agent_mux_pool_hits_total` (counter): dials served from the pool
//! - `agent_mux_race_discards_total` (counter): sessions closed after losing a race
//! - `agent_mux_evictions_total` (counter): sessions closed by the reaper
//! - `agent_mux_pooled_sessions` (gauge): sessions currently pooled

pub fn record_dial(role: &'static str) {
    ::metrics::counter!("agent_mux_dials_total", "role" => role).increment(1);
}

pub fn record_pool_hit() {
    ::metrics::counter!("agent_mux_pool_hits_total").increment(1);
}

pub fn record_race_discard() {
    ::metrics::counter!("agent_mux_race_discards_total").increment(1);
}

pub fn record_evictions(count: usize) {
    ::metrics::counter!("agent_mux_evictions_total").increment(count as u64);
}

pub fn record_pool_size(size: usize) {
    ::metrics::gauge!("agent_mux_pooled_sessions").set(size as f64);
}
