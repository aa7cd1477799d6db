//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Mux, pool and reaper produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics recorder; hosts choose an exporter
//! - Log level configurable via config, overridden by RUST_LOG

pub mod logging;
pub mod metrics;
