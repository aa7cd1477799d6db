//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate policies → Compile routing table → Mux
//!     → optional keepalive(idle) spawns the reaper
//!
//! Shutdown (Mux::close):
//!     closed flag CAS → signal reaper → join reaper
//!     → drain and seal pool → close drained sessions
//! ```
//!
//! # Design Decisions
//! - Fail fast: any construction error is fatal
//! - Shutdown runs once; later calls are no-ops
//! - Background tasks are joined, not abandoned

pub mod shutdown;

pub use shutdown::Shutdown;
