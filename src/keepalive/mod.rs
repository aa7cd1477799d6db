//! Idle session reaping.
//!
//! # State Machine
//! ```text
//! Armed --timer fires, sessions remain--> Armed (timer reset to idle)
//! Armed --timer fires, pool empty-------> Disarmed
//! Disarmed --wake (session inserted)----> Armed (fresh timer)
//! Armed --wake--------------------------> Armed (timer untouched)
//! any --shutdown------------------------> exit
//! ```
//!
//! # Design Decisions
//! - Wake channel has capacity one; extra wakes are dropped, never queued
//! - A session is reaped only when unreferenced AND open for at least `idle`
//! - Evicted sessions are closed outside the pool lock

pub mod reaper;

pub use reaper::Reaper;
