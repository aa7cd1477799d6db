//! Session pool subsystem.
//!
//! # Data Flow
//! ```text
//! Dial(addr)
//!     → table.rs (read lock: destination hit? gateway hit?)
//!     → miss: Mux dials outside any lock
//!     → table.rs (write lock: first session for addr wins, loser returned)
//!     → entry.rs (BorrowHandle increments the refcount)
//!
//! Handle dropped:
//!     → entry.rs (refcount decremented, transport untouched)
//!
//! Reaper tick / shutdown:
//!     → table.rs (write lock: remove idle or all entries)
//!     → close removed sessions outside the lock
//! ```
//!
//! # Design Decisions
//! - At most one session per address; race losers are closed, not stored
//! - The pool owns every session; callers only hold borrow handles
//! - No transport I/O while the map lock is held

pub mod entry;
pub mod table;

pub use entry::{BorrowHandle, PooledSession};
pub use table::{Admission, Lookup, SessionPool};
