//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Destination address
//!     → router.rs (gate lookup, credential lookup)
//!     → matcher.rs (evaluate compiled patterns)
//!     → Return: gateway address and credential, or NoAuthMethod
//!
//! Table Compilation (at Mux construction):
//!     PolicySet rules (ordered)
//!     → Compile matchers via a MatcherBuilder
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Tables compiled once, immutable afterwards (no locking)
//! - First match wins, in rule declaration order
//! - One bad pattern aborts the whole build

pub mod matcher;
pub mod router;

pub use matcher::{match_cidr, match_plain, match_regex, MatchKind, Matcher, MatcherBuilder};
pub use router::RoutingTable;
