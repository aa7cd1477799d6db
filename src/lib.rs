//! Pooled, gateway-aware session multiplexer for remote-login agents.
//!
//! ```text
//!   Mux::dial(addr)
//!        │
//!        ▼
//!   ┌──────────┐   gate rule?   ┌──────────────┐
//!   │ routing  │───────────────▶│ pool lookup  │── hit ──▶ BorrowHandle
//!   └──────────┘                └──────┬───────┘
//!                                      │ miss
//!                                      ▼
//!                         credential → Dialer::dial(addr, via gateway)
//!                                      │
//!                                      ▼
//!                         pool admit (first session wins) ──▶ BorrowHandle
//!
//!   keepalive reaper: closes sessions unreferenced for `idle`
//!   Mux::close: stops the reaper, closes every pooled session
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod lifecycle;
pub mod mux;
pub mod observability;
pub mod pool;
pub mod routing;
pub mod session;

pub use auth::{AgentCredential, Credential, PolicySet};
pub use config::MuxConfig;
pub use error::{BoxError, MuxError, PatternError};
pub use mux::Mux;
pub use pool::BorrowHandle;
pub use routing::{MatchKind, Matcher, MatcherBuilder};
pub use session::{Dialer, Session};
