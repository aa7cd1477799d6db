//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! PolicySet (default credential, gate rules, agent rules)
//!     → policy.rs (validate every credential eagerly)
//!     → routing table built by the Mux
//!
//! Dial:
//!     routing table resolves a credential for the address
//!     → credential.rs (materialize protocol config)
//!     → handed to the Dialer
//! ```
//!
//! # Design Decisions
//! - Validation happens once, before a Mux exists
//! - Credentials are shared via Arc; the Mux never mutates them

pub mod credential;
pub mod policy;

pub use credential::{AgentConfig, AgentCredential, AuthMethod, Credential};
pub use policy::{AgentRule, GateRule, PolicySet};
