//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MuxConfig (validated, immutable)
//!     → into_policy() → Mux::new
//! ```
//!
//! # Design Decisions
//! - Generic over the credential type; any serde-deserializable credential works
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Credential usability is checked later, by PolicySet::validate

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AgentRuleConfig, KeepaliveConfig, MuxConfig, ObservabilityConfig, PolicyConfig};
pub use validation::{validate_config, ValidationError};
