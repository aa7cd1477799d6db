//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (idle > 0 when the reaper is on)
//! - Reject empty patterns and unknown log levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MuxConfig → Result<(), Vec<ValidationError>>
//! - Gate rules with an empty gateway are legal; they are skipped at build

use thiserror::Error;

use crate::config::schema::MuxConfig;
use crate::observability::logging;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("gate rule #{0} has an empty pattern")]
    EmptyGatePattern(usize),

    #[error("agent rule #{0} has an empty pattern")]
    EmptyAgentPattern(usize),

    #[error("keepalive.idle_secs must be greater than 0 when keepalive is enabled")]
    ZeroIdle,

    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

pub fn validate_config<C>(config: &MuxConfig<C>) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (i, gate) in config.policy.gates.iter().enumerate() {
        if gate.pattern.is_empty() {
            errors.push(ValidationError::EmptyGatePattern(i));
        }
    }
    for (i, agent) in config.policy.agents.iter().enumerate() {
        if agent.pattern.is_empty() {
            errors.push(ValidationError::EmptyAgentPattern(i));
        }
    }

    if config.keepalive.enabled && config.keepalive.idle_secs == 0 {
        errors.push(ValidationError::ZeroIdle);
    }

    if !logging::is_valid_level(&config.observability.log_level) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
