//! Routing and credential policies supplied by the host.
//!
//! Rules are ordered: when patterns overlap, the first declared rule wins.
//! Duplicate patterns are accepted and the later ones are shadowed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::error::MuxError;

/// Routes destinations matching `pattern` through `gateway`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GateRule {
    pub pattern: String,

    /// Gateway address. An empty value disables the rule.
    #[serde(default)]
    pub gateway: String,
}

impl GateRule {
    pub fn new(pattern: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            gateway: gateway.into(),
        }
    }
}

/// Authenticates to destinations matching `pattern` with `credential`.
#[derive(Debug)]
pub struct AgentRule<C> {
    pub pattern: String,
    pub credential: Arc<C>,
}

impl<C> AgentRule<C> {
    pub fn new(pattern: impl Into<String>, credential: C) -> Self {
        Self {
            pattern: pattern.into(),
            credential: Arc::new(credential),
        }
    }
}

impl<C> Clone for AgentRule<C> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            credential: Arc::clone(&self.credential),
        }
    }
}

/// Default credential plus per-pattern gateway and credential rules.
#[derive(Debug)]
pub struct PolicySet<C> {
    pub default: Option<Arc<C>>,
    pub gates: Vec<GateRule>,
    pub agents: Vec<AgentRule<C>>,
}

impl<C> Default for PolicySet<C> {
    fn default() -> Self {
        Self {
            default: None,
            gates: Vec::new(),
            agents: Vec::new(),
        }
    }
}

impl<C> Clone for PolicySet<C> {
    fn clone(&self) -> Self {
        Self {
            default: self.default.clone(),
            gates: self.gates.clone(),
            agents: self.agents.clone(),
        }
    }
}

impl<C: Credential> PolicySet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, credential: C) -> Self {
        self.default = Some(Arc::new(credential));
        self
    }

    pub fn gate(mut self, pattern: impl Into<String>, gateway: impl Into<String>) -> Self {
        self.gates.push(GateRule::new(pattern, gateway));
        self
    }

    pub fn agent(mut self, pattern: impl Into<String>, credential: C) -> Self {
        self.agents.push(AgentRule::new(pattern, credential));
        self
    }

    /// Check that the policies can authenticate at least one destination.
    ///
    /// A failing default credential is reported as is; a failing rule is
    /// prefixed with its pattern.
    pub fn validate(&self) -> Result<(), MuxError> {
        if let Some(default) = &self.default {
            default.validate().map_err(MuxError::Auth)?;
        } else if self.agents.is_empty() {
            return Err(MuxError::NoAuthMethod);
        }

        for rule in &self.agents {
            rule.credential
                .validate()
                .map_err(|source| MuxError::Credential {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
