//! Gateway and credential lookup.
//!
//! # Responsibilities
//! - Store compiled gate and credential rules
//! - Resolve the gateway for a destination (if any)
//! - Resolve the credential for a destination, falling back to the default

use std::sync::Arc;

use crate::auth::PolicySet;
use crate::error::MuxError;
use crate::routing::matcher::{Matcher, MatcherBuilder};

#[derive(Debug)]
struct GateRoute {
    matcher: Box<dyn Matcher>,
    gateway: String,
}

#[derive(Debug)]
struct AuthRoute<C> {
    matcher: Box<dyn Matcher>,
    credential: Arc<C>,
}

/// Compiled, immutable routing rules.
#[derive(Debug)]
pub struct RoutingTable<C> {
    default: Option<Arc<C>>,
    gates: Vec<GateRoute>,
    auths: Vec<AuthRoute<C>>,
}

impl<C> RoutingTable<C> {
    /// Compile the rules of a policy set. Gate rules without a gateway are skipped.
    pub fn build<B>(policy: &PolicySet<C>, builder: &B) -> Result<Self, MuxError>
    where
        B: MatcherBuilder + ?Sized,
    {
        let compile = |pattern: &str| {
            builder.build(pattern).map_err(|source| MuxError::Matcher {
                pattern: pattern.to_string(),
                source,
            })
        };

        let mut gates = Vec::with_capacity(policy.gates.len());
        for rule in &policy.gates {
            if rule.gateway.is_empty() {
                continue;
            }
            gates.push(GateRoute {
                matcher: compile(&rule.pattern)?,
                gateway: rule.gateway.clone(),
            });
        }

        let mut auths = Vec::with_capacity(policy.agents.len());
        for rule in &policy.agents {
            auths.push(AuthRoute {
                matcher: compile(&rule.pattern)?,
                credential: Arc::clone(&rule.credential),
            });
        }

        Ok(Self {
            default: policy.default.clone(),
            gates,
            auths,
        })
    }

    /// Gateway the destination must be tunneled through, if any.
    pub fn gate(&self, addr: &str) -> Option<&str> {
        self.gates
            .iter()
            .find(|route| route.matcher.matches(addr))
            .map(|route| route.gateway.as_str())
    }

    /// Credential for the destination.
    pub fn resolve_auth(&self, addr: &str) -> Result<Arc<C>, MuxError> {
        self.auths
            .iter()
            .find(|route| route.matcher.matches(addr))
            .map(|route| Arc::clone(&route.credential))
            .or_else(|| self.default.clone())
            .ok_or(MuxError::NoAuthMethod)
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn auth_count(&self) -> usize {
        self.auths.len()
    }
}
