//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{AgentRule, GateRule, PolicySet};
use crate::error::MuxError;
use crate::mux::Mux;
use crate::routing::MatchKind;
use crate::session::Dialer;

/// Root configuration for a multiplexer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MuxConfig<C> {
    /// How policy patterns are interpreted.
    pub match_kind: MatchKind,

    /// Idle reaper settings.
    pub keepalive: KeepaliveConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Credentials and gateway rules.
    pub policy: PolicyConfig<C>,
}

impl<C> Default for MuxConfig<C> {
    fn default() -> Self {
        Self {
            match_kind: MatchKind::default(),
            keepalive: KeepaliveConfig::default(),
            observability: ObservabilityConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl<C> MuxConfig<C> {
    /// Convert the policy section into a `PolicySet`, keeping rule order.
    pub fn into_policy(self) -> PolicySet<C> {
        self.policy.into_policy()
    }

    /// Build a mux over `dialer` and start its reaper if keepalive is enabled.
    ///
    /// Must be called from within a Tokio runtime when keepalive is enabled.
    pub fn build<D>(self, dialer: D) -> Result<Mux<D>, MuxError>
    where
        D: Dialer<Credential = C>,
    {
        let MuxConfig {
            match_kind,
            keepalive,
            policy,
            ..
        } = self;
        let mux = Mux::new(policy.into_policy(), match_kind, dialer)?;
        if keepalive.enabled {
            mux.keepalive(keepalive.idle());
        } else {
            tracing::info!("Keepalive disabled, sessions are kept until close");
        }
        Ok(mux)
    }
}

/// Idle reaper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// Run the idle reaper.
    pub enabled: bool,

    /// Seconds an unreferenced session may stay open.
    pub idle_secs: u64,
}

impl KeepaliveConfig {
    /// Idle threshold handed to the reaper.
    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Policy section. Rule order is significant: the first match wins.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig<C> {
    /// Credential used when no agent rule matches.
    pub default: Option<C>,

    pub gates: Vec<GateRule>,

    pub agents: Vec<AgentRuleConfig<C>>,
}

impl<C> Default for PolicyConfig<C> {
    fn default() -> Self {
        Self {
            default: None,
            gates: Vec::new(),
            agents: Vec::new(),
        }
    }
}

impl<C> PolicyConfig<C> {
    pub fn into_policy(self) -> PolicySet<C> {
        PolicySet {
            default: self.default.map(std::sync::Arc::new),
            gates: self.gates,
            agents: self
                .agents
                .into_iter()
                .map(|rule| AgentRule::new(rule.pattern, rule.credential))
                .collect(),
        }
    }
}

/// Credential for destinations matching `pattern`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentRuleConfig<C> {
    pub pattern: String,
    pub credential: C,
}
