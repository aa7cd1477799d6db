//! Credential abstraction and the bundled agent credential.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// A credential that can be turned into protocol-level connection config.
pub trait Credential: Send + Sync + 'static {
    /// Materialized configuration handed to the dialer.
    type Config: Send + 'static;

    /// Produce the protocol configuration, failing if the credential is unusable.
    fn resolve_config(&self) -> Result<Self::Config, BoxError>;

    /// Check that the credential is usable.
    fn validate(&self) -> Result<(), BoxError> {
        self.resolve_config().map(drop)
    }
}

/// One way of authenticating to an agent.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password(String),
    PublicKey(Vec<u8>),
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Password(_) => write!(f, "Password(..)"),
            AuthMethod::PublicKey(key) => write!(f, "PublicKey({} bytes)", key.len()),
        }
    }
}

/// Connection configuration produced by [`AgentCredential`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub user: String,
    pub methods: Vec<AuthMethod>,
}

/// User plus password and/or private key file.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AgentCredential {
    pub user: String,

    #[serde(default)]
    pub password: Option<String>,

    /// Path to a private key; read on every resolution.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

impl std::fmt::Debug for AgentCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCredential")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_path", &self.key_path)
            .finish()
    }
}

impl AgentCredential {
    pub fn with_password(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Some(password.into()),
            key_path: None,
        }
    }

    pub fn with_key(user: impl Into<String>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            user: user.into(),
            password: None,
            key_path: Some(key_path.into()),
        }
    }
}

impl Credential for AgentCredential {
    type Config = AgentConfig;

    fn resolve_config(&self) -> Result<AgentConfig, BoxError> {
        if self.user.is_empty() {
            return Err("user is empty".into());
        }

        let mut methods = Vec::new();
        if let Some(path) = &self.key_path {
            let key = fs::read(path)
                .map_err(|e| format!("read private key {}: {}", path.display(), e))?;
            if key.is_empty() {
                return Err(format!("private key {} is empty", path.display()).into());
            }
            methods.push(AuthMethod::PublicKey(key));
        }
        if let Some(password) = &self.password {
            methods.push(AuthMethod::Password(password.clone()));
        }

        if methods.is_empty() {
            return Err("no password or private key configured".into());
        }
        Ok(AgentConfig {
            user: self.user.clone(),
            methods,
        })
    }
}
