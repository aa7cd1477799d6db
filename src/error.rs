//! Error types shared across the multiplexer.

use thiserror::Error;

/// Opaque error produced by external collaborators (transports, credentials).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by `Mux` construction and dialing.
#[derive(Debug, Error)]
pub enum MuxError {
    /// Operation attempted after `Mux::close`.
    #[error("mux has been closed")]
    Closed,

    /// No credential rule matched and no default credential exists.
    #[error("no auth method can be applied to agent")]
    NoAuthMethod,

    /// A policy pattern could not be turned into a matcher.
    #[error("create matcher for addr {pattern} failed: {source}")]
    Matcher {
        pattern: String,
        #[source]
        source: PatternError,
    },

    /// A per-pattern credential is unusable.
    #[error("{pattern}: {source}")]
    Credential {
        pattern: String,
        #[source]
        source: BoxError,
    },

    /// The default credential (or a resolved one) is unusable.
    #[error(transparent)]
    Auth(BoxError),

    /// The transport failed to establish a session.
    ///
    /// The dialer's error is kept as the source; the message prefixes it
    /// with the address that was being dialed.
    #[error("dial {addr} failed: {source}")]
    Dial {
        addr: String,
        #[source]
        source: BoxError,
    },
}

/// Errors raised while compiling an address pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid CIDR block {0:?}")]
    Cidr(String),
}
