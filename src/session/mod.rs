//! Transport collaborator contracts.
//!
//! The multiplexer never speaks the remote-login protocol itself. A
//! [`Dialer`] establishes one [`Session`] per destination, optionally
//! tunneled through an already open gateway session, and the pool owns
//! that session until it is reaped or the Mux shuts down.

use async_trait::async_trait;

use crate::auth::Credential;
use crate::error::BoxError;

/// An established connection to one address.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Tear down the transport. Called exactly once by the pool.
    async fn close(&self) -> Result<(), BoxError>;
}

/// Establishes sessions for the multiplexer.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    type Credential: Credential;
    type Session: Session;

    /// Connect to `addr`, tunneling through `via` when given.
    async fn dial(
        &self,
        addr: &str,
        config: <Self::Credential as Credential>::Config,
        via: Option<&Self::Session>,
    ) -> Result<Self::Session, BoxError>;
}
