//! The connection multiplexer.
//!
//! # Responsibilities
//! - Resolve a destination to a live, shared session
//! - Tunnel through a gateway session when a gate rule applies (one hop)
//! - Collapse concurrent dials of one address into a single pooled session
//! - Own the pool and the idle reaper, and tear both down on close
//!
//! # Design Decisions
//! - The closed flag is checked before any lock is taken
//! - Transport dials and closes never run under the pool lock
//! - A dial race keeps the first stored session; the loser is closed silently
//! - Gateways are always dialed directly; chained gateways are not followed

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::auth::{Credential, PolicySet};
use crate::error::MuxError;
use crate::keepalive::Reaper;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::pool::table::close_entries;
use crate::pool::{Admission, BorrowHandle, Lookup, SessionPool};
use crate::routing::{MatcherBuilder, RoutingTable};
use crate::session::{Dialer, Session};

type Handle<D> = BorrowHandle<<D as Dialer>::Session>;

/// Pooled, gateway-aware session multiplexer.
///
/// Share it behind an `Arc`; every method takes `&self`. Call [`Mux::close`]
/// before dropping it, otherwise pooled transports are dropped without being
/// closed.
pub struct Mux<D: Dialer> {
    closed: AtomicBool,
    routes: RoutingTable<D::Credential>,
    dialer: D,
    pool: Arc<SessionPool<D::Session>>,
    wake: OnceLock<mpsc::Sender<()>>,
    reaper: Mutex<Option<Shutdown>>,
}

impl<D: Dialer> Mux<D> {
    /// Validate the policies and compile the routing table.
    ///
    /// Nothing is built if validation fails.
    pub fn new<B>(policy: PolicySet<D::Credential>, builder: B, dialer: D) -> Result<Self, MuxError>
    where
        B: MatcherBuilder,
    {
        policy.validate()?;
        let routes = RoutingTable::build(&policy, &builder)?;

        tracing::debug!(
            gates = routes.gate_count(),
            agents = routes.auth_count(),
            has_default = policy.default.is_some(),
            "Mux created"
        );

        Ok(Self {
            closed: AtomicBool::new(false),
            routes,
            dialer,
            pool: Arc::new(SessionPool::new()),
            wake: OnceLock::new(),
            reaper: Mutex::new(None),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Gateway `addr` must be reached through, if any.
    pub fn gate(&self, addr: &str) -> Option<&str> {
        self.routes.gate(addr)
    }

    /// Credential used for `addr`.
    pub fn resolve_auth(&self, addr: &str) -> Result<Arc<D::Credential>, MuxError> {
        self.routes.resolve_auth(addr)
    }

    /// Number of pooled sessions.
    pub async fn pool_len(&self) -> usize {
        self.pool.len().await
    }

    /// Open time and reference count of the session pooled for `addr`.
    pub async fn session_status(&self, addr: &str) -> Option<(Instant, usize)> {
        self.pool.status(addr).await
    }

    /// Start the idle reaper. Must be called from within a Tokio runtime.
    ///
    /// Sessions that are unreferenced and have been open for at least `idle`
    /// are closed. Only the first call has an effect.
    pub fn keepalive(&self, idle: Duration) {
        let mut slot = self.reaper.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            tracing::warn!("Keepalive requested on a closed mux, ignoring");
            return;
        }
        if slot.is_some() {
            tracing::warn!("Keepalive already running, ignoring");
            return;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "Keepalive needs a Tokio runtime");
                return;
            }
        };

        let (wake_tx, wake_rx) = mpsc::channel(1);
        if self.wake.set(wake_tx).is_err() {
            return;
        }
        let reaper = Reaper::new(Arc::clone(&self.pool), idle);
        *slot = Some(reaper.spawn(&runtime, wake_rx));
    }

    /// Borrow a live session to `addr`, dialing it (and its gateway) if needed.
    pub async fn dial(&self, addr: &str) -> Result<Handle<D>, MuxError> {
        if self.is_closed() {
            return Err(MuxError::Closed);
        }

        let gateway = self.routes.gate(addr);
        let pooled_gate = match self.pool.lookup(addr, gateway).await {
            Lookup::Destination(handle) => {
                metrics::record_pool_hit();
                tracing::debug!(addr, "Reusing pooled session");
                return Ok(handle);
            }
            Lookup::Gateway(handle) => Some(handle),
            Lookup::Miss => None,
        };

        let gate = match (pooled_gate, gateway) {
            (Some(handle), _) => Some(handle),
            (None, Some(gateway)) => Some(self.connect(gateway, None, "gateway").await?),
            (None, None) => None,
        };

        if let Some(gate) = &gate {
            tracing::debug!(addr, gateway = %gate.addr(), "Tunneling through gateway");
        }
        // The gateway handle is released when `gate` drops, whatever the outcome.
        self.connect(addr, gate.as_deref(), "destination").await
    }

    /// Dial `addr` and offer the session to the pool.
    async fn connect(
        &self,
        addr: &str,
        via: Option<&D::Session>,
        role: &'static str,
    ) -> Result<Handle<D>, MuxError> {
        let credential = self.routes.resolve_auth(addr)?;
        let config = credential.resolve_config().map_err(MuxError::Auth)?;

        metrics::record_dial(role);
        tracing::debug!(addr, role, tunneled = via.is_some(), "Dialing");
        let session = self
            .dialer
            .dial(addr, config, via)
            .await
            .map_err(|source| MuxError::Dial {
                addr: addr.to_string(),
                source,
            })?;

        let wake = self.wake.get();
        let closed = &self.closed;
        let admission = self
            .pool
            .admit(addr, session, || {
                if let Some(wake) = wake {
                    if !closed.load(Ordering::Acquire) {
                        // Full slot means a wake is already pending.
                        let _ = wake.try_send(());
                    }
                }
            })
            .await;

        match admission {
            Admission::Inserted(handle) => Ok(handle),
            Admission::Existing(handle, loser) => {
                metrics::record_race_discard();
                tracing::debug!(addr, "Lost dial race, closing duplicate session");
                if let Err(e) = loser.close().await {
                    tracing::warn!(addr, error = %e, "Failed to close duplicate session");
                }
                Ok(handle)
            }
            Admission::Sealed(late) => {
                if let Err(e) = late.close().await {
                    tracing::warn!(addr, error = %e, "Failed to close session dialed during shutdown");
                }
                Err(MuxError::Closed)
            }
        }
    }

    /// Stop the reaper and close every pooled session.
    ///
    /// Only the first call does anything; all calls return `Ok`. Borrowers
    /// still holding handles see transport errors on next use.
    pub async fn close(&self) -> Result<(), MuxError> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let reaper = self
            .reaper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reaper) = reaper {
            reaper.stop().await;
        }

        let drained = self.pool.drain().await;
        tracing::info!(sessions = drained.len(), "Mux closing");
        close_entries(drained, "shutdown").await;
        Ok(())
    }
}
