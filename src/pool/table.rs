//! Address to session map guarded by a single read/write lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::pool::entry::{BorrowHandle, PooledSession};
use crate::session::Session;

/// Result of a read-locked pool lookup.
pub enum Lookup<S: Session> {
    /// The destination itself is pooled.
    Destination(BorrowHandle<S>),
    /// The destination is missing but its gateway is pooled.
    Gateway(BorrowHandle<S>),
    Miss,
}

/// Result of offering a freshly dialed session to the pool.
pub enum Admission<S: Session> {
    /// The session is now the canonical one for its address.
    Inserted(BorrowHandle<S>),
    /// An earlier session won the race; the offered one is handed back for closing.
    Existing(BorrowHandle<S>, S),
    /// The pool was drained for shutdown; the offered one is handed back for closing.
    Sealed(S),
}

struct PoolState<S> {
    sessions: HashMap<String, Arc<PooledSession<S>>>,
    sealed: bool,
}

/// The pool of live sessions, at most one per address.
pub struct SessionPool<S> {
    state: RwLock<PoolState<S>>,
}

impl<S: Session> SessionPool<S> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PoolState {
                sessions: HashMap::new(),
                sealed: false,
            }),
        }
    }

    /// Borrow the destination, or else its gateway, under the read lock.
    pub async fn lookup(&self, addr: &str, gateway: Option<&str>) -> Lookup<S> {
        let state = self.state.read().await;
        let sessions = &state.sessions;
        if let Some(entry) = sessions.get(addr) {
            return Lookup::Destination(entry.acquire());
        }
        match gateway.and_then(|gate| sessions.get(gate)) {
            Some(entry) => Lookup::Gateway(entry.acquire()),
            None => Lookup::Miss,
        }
    }

    /// Store `session` for `addr` unless another one got there first.
    ///
    /// `on_insert` runs under the write lock, only when the session is stored.
    pub async fn admit<F>(&self, addr: &str, session: S, on_insert: F) -> Admission<S>
    where
        F: FnOnce(),
    {
        let mut state = self.state.write().await;
        if state.sealed {
            return Admission::Sealed(session);
        }
        let sessions = &mut state.sessions;
        if let Some(existing) = sessions.get(addr) {
            return Admission::Existing(existing.acquire(), session);
        }

        let entry = PooledSession::new(addr, session);
        let handle = entry.acquire();
        sessions.insert(addr.to_string(), entry);
        metrics::record_pool_size(sessions.len());
        on_insert();
        Admission::Inserted(handle)
    }

    /// Remove every unreferenced session open for at least `idle`.
    ///
    /// Returns the removed entries and whether any session is left.
    pub async fn take_idle(
        &self,
        now: Instant,
        idle: Duration,
    ) -> (Vec<Arc<PooledSession<S>>>, bool) {
        let mut state = self.state.write().await;
        let sessions = &mut state.sessions;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| entry.is_idle(now, idle))
            .map(|(addr, _)| addr.clone())
            .collect();

        let evicted: Vec<_> = expired
            .iter()
            .filter_map(|addr| sessions.remove(addr))
            .collect();
        metrics::record_pool_size(sessions.len());
        (evicted, !sessions.is_empty())
    }

    /// Remove every session regardless of references and refuse new ones.
    pub async fn drain(&self) -> Vec<Arc<PooledSession<S>>> {
        let mut state = self.state.write().await;
        state.sealed = true;
        let drained = state.sessions.drain().map(|(_, entry)| entry).collect();
        metrics::record_pool_size(0);
        drained
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Open time and reference count of the session pooled for `addr`.
    pub async fn status(&self, addr: &str) -> Option<(Instant, usize)> {
        self.state
            .read()
            .await
            .sessions
            .get(addr)
            .map(|entry| entry.status())
    }
}

impl<S: Session> Default for SessionPool<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Close removed sessions concurrently, logging failures.
pub async fn close_entries<S: Session>(entries: Vec<Arc<PooledSession<S>>>, reason: &'static str) {
    if entries.is_empty() {
        return;
    }
    let closes = entries.iter().map(|entry| async move {
        if let Err(e) = entry.close().await {
            tracing::warn!(addr = %entry.addr(), reason, error = %e, "Failed to close session");
        } else {
            tracing::debug!(addr = %entry.addr(), reason, "Session closed");
        }
    });
    join_all(closes).await;
}
