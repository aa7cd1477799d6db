//! Pooled session entry and its borrow handle.
//!
//! # Responsibilities
//! - Remember when a session was opened
//! - Count outstanding borrow handles
//! - Release the count on every exit path via `Drop`

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::BoxError;
use crate::session::Session;

/// A session owned by the pool.
#[derive(Debug)]
pub struct PooledSession<S> {
    addr: String,
    session: S,
    opened_at: Instant,
    refs: AtomicUsize,
}

impl<S: Session> PooledSession<S> {
    pub fn new(addr: impl Into<String>, session: S) -> Arc<Self> {
        Arc::new(Self {
            addr: addr.into(),
            session,
            opened_at: Instant::now(),
            refs: AtomicUsize::new(0),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Open time and number of live borrow handles.
    pub fn status(&self) -> (Instant, usize) {
        (self.opened_at, self.refs.load(Ordering::Acquire))
    }

    /// True if unreferenced and open for at least `idle`.
    pub fn is_idle(&self, now: Instant, idle: std::time::Duration) -> bool {
        let (opened_at, refs) = self.status();
        refs == 0 && now.saturating_duration_since(opened_at) >= idle
    }

    /// Create a borrow handle, incrementing the reference count.
    pub fn acquire(self: &Arc<Self>) -> BorrowHandle<S> {
        self.refs.fetch_add(1, Ordering::AcqRel);
        BorrowHandle {
            entry: Arc::clone(self),
        }
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<(), BoxError> {
        self.session.close().await
    }
}

/// A RAII guard over a pooled session.
///
/// Dereferences to the session. Dropping it releases the reference; it
/// never closes the transport.
#[derive(Debug)]
pub struct BorrowHandle<S: Session> {
    entry: Arc<PooledSession<S>>,
}

impl<S: Session> BorrowHandle<S> {
    pub fn addr(&self) -> &str {
        self.entry.addr()
    }

    pub fn status(&self) -> (Instant, usize) {
        self.entry.status()
    }

    /// True if both handles view the same pooled session.
    pub fn same_session(&self, other: &BorrowHandle<S>) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
    }

    /// Give the reference back to the pool.
    pub fn release(self) {
        drop(self);
    }
}

impl<S: Session> Clone for BorrowHandle<S> {
    fn clone(&self) -> Self {
        self.entry.acquire()
    }
}

impl<S: Session> Deref for BorrowHandle<S> {
    type Target = S;
    fn deref(&self) -> &Self::Target {
        &self.entry.session
    }
}

impl<S: Session> Drop for BorrowHandle<S> {
    fn drop(&mut self) {
        let prev = self.entry.refs.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "borrow handle released twice");
        tracing::trace!(addr = %self.entry.addr, refs = prev - 1, "Borrow handle released");
    }
}
