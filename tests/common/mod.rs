//! Shared mock transport for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_mux::{BoxError, Credential, Dialer, PolicySet, Session};
use async_trait::async_trait;
use serde::Deserialize;

/// Credential whose config is just the user name.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCredential {
    pub user: String,
}

impl TestCredential {
    pub fn new(user: &str) -> Self {
        Self { user: user.into() }
    }
}

impl Credential for TestCredential {
    type Config = String;

    fn resolve_config(&self) -> Result<String, BoxError> {
        if self.user.is_empty() {
            return Err("user is empty".into());
        }
        Ok(self.user.clone())
    }
}

/// Everything the mock dialer observed.
#[derive(Debug, Default)]
pub struct Journal {
    /// (addr, via addr, user) per dial attempt.
    pub dials: Mutex<Vec<(String, Option<String>, String)>>,
    /// Session ids in close order.
    pub closes: Mutex<Vec<usize>>,
    next_id: AtomicUsize,
}

impl Journal {
    pub fn dial_count(&self) -> usize {
        self.dials.lock().unwrap().len()
    }

    pub fn dialed(&self) -> Vec<(String, Option<String>)> {
        self.dials
            .lock()
            .unwrap()
            .iter()
            .map(|(addr, via, _)| (addr.clone(), via.clone()))
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.lock().unwrap().len()
    }

    pub fn closed_ids(&self) -> Vec<usize> {
        self.closes.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct MockSession {
    pub id: usize,
    pub addr: String,
    journal: Arc<Journal>,
}

#[async_trait]
impl Session for MockSession {
    async fn close(&self) -> Result<(), BoxError> {
        self.journal.closes.lock().unwrap().push(self.id);
        Ok(())
    }
}

pub struct MockDialer {
    pub journal: Arc<Journal>,
    delay: Duration,
    refuse: HashSet<String>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self {
            journal: Arc::new(Journal::default()),
            delay: Duration::ZERO,
            refuse: HashSet::new(),
        }
    }

    /// Hold every dial for `delay` before completing it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail dials to `addr`.
    pub fn refusing(mut self, addr: &str) -> Self {
        self.refuse.insert(addr.to_string());
        self
    }
}

#[async_trait]
impl Dialer for MockDialer {
    type Credential = TestCredential;
    type Session = MockSession;

    async fn dial(
        &self,
        addr: &str,
        config: String,
        via: Option<&MockSession>,
    ) -> Result<MockSession, BoxError> {
        self.journal.dials.lock().unwrap().push((
            addr.to_string(),
            via.map(|s| s.addr.clone()),
            config,
        ));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.refuse.contains(addr) {
            return Err(format!("connect {addr}: connection refused").into());
        }

        Ok(MockSession {
            id: self.journal.next_id.fetch_add(1, Ordering::SeqCst),
            addr: addr.to_string(),
            journal: Arc::clone(&self.journal),
        })
    }
}

/// Default credential only, no gates.
pub fn default_policy() -> PolicySet<TestCredential> {
    PolicySet::new().with_default(TestCredential::new("ops"))
}
