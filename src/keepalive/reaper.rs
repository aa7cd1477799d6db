//! Background task evicting idle, unreferenced sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::pool::table::{close_entries, SessionPool};
use crate::session::Session;

/// Shortest timer period, so a zero idle threshold cannot spin.
const MIN_TICK: Duration = Duration::from_millis(1);

pub struct Reaper<S> {
    pool: Arc<SessionPool<S>>,
    idle: Duration,
}

impl<S: Session> Reaper<S> {
    pub fn new(pool: Arc<SessionPool<S>>, idle: Duration) -> Self {
        Self { pool, idle }
    }

    /// Spawn the reaper on `runtime`, armed. Stop it through the returned guard.
    pub fn spawn(self, runtime: &tokio::runtime::Handle, wake: mpsc::Receiver<()>) -> Shutdown {
        Shutdown::spawn(runtime, "reaper", move |stop| self.run(wake, stop))
    }

    pub async fn run(self, mut wake: mpsc::Receiver<()>, mut shutdown: broadcast::Receiver<()>) {
        let tick = self.idle.max(MIN_TICK);
        tracing::info!(idle_secs = self.idle.as_secs_f64(), "Reaper starting");

        let timer = time::sleep(tick);
        tokio::pin!(timer);
        let mut armed = true;

        loop {
            tokio::select! {
                _ = &mut timer, if armed => {
                    if self.sweep().await {
                        timer.as_mut().reset(Instant::now() + tick);
                    } else {
                        armed = false;
                        tracing::debug!("Pool empty, reaper disarmed");
                    }
                }
                msg = wake.recv() => match msg {
                    Some(()) => {
                        if !armed {
                            timer.as_mut().reset(Instant::now() + tick);
                            armed = true;
                            tracing::debug!("Reaper re-armed");
                        }
                    }
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Reaper stopped");
    }

    /// Evict idle sessions. Returns true if any session is still pooled.
    async fn sweep(&self) -> bool {
        let (evicted, has_alive) = self.pool.take_idle(Instant::now(), self.idle).await;
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), has_alive, "Evicting idle sessions");
            metrics::record_evictions(evicted.len());
            close_entries(evicted, "idle").await;
        }
        has_alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counted(Arc<AtomicUsize>);

    #[async_trait]
    impl Session for Counted {
        async fn close(&self) -> Result<(), BoxError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_after_idle() {
        let closes = Arc::new(AtomicUsize::new(0));
        let pool = Arc::new(SessionPool::new());
        drop(pool.admit("a:22", Counted(closes.clone()), || {}).await);

        let (_wake_tx, wake_rx) = mpsc::channel(1);
        let handle = Reaper::new(pool.clone(), Duration::from_secs(10))
            .spawn(&tokio::runtime::Handle::current(), wake_rx);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(pool.len().await, 1);

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(pool.len().await, 0);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rearms_on_wake() {
        let closes = Arc::new(AtomicUsize::new(0));
        let pool = Arc::new(SessionPool::new());
        let idle = Duration::from_secs(10);

        let (wake_tx, wake_rx) = mpsc::channel(1);
        let handle = Reaper::new(pool.clone(), idle).spawn(&tokio::runtime::Handle::current(), wake_rx);

        // First tick sees an empty pool and disarms
        time::sleep(Duration::from_secs(11)).await;

        drop(pool.admit("a:22", Counted(closes.clone()), || {}).await);
        wake_tx.try_send(()).unwrap();
        // A second wake while one is pending is dropped
        assert!(wake_tx.try_send(()).is_err());

        time::sleep(Duration::from_secs(9)).await;
        assert_eq!(pool.len().await, 1);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(pool.len().await, 0);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn wake_while_armed_keeps_timer() {
        let closes = Arc::new(AtomicUsize::new(0));
        let pool = Arc::new(SessionPool::new());
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let handle = Reaper::new(pool.clone(), Duration::from_secs(10))
            .spawn(&tokio::runtime::Handle::current(), wake_rx);

        drop(pool.admit("a:22", Counted(closes.clone()), || {}).await);
        time::sleep(Duration::from_secs(9)).await;
        drop(pool.admit("b:22", Counted(closes.clone()), || {}).await);
        wake_tx.try_send(()).unwrap();

        // Tick still fires at t=10, not t=19
        time::sleep(Duration::from_secs(2)).await;
        assert!(pool.status("a:22").await.is_none());
        assert!(pool.status("b:22").await.is_some());
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        handle.stop().await;
    }

    #[tokio::test]
    async fn stops_on_signal() {
        let pool: Arc<SessionPool<Counted>> = Arc::new(SessionPool::new());
        let (_wake_tx, wake_rx) = mpsc::channel(1);
        let handle = Reaper::new(pool, Duration::from_secs(3600))
            .spawn(&tokio::runtime::Handle::current(), wake_rx);

        tokio::time::timeout(Duration::from_secs(5), handle.stop())
            .await
            .expect("reaper should stop promptly");
    }
}
