//! Owned background tasks and their stop signal.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// A spawned background task together with the signal that stops it.
///
/// The task receives the stop receiver when spawned. Dropping the guard
/// closes the channel, which wakes the receiver as well, so a task never
/// outlives the mux that owns it.
#[derive(Debug)]
pub struct Shutdown {
    name: &'static str,
    tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl Shutdown {
    /// Spawn `task` on `runtime`, handing it the stop receiver.
    pub fn spawn<F, Fut>(runtime: &Handle, name: &'static str, task: F) -> Self
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = broadcast::channel(1);
        let task = runtime.spawn(task(rx));
        Self { name, tx, task }
    }

    /// Signal the task and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(task = self.name, error = %e, "Background task ended abnormally");
        }
    }
}
