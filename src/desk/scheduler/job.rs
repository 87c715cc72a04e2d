use std::time::Duration;
use log::{debug, info};
use tokio::{pin, select, time};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Runs one-shot jobs after a delay. Jobs that have not fired yet are
/// dropped when the scheduler is cancelled, shut down or dropped.
pub(crate) struct DelayedJobs {
    cancel_token: CancellationToken,
    tracker: TaskTracker,
}

async fn worker<F: FnOnce()>(name: &'static str, delay: Duration, cancel_token: CancellationToken, job: F) {
    let sleep = time::sleep(delay);
    pin!(sleep);
    select! {
        biased;
        _ = cancel_token.cancelled() => {
            info!("received cancel signal, dropping scheduled {}", name);
        }
        _ = &mut sleep => {
            debug!("running scheduled {} after {:?}", name, delay);
            job();
        }
    }
}

impl DelayedJobs {
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, name: &'static str, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.tracker.spawn(worker(name, delay, self.cancel_token.clone(), job));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// cancel pending jobs and wait for their tasks to return
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Drop for DelayedJobs {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
