use std::time::Duration;

use tokio::{
    task::JoinSet,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;


/// Runs periodic jobs until shut down.
pub struct Scheduler {
    cancel_token: CancellationToken,
    tasks: JoinSet<&'static str>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when the scheduler shuts down.
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Spawns a job that runs immediately and then every `period`.
    ///
    /// The job gets a token cancelled on shutdown so it can abandon work in flight.
    /// A failing run is logged and the job keeps its schedule; a slow run delays
    /// the next tick instead of queueing a burst.
    pub fn spawn_task<P, F, Fut>(
        &mut self,
        period: Duration,
        name: &'static str,
        params: P,
        mut task: F,
    ) where
        P: Clone + Send + Sync + 'static,
        F: FnMut(P, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let cancel = self.cancel_token.clone();
        self.tasks.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = task(params.clone(), cancel.child_token()).await {
                            tracing::error!(error = %e, "Task {name} failed");
                        }
                    }
                }
            }

            name
        });
    }

    /// Cancels all jobs and waits for them within `timeout`.
    ///
    /// Jobs still running at the deadline are left behind; the process is expected to exit.
    pub async fn shutdown(mut self, timeout: Duration) {
        self.cancel_token.cancel();

        let deadline = Instant::now() + timeout;

        while !self.tasks.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::error!("Scheduler timed out when shutting down");
                break;
            }

            match time::timeout(remaining, self.tasks.join_next()).await {
                Ok(Some(Ok(name))) => tracing::info!("Task {name} stopped"),
                Ok(Some(Err(e))) => tracing::error!(error = %e, "Task join error"),
                Ok(None) => break,
                Err(_) => {
                    tracing::error!("Scheduler timed out when shutting down");
                    break;
                }
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }
}
