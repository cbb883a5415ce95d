use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    client::GitHubClient,
    error::Result,
    framework::RetryPolicy,
    workflow::{Conclusion, RunId, WorkflowRun},
};

/// Anything a [`WorkflowRun`] can be fetched from.
pub trait RunSource {
    /// Fetches the current state of a run.
    fn fetch_run(&self, run_id: RunId) -> impl Future<Output = Result<WorkflowRun>> + Send;
}

impl RunSource for GitHubClient {
    async fn fetch_run(&self, run_id: RunId) -> Result<WorkflowRun> {
        let url = self.repo_url(&format!("actions/runs/{run_id}"));
        Ok(self.get_json(&url, &[]).await?)
    }
}

/// How a wait for completion ended.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The run completed with a conclusion. A completed run without conclusion reports [`Conclusion::Unknown`].
    Completed(Conclusion),
    /// The run did not complete within the configured bounds.
    TimedOut,
}

impl PollOutcome {
    /// Returns `true` only if the run completed successfully.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Completed(conclusion) if conclusion.is_success())
    }
}

/// Timing of status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// The pause between two fetches.
    pub interval: Duration,
    /// The maximum time to wait for completion, unbounded if [`None`].
    pub timeout: Option<Duration>,
    /// The maximum number of fetches, unbounded if [`None`].
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(60 * 60)),
            max_polls: None,
        }
    }
}

impl PollConfig {
    fn policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::new(self.interval);
        policy.max_wait = self.timeout;
        policy.max_attempts = self.max_polls;
        policy
    }
}

/// Waits for runs to complete.
#[derive(Debug, Clone)]
pub struct StatusPoller<S = GitHubClient> {
    source: S,
    config: PollConfig,
}

impl<S> StatusPoller<S>
where
    S: RunSource,
{
    /// Creates a [`StatusPoller`] fetching runs from `source`.
    pub const fn new(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }

    /// Fetches the run until its status is `completed`, sleeping one interval between fetches.
    ///
    /// `on_tick` observes every fetched snapshot, the completed one included.
    ///
    /// A fetch still pending when [`PollConfig::timeout`] runs out is abandoned, and the wait ends
    /// with [`PollOutcome::TimedOut`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::error::Error::Transport) on the first failed fetch; failures are not retried.
    pub async fn await_completion<F>(&self, run_id: RunId, mut on_tick: F) -> Result<PollOutcome>
    where
        F: FnMut(&WorkflowRun),
    {
        let mut attempts = self.config.policy().start();

        loop {
            let fetch = self.source.fetch_run(run_id);
            let run = match attempts.remaining() {
                Some(remaining) => match tokio::time::timeout(remaining, fetch).await {
                    Ok(run) => run?,
                    Err(_) => {
                        warn!("gave up waiting for run {run_id} while fetching its status");
                        return Ok(PollOutcome::TimedOut);
                    }
                },
                None => fetch.await?,
            };
            on_tick(&run);

            if run.status.is_completed() {
                let conclusion = run.conclusion.unwrap_or(Conclusion::Unknown);
                info!("run {run_id} completed with {conclusion}");
                return Ok(PollOutcome::Completed(conclusion));
            }
            debug!("run {run_id} is {:?}", run.status);

            if !attempts.retry_if_possible() {
                warn!(
                    "gave up waiting for run {run_id} after {} polls",
                    attempts.count()
                );
                return Ok(PollOutcome::TimedOut);
            }
            attempts.wait().await;
        }
    }
}
