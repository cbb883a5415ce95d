use std::{collections::HashSet, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    client::GitHubClient,
    error::{Error, Result},
    framework::RetryPolicy,
    workflow::{RunId, WorkflowRun, WorkflowRuns},
};

/// The default number of listings before a dispatched run is considered missing.
///
/// The binary lets `MAX_RETRIES` override it.
pub const DEFAULT_RESOLVE_ATTEMPTS: u32 = 5;

/// Timing of run resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveConfig {
    /// The pause between dispatching and the first listing.
    pub grace: Duration,
    /// How the listing is repeated while no run matches.
    pub retry: RetryPolicy,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(2),
            retry: RetryPolicy::new(Duration::from_secs(1))
                .with_max_attempts(DEFAULT_RESOLVE_ATTEMPTS),
        }
    }
}

/// Finds the run a dispatch created.
///
/// A dispatch returns nothing to correlate with, so runs are matched by branch and by a keyword
/// contained in the run name. The first match of the most recent page wins.
#[derive(Debug, Clone)]
pub struct RunResolver {
    client: GitHubClient,
    keyword: String,
    config: ResolveConfig,
}

impl RunResolver {
    /// Creates a [`RunResolver`] matching run names against `keyword`, ignoring case.
    pub fn new(client: GitHubClient, keyword: &str, config: ResolveConfig) -> Self {
        Self {
            client,
            keyword: keyword.to_owned(),
            config,
        }
    }

    /// Lists the most recent runs of `branch`, first page only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if listing fails.
    pub async fn list_runs(&self, branch: &str) -> Result<Vec<WorkflowRun>> {
        let url = self.client.repo_url("actions/runs");
        let runs: WorkflowRuns = self.client.get_json(&url, &[("branch", branch)]).await?;
        debug!(
            "listed {} of {} runs from {url}",
            runs.workflow_runs.len(),
            runs.total_count
        );
        Ok(runs.workflow_runs)
    }

    /// Collects the ids of matching runs that already exist, so that a later
    /// [`resolve_new`](Self::resolve_new) does not pick one of them up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if listing fails.
    pub async fn snapshot(&self, branch: &str) -> Result<HashSet<RunId>> {
        Ok(self
            .list_runs(branch)
            .await?
            .into_iter()
            .filter(|run| run.matches(branch, &self.keyword))
            .map(|run| run.id)
            .collect())
    }

    /// Resolves the run just dispatched on `branch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunNotFound`] if no run matched within the configured attempts, or
    /// [`Error::Transport`] if listing fails.
    pub async fn resolve(&self, branch: &str) -> Result<RunId> {
        self.resolve_new(branch, &HashSet::new()).await
    }

    /// Resolves the run just dispatched on `branch`, skipping runs in `known`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub async fn resolve_new(&self, branch: &str, known: &HashSet<RunId>) -> Result<RunId> {
        debug!(
            "waiting {:?} for the dispatched run on {branch} to appear…",
            self.config.grace
        );
        tokio::time::sleep(self.config.grace).await;

        let mut attempts = self.config.retry.start();
        loop {
            let runs = self.list_runs(branch).await?;
            if let Some(run) = runs
                .iter()
                .find(|run| run.matches(branch, &self.keyword) && !known.contains(&run.id))
            {
                info!("resolved dispatched run {run}");
                return Ok(run.id);
            }

            if !attempts.retry_if_possible() {
                return Err(Error::RunNotFound {
                    branch: branch.to_owned(),
                    keyword: self.keyword.clone(),
                });
            }
            warn!(
                "no new run matching '{}' on {branch} yet ({} listed)",
                self.keyword,
                runs.len()
            );
            attempts.wait().await;
        }
    }
}
