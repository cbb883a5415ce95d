//! Drives one test run from dispatch to collected results.
//!
//! See: [`TestRunner::start`], [`TestRunner::finish`]

use std::path::PathBuf;

use tracing::info;

use crate::{
    client::GitHubClient,
    error::Result,
    transactions::{
        ArtifactFetcher, DispatchRequest, JobReporter, PollConfig, PollOutcome, ResolveConfig,
        RunResolver, StatusPoller, WorkflowDispatcher,
    },
    workflow::{RunId, WorkflowRun, job::Job},
};

/// The workflow file dispatched by default.
pub const DEFAULT_WORKFLOW: &str = "playwright-tests.yml";
/// The keyword run names are matched against by default.
pub const DEFAULT_KEYWORD: &str = "playwright";

/// Which workflow to drive and how patiently.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// The workflow file, e.g. `playwright-tests.yml`.
    pub workflow: String,
    /// The keyword the created run's name contains.
    pub keyword: String,
    pub resolve: ResolveConfig,
    pub poll: PollConfig,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            workflow: DEFAULT_WORKFLOW.to_owned(),
            keyword: DEFAULT_KEYWORD.to_owned(),
            resolve: ResolveConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

/// What to collect once a run completed.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Where artifacts are downloaded to. Nothing is downloaded if [`None`].
    pub output_dir: Option<PathBuf>,
}

/// An artifact written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub name: String,
    pub path: PathBuf,
}

/// The results of a finished run.
#[derive(Debug)]
pub struct Report {
    pub run_id: RunId,
    pub outcome: PollOutcome,
    /// The jobs of the run. Empty if the wait timed out.
    pub jobs: Vec<Job>,
    /// The downloaded artifacts, if downloading was requested and the run completed.
    pub artifacts: Option<Vec<Downloaded>>,
}

impl Report {
    /// `0` for a successful run, `1` otherwise.
    pub const fn exit_code(&self) -> u8 {
        if self.outcome.is_success() { 0 } else { 1 }
    }
}

/// Chains the transactions of a test run.
#[derive(Debug, Clone)]
pub struct TestRunner {
    dispatcher: WorkflowDispatcher,
    resolver: RunResolver,
    poller: StatusPoller,
    jobs: JobReporter,
    artifacts: ArtifactFetcher,
}

impl TestRunner {
    /// Creates a [`TestRunner`] sharing one client between all transactions.
    pub fn new(client: &GitHubClient, settings: &RunnerSettings) -> Self {
        Self {
            dispatcher: WorkflowDispatcher::new(client.clone(), &settings.workflow),
            resolver: RunResolver::new(client.clone(), &settings.keyword, settings.resolve),
            poller: StatusPoller::new(client.clone(), settings.poll),
            jobs: JobReporter::new(client.clone()),
            artifacts: ArtifactFetcher::new(client.clone()),
        }
    }

    /// Dispatches the workflow and resolves the run it created.
    ///
    /// Matching runs listed before dispatching are never resolved to.
    ///
    /// # Errors
    ///
    /// Fails if dispatching fails, or the created run cannot be resolved.
    pub async fn start(&self, request: &DispatchRequest) -> Result<RunId> {
        let known = self.resolver.snapshot(request.branch()).await?;
        self.dispatcher.trigger(request).await?;
        self.resolver.resolve_new(request.branch(), &known).await
    }

    /// Waits for the run to complete, then fetches its jobs and downloads its artifacts if requested.
    ///
    /// `on_tick` observes every status poll.
    ///
    /// # Errors
    ///
    /// Fails on the first failing request or write. Nothing is retried.
    pub async fn finish<F>(
        &self,
        run_id: RunId,
        options: &CollectOptions,
        on_tick: F,
    ) -> Result<Report>
    where
        F: FnMut(&WorkflowRun),
    {
        let outcome = self.poller.await_completion(run_id, on_tick).await?;
        if outcome == PollOutcome::TimedOut {
            return Ok(Report {
                run_id,
                outcome,
                jobs: Vec::new(),
                artifacts: None,
            });
        }

        let jobs = self.jobs.list_jobs(run_id).await?;
        let artifacts = match &options.output_dir {
            Some(output_dir) => {
                let mut downloaded = Vec::new();
                let count = self
                    .artifacts
                    .download_each(run_id, output_dir, |artifact, path| {
                        downloaded.push(Downloaded {
                            name: artifact.name.clone(),
                            path: path.to_path_buf(),
                        });
                    })
                    .await?;
                info!("downloaded {count} artifacts of run {run_id} to {output_dir:?}");
                Some(downloaded)
            }
            None => None,
        };

        Ok(Report {
            run_id,
            outcome,
            jobs,
            artifacts,
        })
    }

    /// Runs [`start`](Self::start) and [`finish`](Self::finish) back to back.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start) and [`finish`](Self::finish).
    pub async fn run<F>(
        &self,
        request: &DispatchRequest,
        options: &CollectOptions,
        on_tick: F,
    ) -> Result<Report>
    where
        F: FnMut(&WorkflowRun),
    {
        let run_id = self.start(request).await?;
        self.finish(run_id, options, on_tick).await
    }
}
