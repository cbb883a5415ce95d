//! Data models of GitHub Actions workflows.

use std::fmt::Display;

use serde::Deserialize;

pub mod artifact;
pub mod job;

/// The identifier of a workflow run.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle phase of a workflow run or job.
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    Pending,
    Waiting,
    InProgress,
    Completed,
    /// Any status this client does not know of. Treated as not yet completed.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns `true` once the run reached a terminal state.
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// The final outcome of a completed run or job.
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    StartupFailure,
    /// A conclusion this client does not know of, or none at all.
    #[serde(other)]
    Unknown,
}

impl Conclusion {
    /// The wire name of the conclusion.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::Stale => "stale",
            Self::StartupFailure => "startup_failure",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` only for [`Conclusion::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a GitHub Actions workflow run from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRun {
    pub id: RunId,
    /// The name of the workflow, which GitHub may leave out.
    pub name: Option<String>,
    pub head_branch: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
}

impl WorkflowRun {
    /// Checks whether this run was created for `branch` by a workflow whose name contains `keyword`, ignoring case.
    ///
    /// A run without name never matches.
    pub fn matches(&self, branch: &str, keyword: &str) -> bool {
        self.head_branch == branch
            && self
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&keyword.to_lowercase()))
    }
}

impl Display for WorkflowRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({} on {})", self.id, self.head_branch),
            None => write!(f, "{} on {}", self.id, self.head_branch),
        }
    }
}

/// Represents a page of workflow runs from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRuns {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}
