//! Jobs of a workflow run from GitHub REST API.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::Conclusion;

/// Represents jobs from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Jobs {
    pub total_count: u64,
    pub jobs: Vec<Job>,
}

/// Represents a job of a workflow run from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Job {
    pub name: String,
    pub conclusion: Option<Conclusion>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// The page showing the job's logs, if GitHub provides one.
    #[serde(rename = "html_url", default)]
    pub detail_url: Option<String>,
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.conclusion {
            Some(conclusion) => write!(f, "{}: {conclusion}", self.name),
            None => write!(f, "{}: pending", self.name),
        }
    }
}
