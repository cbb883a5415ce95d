//! Artifacts from GitHub REST API.

use std::fmt::Display;

use serde::Deserialize;

/// Represents artifacts from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Artifacts {
    pub total_count: u64,
    pub artifacts: Vec<Artifact>,
}

/// Represents an artifact from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    pub archive_download_url: String,
    #[serde(default)]
    pub expired: bool,
    /// The content digest, in the form of `sha256:<hex>`.
    pub digest: Option<String>,
}

impl Artifact {
    /// Returns the hex encoded sha256 digest, if the artifact has one.
    pub fn sha256(&self) -> Option<&str> {
        self.digest.as_deref()?.strip_prefix("sha256:")
    }

    /// The file name the archive is stored under, safe to join onto a directory.
    pub fn file_name(&self) -> String {
        format!("{}.zip", sanitize_filename::sanitize(&self.name))
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} at {})",
            self.name, self.id, self.archive_download_url
        )
    }
}
