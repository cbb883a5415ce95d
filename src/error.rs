//! Errors raised while driving a workflow run.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Shorthand for results of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a single request against GitHub REST API.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    /// The request never produced a response.
    #[error("failed to reach {url}: {source}")]
    Network {
        /// The requested url.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The response carried a non-success status.
    #[error("{url} responded with {status}")]
    Status {
        /// The requested url.
        url: String,
        /// The returned status.
        status: StatusCode,
    },
    /// The response body was not the expected json, or broke off while streaming.
    #[error("failed to read response from {url}: {source}")]
    Decode {
        /// The requested url.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Returns the status code if the backend answered with one.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Every fatal failure of an invocation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// A request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The dispatch call was rejected.
    #[error("failed to dispatch workflow {workflow}: {status}")]
    Dispatch {
        /// The dispatched workflow file.
        workflow: String,
        /// The returned status.
        status: StatusCode,
    },
    /// No listed run matched the dispatched workflow.
    #[error("no workflow run matching '{keyword}' found for branch {branch}")]
    RunNotFound {
        /// The dispatched branch.
        branch: String,
        /// The name keyword runs were matched against.
        keyword: String,
    },
    /// Writing an artifact to disk failed.
    #[error("failed to write {path:?}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A downloaded artifact does not hash to its advertised digest.
    #[error("broken artifact {artifact}: expected sha256 {expected}, got {actual}")]
    DigestMismatch {
        /// The artifact name.
        artifact: String,
        /// The advertised hex digest.
        expected: String,
        /// The computed hex digest.
        actual: String,
    },
    /// A repository identifier is not in `owner/name` form.
    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),
    /// Running git failed.
    #[error("git: {0}")]
    Git(String),
}

impl Error {
    pub(crate) fn io<P>(path: P, source: std::io::Error) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
