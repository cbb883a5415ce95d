//! The steps of a test run on GitHub Actions, leaf-first.

mod await_completion;
mod dispatch;
mod download_artifacts;
mod list_jobs;
mod resolve_run;

pub use await_completion::*;
pub use dispatch::*;
pub use download_artifacts::*;
pub use list_jobs::*;
pub use resolve_run::*;
