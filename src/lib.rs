//! Triggers Playwright test runs on GitHub Actions, follows them to completion and collects their results.
//!
//! The steps live in [`transactions`] and are chained by [`runner::TestRunner`]:
//! dispatch, resolve the created run, wait for completion, then fetch jobs and artifacts.

pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod framework;
pub mod git;
pub mod runner;
pub mod transactions;
pub mod workflow;
