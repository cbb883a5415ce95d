//! Defines the environment variables to use.
//!
//! They are read once by the binary and passed down as [`Config`](crate::config::Config) and friends.

#![cfg(feature = "env")]

use std::env;

use anyhow::Context as _;

use crate::{config::Repository, transactions::DEFAULT_RESOLVE_ATTEMPTS};

/// Parses an environment variable from [`String`] to something else, wrapping any error in [`anyhow::Error`].
#[macro_export]
macro_rules! parse_env {
    ($key:expr => |$var:ident| $expr:expr) => {
        std::env::var($key)
            .map_err(|e| anyhow::anyhow!(e))
            .and_then(|$var| $expr)
    };
    ($key:expr => |$var:ident| $expr:expr; anyhow) => {
        parse_env!($key => |$var| $expr.map_err(|e| anyhow::anyhow!(e)))
    };
}

/// The GitHub token.
///
/// # Errors
///
/// Returns an error if `GITHUB_TOKEN` is not set or empty.
pub fn github_token() -> anyhow::Result<String> {
    match env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => anyhow::bail!("GITHUB_TOKEN environment variable not set"),
    }
}

/// The repository from `GITHUB_REPOSITORY`, if set.
///
/// # Errors
///
/// Returns an error if the variable is set but not in `owner/name` form.
pub fn github_repository() -> anyhow::Result<Option<Repository>> {
    match env::var("GITHUB_REPOSITORY") {
        Ok(repository) => repository
            .parse()
            .map(Some)
            .context("GITHUB_REPOSITORY is malformed"),
        Err(_) => Ok(None),
    }
}

/// The root of GitHub REST API from `GITHUB_API_URL`, if set.
pub fn github_api_url() -> Option<String> {
    env::var("GITHUB_API_URL").ok().filter(|url| !url.is_empty())
}

/// The root of GitHub web pages from `GITHUB_SERVER_URL`, if set.
pub fn github_server_url() -> Option<String> {
    env::var("GITHUB_SERVER_URL").ok().filter(|url| !url.is_empty())
}

/// The maximum number of run listings when resolving a dispatched run, from `MAX_RETRIES`.
///
/// Falls back to [`DEFAULT_RESOLVE_ATTEMPTS`] if unset or malformed.
pub fn max_retries() -> u32 {
    parse_env!("MAX_RETRIES" => |s| s.parse::<u32>(); anyhow).unwrap_or(DEFAULT_RESOLVE_ATTEMPTS)
}
