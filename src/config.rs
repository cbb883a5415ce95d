//! Explicit configuration threaded through every component.

use std::{fmt::Display, str::FromStr};

use crate::{error::Error, workflow::RunId};

/// The default root of GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// The default root of GitHub web pages.
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// A GitHub repository identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parses the `owner/name` pair out of a git remote url.
    ///
    /// Both the scp-like form (`git@github.com:owner/name.git`) and url forms
    /// (`https://github.com/owner/name`, `ssh://git@github.com/owner/name.git`) are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRepository`] if the url has no host part or lacks an owner or name.
    pub fn from_remote_url(url: &str) -> Result<Self, Error> {
        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        if !trimmed.contains(':') {
            return Err(Error::InvalidRepository(url.to_owned()));
        }

        let mut segments = trimmed.rsplit(['/', ':']);
        match (segments.next(), segments.next(), segments.next()) {
            (Some(name), Some(owner), Some(_host)) if !name.is_empty() && !owner.is_empty() => {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(Error::InvalidRepository(url.to_owned())),
        }
    }
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(Error::InvalidRepository(s.to_owned())),
        }
    }
}

impl Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Credentials and location of the repository to drive.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub repository: Repository,
    /// The root of GitHub REST API, without a trailing slash.
    pub api_url: String,
    /// The root of GitHub web pages, without a trailing slash.
    pub web_url: String,
}

impl Config {
    /// Creates a [`Config`] against the public GitHub API.
    pub fn new(token: String, repository: Repository) -> Self {
        Self {
            token,
            repository,
            api_url: DEFAULT_API_URL.to_owned(),
            web_url: DEFAULT_WEB_URL.to_owned(),
        }
    }

    /// Replaces the API root, e.g. for GitHub Enterprise Server.
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_owned();
        self
    }

    /// Replaces the web root, e.g. for GitHub Enterprise Server.
    #[must_use]
    pub fn with_web_url(mut self, web_url: &str) -> Self {
        self.web_url = web_url.trim_end_matches('/').to_owned();
        self
    }

    /// The page of a workflow run.
    pub fn run_url(&self, run_id: RunId) -> String {
        format!("{}/{}/actions/runs/{run_id}", self.web_url, self.repository)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"***")
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .field("web_url", &self.web_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(owner: &str, name: &str) -> Repository {
        Repository {
            owner: owner.to_owned(),
            name: name.to_owned(),
        }
    }

    #[test]
    fn parses_owner_and_name() {
        assert_eq!(
            "posix4e/chroniclesync".parse::<Repository>().unwrap(),
            repo("posix4e", "chroniclesync")
        );
        assert!("chroniclesync".parse::<Repository>().is_err());
        assert!("/chroniclesync".parse::<Repository>().is_err());
        assert!("a/b/c".parse::<Repository>().is_err());
    }

    #[test]
    fn parses_remote_urls() {
        for url in [
            "git@github.com:posix4e/chroniclesync.git",
            "https://github.com/posix4e/chroniclesync",
            "https://github.com/posix4e/chroniclesync.git\n",
            "ssh://git@github.com/posix4e/chroniclesync/",
        ] {
            assert_eq!(
                Repository::from_remote_url(url).unwrap(),
                repo("posix4e", "chroniclesync"),
                "{url}"
            );
        }
        assert!(Repository::from_remote_url("posix4e/chroniclesync").is_err());
        assert!(Repository::from_remote_url("https://github.com/").is_err());
    }

    #[test]
    fn debug_hides_token() {
        let config = Config::new(String::from("ghp_secret"), repo("o", "r"))
            .with_api_url("http://127.0.0.1:8080/");
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert!(!format!("{config:?}").contains("ghp_secret"));
    }

    #[test]
    fn links_run_pages() {
        let config = Config::new(String::new(), repo("posix4e", "chroniclesync"));
        assert_eq!(
            config.run_url(RunId(42)),
            "https://github.com/posix4e/chroniclesync/actions/runs/42"
        );
        let config = config.with_web_url("https://ghe.example.com/");
        assert_eq!(
            config.run_url(RunId(7)),
            "https://ghe.example.com/posix4e/chroniclesync/actions/runs/7"
        );
    }
}
