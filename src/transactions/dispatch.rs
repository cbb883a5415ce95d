use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;
use tracing::info;

use crate::{
    client::GitHubClient,
    error::{Error, Result, TransportError},
};

/// The browser the workflow runs the tests in.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    /// The workflow input value of the browser.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The body of a `workflow_dispatch` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    #[serde(rename = "ref")]
    branch: String,
    inputs: BTreeMap<String, String>,
}

impl DispatchRequest {
    /// Creates a [`DispatchRequest`] for `branch` with the mandatory inputs.
    pub fn new(branch: &str, browser: Browser, debug: bool) -> Self {
        let inputs = BTreeMap::from([
            (String::from("browser"), browser.as_str().to_owned()),
            (String::from("debug"), debug.to_string()),
        ]);

        Self {
            branch: branch.to_owned(),
            inputs,
        }
    }

    /// Adds the API endpoint the tests run against. An absent or empty endpoint leaves the input unset.
    #[must_use]
    pub fn with_api_endpoint(mut self, api_endpoint: Option<&str>) -> Self {
        if let Some(api_endpoint) = api_endpoint.filter(|endpoint| !endpoint.is_empty()) {
            self.inputs
                .insert(String::from("api_endpoint"), api_endpoint.to_owned());
        }
        self
    }

    /// The branch to run the workflow on.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The workflow inputs.
    pub const fn inputs(&self) -> &BTreeMap<String, String> {
        &self.inputs
    }
}

/// Triggers runs of one workflow.
#[derive(Debug, Clone)]
pub struct WorkflowDispatcher {
    client: GitHubClient,
    workflow: String,
}

impl WorkflowDispatcher {
    /// Creates a [`WorkflowDispatcher`] for the workflow file `workflow`, e.g. `playwright-tests.yml`.
    pub fn new(client: GitHubClient, workflow: &str) -> Self {
        Self {
            client,
            workflow: workflow.to_owned(),
        }
    }

    /// Asks GitHub to start a new run. The response carries no run identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dispatch`] if GitHub rejects the request, or [`Error::Transport`] if it cannot be sent.
    pub async fn trigger(&self, request: &DispatchRequest) -> Result<()> {
        let url = self
            .client
            .repo_url(&format!("actions/workflows/{}/dispatches", self.workflow));

        match self.client.post_json(&url, request).await {
            Ok(()) => {
                info!(
                    "dispatched workflow {} on {} with {:?}",
                    self.workflow, request.branch, request.inputs
                );
                Ok(())
            }
            Err(TransportError::Status { status, .. }) => Err(Error::Dispatch {
                workflow: self.workflow.clone(),
                status,
            }),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;
    use crate::config::{Config, Repository};

    fn dispatcher(server: &MockServer) -> WorkflowDispatcher {
        let repository = Repository {
            owner: String::from("owner"),
            name: String::from("repo"),
        };
        let client =
            GitHubClient::new(Config::new(String::from("t0ken"), repository).with_api_url(&server.uri()))
                .unwrap();
        WorkflowDispatcher::new(client, "playwright-tests.yml")
    }

    #[test]
    fn omits_absent_api_endpoint() {
        let request = DispatchRequest::new("main", Browser::Chromium, false).with_api_endpoint(None);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "ref": "main", "inputs": { "browser": "chromium", "debug": "false" } })
        );

        let request = DispatchRequest::new("main", Browser::Webkit, true).with_api_endpoint(Some(""));
        assert!(!request.inputs().contains_key("api_endpoint"));
    }

    #[test]
    fn includes_given_api_endpoint() {
        let request = DispatchRequest::new("feature-x", Browser::Firefox, true)
            .with_api_endpoint(Some("https://api-staging.example.com"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "ref": "feature-x",
                "inputs": {
                    "browser": "firefox",
                    "debug": "true",
                    "api_endpoint": "https://api-staging.example.com",
                },
            })
        );
    }

    #[tokio::test]
    async fn posts_to_dispatch_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/repos/owner/repo/actions/workflows/playwright-tests.yml/dispatches",
            ))
            .and(body_json(json!({
                "ref": "feature-x",
                "inputs": { "browser": "firefox", "debug": "true" },
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        dispatcher(&server)
            .trigger(&DispatchRequest::new("feature-x", Browser::Firefox, true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_dispatch_is_a_dispatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let err = dispatcher(&server)
            .trigger(&DispatchRequest::new("gone", Browser::Chromium, false))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Dispatch { status, ref workflow }
                if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY && workflow == "playwright-tests.yml"
        ));
    }
}
