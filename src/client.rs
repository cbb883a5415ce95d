//! Authenticated access to GitHub REST API.
//!
//! [`GitHubClient`] issues single requests and reports every failure as a [`TransportError`].
//! It never retries; the transactions built on top decide whether and how to repeat.

use std::sync::Arc;

use futures::Stream;
use reqwest::{Method, RequestBuilder, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::bytes::Bytes;
use tracing::{debug, error};

use crate::{config::Config, error::TransportError};

const USER_AGENT: &str = concat!("gh-test-runner/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// A client of GitHub REST API bound to one repository.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl GitHubClient {
    /// Creates a [`GitHubClient`] from a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the underlying HTTP client fails to initialize.
    pub fn new(config: Config) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// The configuration this client was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the url of an endpoint below `/repos/{owner}/{repo}/`.
    pub fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_url,
            self.config.repository,
            path.trim_start_matches('/')
        )
    }

    /// Builds a request for GitHub REST API.
    fn request_builder(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(&self.config.token)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(|source| {
            error!("failed to reach {url}: {source}");
            TransportError::Network {
                url: url.to_owned(),
                source,
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            match status.canonical_reason() {
                Some(reason) => error!("{url} responded with {} {reason}", status.as_u16()),
                None => error!("{url} responded with {}", status.as_u16()),
            }
            Err(TransportError::Status {
                url: url.to_owned(),
                status,
            })
        }
    }

    /// Sends a GET request and parses the json response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails, the status is not successful, or the body is not the expected json.
    pub async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        debug!("requesting {url}…");
        let response = self
            .send(self.request_builder(Method::GET, url).query(query), url)
            .await?;

        response.json::<T>().await.map_err(|source| {
            error!("failed to parse data from {url}: {source}");
            TransportError::Decode {
                url: url.to_owned(),
                source,
            }
        })
    }

    /// Sends a POST request with a json body, discarding the response body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails or the status is not successful.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<(), TransportError>
    where
        B: Serialize + ?Sized,
    {
        debug!("posting to {url}…");
        self.send(self.request_builder(Method::POST, url).json(body), url)
            .await
            .map(drop)
    }

    /// Requests a binary download and returns its body as a stream.
    ///
    /// Redirects to the storage backend are followed.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails or the status is not successful.
    pub async fn download(
        &self,
        url: &str,
    ) -> Result<impl Stream<Item = Result<Bytes, reqwest::Error>> + use<>, TransportError> {
        debug!("requesting download from {url}…");
        let response = self
            .send(self.request_builder(Method::GET, url), url)
            .await?;
        Ok(response.bytes_stream())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;
    use crate::config::Repository;

    fn client(server: &MockServer) -> GitHubClient {
        let repository = Repository {
            owner: String::from("owner"),
            name: String::from("repo"),
        };
        GitHubClient::new(Config::new(String::from("t0ken"), repository).with_api_url(&server.uri()))
            .unwrap()
    }

    #[derive(Debug, serde::Deserialize)]
    struct Pong {
        pong: bool,
    }

    #[test]
    fn builds_repo_urls() {
        let repository = Repository {
            owner: String::from("owner"),
            name: String::from("repo"),
        };
        let client = GitHubClient::new(Config::new(String::new(), repository)).unwrap();
        assert_eq!(
            client.repo_url("/actions/runs"),
            "https://api.github.com/repos/owner/repo/actions/runs"
        );
    }

    #[tokio::test]
    async fn sends_auth_and_version_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/repo/ping"))
            .and(query_param("per_page", "1"))
            .and(header("authorization", "Bearer t0ken"))
            .and(header("accept", "application/vnd.github+json"))
            .and(header("x-github-api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "pong": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let pong: Pong = client
            .get_json(&client.repo_url("ping"), &[("per_page", "1")])
            .await
            .unwrap();
        assert!(pong.pong);
    }

    #[tokio::test]
    async fn reports_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .get_json::<Pong>(&client.repo_url("ping"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn reports_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .get_json::<Pong>(&client.repo_url("ping"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[tokio::test]
    async fn posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/dispatch"))
            .and(body_json(serde_json::json!({ "ref": "main" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client
            .post_json(&client.repo_url("dispatch"), &serde_json::json!({ "ref": "main" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn network_failures_are_transport_errors() {
        let repository = Repository {
            owner: String::from("owner"),
            name: String::from("repo"),
        };
        let config = Config::new(String::from("t0ken"), repository).with_api_url("http://127.0.0.1:9");
        let client = GitHubClient::new(config).unwrap();
        let url = client.repo_url("ping");

        let err = client.get_json::<Pong>(&url, &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
    }
}
