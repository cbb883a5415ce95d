use tracing::info;

use crate::{
    client::GitHubClient,
    error::Result,
    workflow::{
        RunId,
        job::{Job, Jobs},
    },
};

/// Fetches per-job results of a run.
#[derive(Debug, Clone)]
pub struct JobReporter {
    client: GitHubClient,
}

impl JobReporter {
    /// Creates a [`JobReporter`].
    pub const fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Lists the jobs of a run, in the order GitHub reports them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::error::Error::Transport) if fetching fails. Nothing is retried.
    pub async fn list_jobs(&self, run_id: RunId) -> Result<Vec<Job>> {
        let url = self.client.repo_url(&format!("actions/runs/{run_id}/jobs"));
        let jobs: Jobs = self.client.get_json(&url, &[]).await?;

        match jobs.jobs.len() {
            1 => info!("fetched 1 job of run {run_id}"),
            count => info!("fetched {count} jobs of run {run_id}"),
        }
        Ok(jobs.jobs)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::{
        config::{Config, Repository},
        error::Error,
        workflow::Conclusion,
    };

    fn reporter(server: &MockServer) -> JobReporter {
        let repository = Repository {
            owner: String::from("owner"),
            name: String::from("repo"),
        };
        JobReporter::new(
            GitHubClient::new(Config::new(String::from("t0ken"), repository).with_api_url(&server.uri()))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn keeps_backend_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/repo/actions/runs/42/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 2,
                "jobs": [
                    {
                        "name": "test (firefox)",
                        "conclusion": "failure",
                        "started_at": "2024-05-01T10:00:00Z",
                        "completed_at": "2024-05-01T10:04:30Z",
                        "html_url": "https://github.com/owner/repo/actions/runs/42/job/1",
                    },
                    {
                        "name": "report",
                        "conclusion": null,
                        "started_at": "2024-05-01T10:05:00Z",
                        "completed_at": null,
                        "html_url": "https://github.com/owner/repo/actions/runs/42/job/2",
                    },
                ],
            })))
            .mount(&server)
            .await;

        let jobs = reporter(&server).list_jobs(RunId(42)).await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "test (firefox)");
        assert_eq!(jobs[0].conclusion, Some(Conclusion::Failure));
        assert_eq!(
            jobs[0].detail_url.as_deref(),
            Some("https://github.com/owner/repo/actions/runs/42/job/1")
        );
        let duration = jobs[0].completed_at.unwrap() - jobs[0].started_at;
        assert_eq!(duration.num_seconds(), 270);
        assert_eq!(jobs[0].to_string(), "test (firefox): failure");
        assert_eq!(jobs[1].completed_at, None);
        assert_eq!(jobs[1].to_string(), "report: pending");
    }

    #[tokio::test]
    async fn propagates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = reporter(&server).list_jobs(RunId(42)).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
