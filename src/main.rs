//! Runs Playwright tests via GitHub Actions.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use gh_test_runner::{
    client::GitHubClient,
    config::{Config, Repository},
    env,
    framework::RetryPolicy,
    git,
    runner::{CollectOptions, DEFAULT_KEYWORD, DEFAULT_WORKFLOW, Report, RunnerSettings, TestRunner},
    transactions::{Browser, DispatchRequest, PollConfig, PollOutcome, ResolveConfig},
    workflow::WorkflowRun,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const EXAMPLES: &str = "\
Examples:
  # Run tests on current branch and wait for results
  gh-test-runner --wait

  # Run tests in Firefox with debug mode
  gh-test-runner --browser firefox --debug --wait

  # Run tests against staging API
  gh-test-runner --api-endpoint https://api-staging.chroniclesync.xyz --wait

  # Run tests and download artifacts
  gh-test-runner --wait --download-artifacts";

#[derive(Debug, Parser)]
#[command(version, about = "Run Playwright tests via GitHub Actions", after_help = EXAMPLES)]
struct Cli {
    /// Browser to run tests in
    #[arg(long, value_enum, default_value_t = Browser::Chromium)]
    browser: Browser,

    /// API endpoint to test against
    #[arg(long)]
    api_endpoint: Option<String>,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Wait for test completion and show results
    #[arg(long)]
    wait: bool,

    /// Download test artifacts after completion
    #[arg(long, requires = "wait")]
    download_artifacts: bool,

    /// Directory artifacts are downloaded to
    #[arg(long, default_value = "test-results")]
    output_dir: PathBuf,

    /// Repository as owner/name [default: $GITHUB_REPOSITORY, then the origin remote]
    #[arg(long)]
    repo: Option<Repository>,

    /// Branch to test [default: the current branch]
    #[arg(long)]
    branch: Option<String>,

    /// Workflow file to dispatch
    #[arg(long, default_value = DEFAULT_WORKFLOW)]
    workflow: String,

    /// Keyword the name of the dispatched run contains
    #[arg(long, default_value = DEFAULT_KEYWORD)]
    keyword: String,

    /// Seconds between two status polls
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=3600))]
    interval: u64,

    /// Minutes to wait for completion, 0 to wait forever
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(0..=10_080))]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            println!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let token = env::github_token()?;
    let cwd = std::env::current_dir().context("failed to read the working directory")?;

    let repository = match cli.repo {
        Some(repository) => repository,
        None => match env::github_repository()? {
            Some(repository) => repository,
            None => git::origin_repository(&cwd).context("cannot tell the repository, pass --repo")?,
        },
    };
    let branch = match cli.branch {
        Some(branch) => branch,
        None => git::current_branch(&cwd)?,
    };

    let mut config = Config::new(token, repository);
    if let Some(api_url) = env::github_api_url() {
        config = config.with_api_url(&api_url);
    }
    if let Some(web_url) = env::github_server_url() {
        config = config.with_web_url(&web_url);
    }
    let client = GitHubClient::new(config)?;

    let settings = RunnerSettings {
        workflow: cli.workflow,
        keyword: cli.keyword,
        resolve: ResolveConfig {
            retry: RetryPolicy::new(Duration::from_secs(1)).with_max_attempts(env::max_retries()),
            ..ResolveConfig::default()
        },
        poll: PollConfig {
            interval: Duration::from_secs(cli.interval),
            timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout.saturating_mul(60))),
            max_polls: None,
        },
    };
    let runner = TestRunner::new(&client, &settings);

    println!("Running tests on branch: {branch}");
    let request = DispatchRequest::new(&branch, cli.browser, cli.debug)
        .with_api_endpoint(cli.api_endpoint.as_deref());
    let run_id = runner.start(&request).await?;
    println!("Tests triggered. Run ID: {run_id}");
    println!("View run at: {}", client.config().run_url(run_id));

    if !cli.wait {
        return Ok(0);
    }

    println!("Waiting for tests to complete...");
    let options = CollectOptions {
        output_dir: cli.download_artifacts.then_some(cli.output_dir),
    };
    let report = runner
        .finish(run_id, &options, |run| drop(print_tick(&mut io::stdout(), run)))
        .await?;

    print_report(&mut io::stdout().lock(), &report)?;
    Ok(report.exit_code())
}

/// Prints a dot for every poll that found the run unfinished.
fn print_tick(out: &mut impl Write, run: &WorkflowRun) -> io::Result<()> {
    if run.status.is_completed() {
        return Ok(());
    }
    write!(out, ".")?;
    out.flush()
}

fn print_report(out: &mut impl Write, report: &Report) -> io::Result<()> {
    match report.outcome {
        PollOutcome::Completed(conclusion) => {
            writeln!(out, "\nTests completed with status: {conclusion}")?;
        }
        _ => writeln!(out, "\nGave up waiting for run {}", report.run_id)?,
    }

    if !report.jobs.is_empty() {
        writeln!(out, "\nJob Results:")?;
    }
    for job in &report.jobs {
        writeln!(out, "\n{job}")?;
        match job.completed_at {
            Some(completed_at) => writeln!(out, "Duration: {} - {completed_at}", job.started_at)?,
            None => writeln!(out, "Duration: {} - …", job.started_at)?,
        }
        if let Some(detail_url) = &job.detail_url {
            writeln!(out, "Logs: {detail_url}")?;
        }
    }

    if let Some(downloaded) = &report.artifacts {
        writeln!(out)?;
        for artifact in downloaded {
            writeln!(out, "Downloaded {} to {}", artifact.name, artifact.path.display())?;
        }
        writeln!(out, "Downloaded {} artifacts", downloaded.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use gh_test_runner::{
        runner::Downloaded,
        workflow::{Conclusion, RunId},
    };
    use serde_json::json;

    use super::*;

    fn report(outcome: PollOutcome, artifacts: Option<Vec<Downloaded>>) -> Report {
        let job = serde_json::from_value(json!({
            "name": "test (firefox)",
            "conclusion": "success",
            "started_at": "2024-05-01T10:00:00Z",
            "completed_at": "2024-05-01T10:03:00Z",
            "html_url": "https://github.com/owner/repo/actions/runs/42/job/7",
        }))
        .unwrap();
        Report {
            run_id: RunId(42),
            outcome,
            jobs: vec![job],
            artifacts,
        }
    }

    fn render(report: &Report) -> String {
        let mut out = Vec::new();
        print_report(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_conclusion_and_each_job() {
        let output = render(&report(PollOutcome::Completed(Conclusion::Success), None));

        assert!(output.contains("Tests completed with status: success"));
        assert_eq!(output.matches("test (firefox): success").count(), 1);
        assert!(output.contains("Duration: 2024-05-01 10:00:00 UTC - 2024-05-01 10:03:00 UTC"));
        assert!(output.contains("Logs: https://github.com/owner/repo/actions/runs/42/job/7"));
        assert!(!output.contains("Downloaded"));
    }

    #[test]
    fn prints_a_line_per_downloaded_artifact() {
        let downloaded = vec![Downloaded {
            name: String::from("trace"),
            path: PathBuf::from("test-results/trace.zip"),
        }];
        let output = render(&report(
            PollOutcome::Completed(Conclusion::Failure),
            Some(downloaded),
        ));

        assert!(output.contains("Downloaded trace to test-results/trace.zip"));
        assert!(output.contains("Downloaded 1 artifacts"));
    }

    #[test]
    fn prints_time_out() {
        let report = Report {
            jobs: Vec::new(),
            ..report(PollOutcome::TimedOut, None)
        };
        let output = render(&report);

        assert!(output.contains("Gave up waiting for run 42"));
        assert!(!output.contains("Job Results"));
    }

    #[test]
    fn dots_only_for_unfinished_polls() {
        let mut out = Vec::new();
        for (status, conclusion) in [
            ("queued", None),
            ("in_progress", None),
            ("completed", Some("success")),
        ] {
            let run: WorkflowRun = serde_json::from_value(json!({
                "id": 42,
                "name": "Playwright Tests",
                "head_branch": "feature-x",
                "status": status,
                "conclusion": conclusion,
            }))
            .unwrap();
            print_tick(&mut out, &run).unwrap();
        }
        assert_eq!(out, b"..");
    }

    #[test]
    fn rejects_out_of_range_timing() {
        assert!(Cli::try_parse_from(["gh-test-runner", "--timeout", "18446744073709551615"]).is_err());
        assert!(Cli::try_parse_from(["gh-test-runner", "--interval", "0"]).is_err());

        let cli = Cli::try_parse_from(["gh-test-runner", "--timeout", "0"]).unwrap();
        assert_eq!(cli.timeout, 0);
        assert_eq!(cli.interval, 10);
    }
}
