use std::path::{Path, PathBuf};

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT},
    Client, RequestBuilder, StatusCode,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::{self, SmokeArgs},
    progress::{Progress, ProgressTracker},
    CliError, CliResult,
};

/// Body marker the health endpoint returns when it can reach the database.
const DB_MARKER: &str = "Database connection established";

/// A completed HTTP exchange. Error statuses (4xx/5xx) land here too; only
/// transport-level failures (DNS, refused connection, timeout) do not.
#[derive(Debug)]
pub(crate) struct ProbeResponse {
    pub(crate) status: StatusCode,
    pub(crate) body: String,
}

#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// What a smoke run probes. Defaults come from [`config`]; tests substitute
/// their own server address and dump path.
#[derive(Debug, Clone)]
pub(crate) struct SmokeTarget {
    pub(crate) base_url: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) dump_path: PathBuf,
}

impl From<SmokeArgs> for SmokeTarget {
    fn from(args: SmokeArgs) -> Self {
        SmokeTarget {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            email: args.email,
            password: args.password,
            dump_path: args.dump_file,
        }
    }
}

/// The dependent checks of the smoke test, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Check {
    Connectivity,
    Database,
    Login,
}

impl Check {
    pub(crate) const SEQUENCE: [Check; 3] = [Check::Connectivity, Check::Database, Check::Login];

    fn name(self) -> &'static str {
        match self {
            Check::Connectivity => "connectivity",
            Check::Database => "database health",
            Check::Login => "vendor login",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Check::Connectivity => "/ping",
            Check::Database => "/health",
            Check::Login => "/vendor/login",
        }
    }

    /// Decides whether a response satisfies this check.
    fn verdict(self, response: &ProbeResponse) -> Result<(), String> {
        if response.status != StatusCode::OK {
            return Err(format!("unexpected status {}", response.status));
        }

        match self {
            Check::Connectivity => Ok(()),
            Check::Database if response.body.contains(DB_MARKER) => Ok(()),
            Check::Database => Err("response did not confirm the database connection".into()),
            Check::Login if response.body.contains("token") => Ok(()),
            Check::Login => Err("no token in the response body".into()),
        }
    }

    /// Whether a failing response body of this check gets saved to the dump
    /// file. The login response may carry credentials, so it is only echoed
    /// truncated, never dumped.
    fn dumps_error_body(self) -> bool {
        matches!(self, Check::Connectivity | Check::Database)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CheckOutcome {
    Passed,
    Failed(String),
    /// Not attempted because an earlier check failed.
    Skipped,
}

#[derive(Debug)]
pub(crate) struct SmokeSummary {
    outcomes: Vec<(Check, CheckOutcome)>,
}

impl SmokeSummary {
    pub(crate) fn passed(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| *outcome == CheckOutcome::Passed)
    }

    pub(crate) fn outcome_of(&self, check: Check) -> Option<&CheckOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == check)
            .map(|(_, outcome)| outcome)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(config::SMOKE_USER_AGENT));
    headers.insert(ORIGIN, HeaderValue::from_static(config::SMOKE_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(config::SMOKE_REFERER));
    headers
}

/// Client carrying the fixed mobile-simulation header set and the request
/// timeout.
pub(crate) fn build_client() -> CliResult<Client> {
    Client::builder()
        .default_headers(default_headers())
        .timeout(config::SMOKE_REQUEST_TIMEOUT)
        .build()
        .map_err(CliError::ClientBuild)
}

/// Shared request helper: sends the request and collects status + body.
/// Transport-level failures surface as `Err`; any HTTP response is `Ok`.
async fn send_probe(request: RequestBuilder) -> Result<ProbeResponse, reqwest::Error> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!(%status, body_bytes = body.len(), "probe completed");

    Ok(ProbeResponse { status, body })
}

async fn execute(
    check: Check,
    client: &Client,
    target: &SmokeTarget,
) -> Result<ProbeResponse, reqwest::Error> {
    let url = format!("{}{}", target.base_url, check.path());
    debug!(%url, check = check.name(), "probing");

    match check {
        Check::Connectivity | Check::Database => send_probe(client.get(url)).await,
        Check::Login => {
            let payload = LoginRequest {
                email: &target.email,
                password: &target.password,
            };
            send_probe(client.post(url).json(&payload)).await
        }
    }
}

fn dump_error_body<P: Progress>(path: &Path, body: &str, progress: &P) {
    match std::fs::write(path, body) {
        Ok(()) => progress.warning(&format!("saved the error body to {}", path.display())),
        Err(error) => progress.warning(&format!(
            "failed to save the error body to {}: {error}",
            path.display()
        )),
    }
}

fn truncated(body: &str, limit: usize) -> &str {
    match body.char_indices().nth(limit) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

/// Runs the checks in order, short-circuiting: the first failure marks every
/// later check as skipped.
pub(crate) async fn run_checks<P>(client: &Client, target: &SmokeTarget, progress: &P) -> SmokeSummary
where
    P: Progress,
{
    let mut outcomes = Vec::with_capacity(Check::SEQUENCE.len());
    let mut blocked = false;

    for check in Check::SEQUENCE {
        if blocked {
            progress.print(&format!("skipping {}: a previous check failed", check.name()));
            outcomes.push((check, CheckOutcome::Skipped));
            continue;
        }

        let mut subtask = progress.subtask(&format!("checking {}", check.name()));

        let outcome = match execute(check, client, target).await {
            Err(error) => {
                subtask.failure(Some(&format!("{} request failed: {error}", check.name())));
                CheckOutcome::Failed(error.to_string())
            }
            Ok(response) => {
                subtask.print(&format!("status: {}", response.status));
                if check == Check::Login {
                    subtask.print(&format!(
                        "body: {}",
                        truncated(&response.body, config::BODY_ECHO_LIMIT)
                    ));
                }

                match check.verdict(&response) {
                    Ok(()) => {
                        subtask.success(Some(&format!("{} check passed", check.name())));
                        CheckOutcome::Passed
                    }
                    Err(reason) => {
                        if check.dumps_error_body() && response.status != StatusCode::OK {
                            dump_error_body(&target.dump_path, &response.body, &subtask);
                        }
                        subtask.failure(Some(&format!("{} check failed: {reason}", check.name())));
                        CheckOutcome::Failed(reason)
                    }
                }
            }
        };

        blocked = outcome != CheckOutcome::Passed;
        outcomes.push((check, outcome));
    }

    SmokeSummary { outcomes }
}

/// `stackmate smoke`: probe the local API the way the mobile client would.
pub(crate) async fn smoke_command(args: SmokeArgs) -> CliResult<()> {
    let mut progress = ProgressTracker::from_env("stackmate smoke test");
    let client = build_client()?;
    let target = SmokeTarget::from(args);

    let summary = run_checks(&client, &target, &progress).await;

    if summary.passed() {
        progress.success(Some("all smoke checks passed"));
    } else {
        progress.failure(Some("smoke test failed, see the checks above"));
    }

    Ok(())
}
