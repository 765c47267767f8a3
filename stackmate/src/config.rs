use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

/// Configuration keys the env commands recognize, mapped to the values the
/// patcher writes for them. Everything else in the file is left untouched.
pub(super) const TRACKED_KEYS: [(&str, &str); 4] = [
    ("SANCTUM_STATEFUL_DOMAINS", "192.168.1.105:3003"),
    ("SESSION_DOMAIN", "192.168.1.105"),
    ("APP_URL", "http://192.168.1.105:8002"),
    ("DB_HOST", "172.25.0.2"),
];

pub(super) const DEFAULT_ENV_FILE: &str = ".env";

pub(super) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8002/api";

/// Where a failing response body is saved for later inspection.
pub(super) const DEFAULT_DUMP_FILE: &str = "last_error.html";

pub(super) const DEFAULT_LOGIN_EMAIL: &str = "mobiletest@test.com";
pub(super) const DEFAULT_LOGIN_PASSWORD: &str = "password";

// The smoke test simulates the mobile client hitting the API from another
// machine on the LAN, so every request carries a mobile user agent and the
// client app's origin.
pub(super) const SMOKE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; Mobile)";
pub(super) const SMOKE_ORIGIN: &str = "http://192.168.1.105:3003";
pub(super) const SMOKE_REFERER: &str = "http://192.168.1.105:3003/";

pub(super) const SMOKE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The login response may carry a full token payload; only this many
/// characters of the body are echoed to the console.
pub(super) const BODY_ECHO_LIMIT: usize = 500;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub(super) struct Cli {
    #[command(subcommand)]
    pub(super) commands: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Print the tracked keys currently set in the env file.
    #[command(name = "env-show")]
    EnvShow(EnvFileArgs),

    /// Rewrite the tracked keys in the env file, appending any that are
    /// missing.
    #[command(name = "env-patch")]
    EnvPatch(EnvFileArgs),

    /// Run the sequential API smoke test: connectivity, database health,
    /// vendor login. A failing check skips the ones after it.
    Smoke(SmokeArgs),
}

#[derive(Args, Debug)]
pub(super) struct EnvFileArgs {
    /// Path of the env file to operate on.
    #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub(super) struct SmokeArgs {
    /// Base URL of the API under test, including the `/api` prefix.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Email sent to the vendor login endpoint.
    #[arg(long, default_value = DEFAULT_LOGIN_EMAIL)]
    pub email: String,

    /// Password sent to the vendor login endpoint.
    #[arg(long, default_value = DEFAULT_LOGIN_PASSWORD)]
    pub password: String,

    /// File that receives the raw body of a failing response.
    #[arg(long, default_value = DEFAULT_DUMP_FILE)]
    pub dump_file: PathBuf,
}
