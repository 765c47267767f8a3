use miette::Diagnostic;
use thiserror::Error;

pub(crate) type CliResult<T, E = CliError> = core::result::Result<T, E>;

const GENERAL_HELP: &str = r#"
- Check that the local stack is up and the API container is reachable.

- Run with RUST_LOG=debug to see what stackmate is doing under the hood.
"#;

/// Errors that abort a stackmate command before it gets to do any work.
///
/// Failures the commands tolerate (unreadable env file, refused connection,
/// non-200 response) are reported on the console instead and never surface
/// here.
#[derive(Debug, Error, Diagnostic)]
pub(crate) enum CliError {
    #[error("Failed to build the HTTP client: {0}")]
    #[diagnostic(help("{GENERAL_HELP}"))]
    ClientBuild(reqwest::Error),

    #[error("Failed to initialize the tracing subscriber: {0}")]
    #[diagnostic(help("{GENERAL_HELP}"))]
    TracingInit(#[from] tracing_subscriber::util::TryInitError),
}
