use tracing_subscriber::{prelude::*, EnvFilter};

use crate::CliResult;

/// Log lines go to stderr so they never mix into the output the commands
/// print on stdout.
pub(crate) fn init_tracing_registry() -> CliResult<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()?;

    Ok(())
}
