//! Logger bootstrap for the `boundary` binary.

use tracing_subscriber::{EnvFilter, prelude::*};

use crate::CliError;

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// Records are written to stderr so that `export` output on stdout stays
/// valid JSON. `log` records from the library crates reach the subscriber
/// through the `tracing-log` bridge installed by `try_init`.
pub fn init_logging() -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()?;
    Ok(())
}
