//! Logging bootstrap shared by the library consumers and the CLI.

use crate::error::{Result, SnapshotError};
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber with the given filter directive.
///
/// Returns an error if the directive does not parse or if a subscriber has
/// already been installed.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| SnapshotError::InvalidArgument(format!("Invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| SnapshotError::InvalidArgument("Logging already initialized".into()))
}
