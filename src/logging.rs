//! Ambient `tracing` setup, mirroring the reference engine's logging
//! bootstrap: an `EnvFilter` built from a level string, timestamps and
//! thread ids on.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ExecError, Result};

/// Initializes the global `tracing` subscriber with `level` (e.g. `"info"`,
/// `"scalarband=debug"`). Fails if a subscriber is already installed, or if
/// `level` isn't a valid filter directive.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| ExecError::Config(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| ExecError::Config("logging already initialized".into()))
}
