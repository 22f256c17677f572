//! Logging initialization for CLI and hook processes.
//!
//! Logs are structured JSON on stderr. Stdout stays untouched: hook
//! subprocesses reply to the agent with a single JSON object on stdout,
//! and any stray line there would corrupt the protocol.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `quiet` drops the default level to `warn` (hooks and non-verbose CLI
/// runs); the `ENTIRE_LOG` environment variable overrides it either way.
/// Calling this more than once is a no-op.
pub fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_env("ENTIRE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(true);
        init_logging(false);
    }
}
