//! Logging setup using tracing + tracing-subscriber.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! overrides the level chosen from the flags.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default filter for a verbosity count (`-v`, `-vv`).
pub fn default_directive(verbose: u8, debug_env: bool) -> &'static str {
    match (verbose, debug_env) {
        (0, false) => "warn",
        (0, true) | (1, _) => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber.
pub fn init_logging(verbose: u8, debug_env: bool, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, debug_env)));

    let layer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise logging: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0, false), "warn");
        assert_eq!(default_directive(0, true), "debug");
        assert_eq!(default_directive(1, false), "debug");
        assert_eq!(default_directive(3, false), "trace");
    }
}
