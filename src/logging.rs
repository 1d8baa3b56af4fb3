//! Logging configuration for psql-lite.
//!
//! Logs always go to stderr. The default level is quiet enough that a normal
//! run writes nothing there besides a failure diagnostic.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn";

/// Filter used with `--verbose` when `RUST_LOG` is not set.
const VERBOSE_FILTER: &str = "psql_lite=debug,warn";

/// Returns the filter directive to fall back on.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence over the `verbose` switch.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}
