//! Diagnostic logging.
//!
//! Stdout carries the generated script, so all log output goes to stderr.
//! The level comes from `ANSIBLECONNECT_LOG` (an `EnvFilter` directive such
//! as `debug` or `ansibleconnect::inventory=trace`) and otherwise defaults to
//! `warn`, or `debug` with `--verbose`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ANSIBLECONNECT_LOG";

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
