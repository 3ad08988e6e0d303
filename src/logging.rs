// tracing_subscriber init: plain timestamped lines to stderr, level
// controlled by `RUST_LOG` (defaulting to `info`). No TUI, no buffering -
// every component is expected to log its own transitions.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
