//! Subscriber setup for the `x3f-inspect` binary

use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
};

/// Installs a formatted subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Span close events, which carry step durations, are printed when
/// the filter enables debug output.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let verbose = ["debug", "trace"]
        .iter()
        .any(|level| env_filter.to_string().contains(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime())
        .with_span_events(if verbose { FmtSpan::CLOSE } else { FmtSpan::NONE });

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
