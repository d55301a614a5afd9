use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable overriding the configured log filter
pub const LOG_ENV: &str = "HASHCALC_LOG";

/// Install the global subscriber, logging to stderr
///
/// `HASHCALC_LOG` wins over `default_level` when set. Calling this twice is
/// harmless; the second subscriber is ignored.
pub fn init(default_level: &str) {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .try_init();
}
