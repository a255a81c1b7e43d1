//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with("info", false);
}

/// Initialize tracing with a fallback level and output format.
///
/// Events go to stderr so command output on stdout stays clean.
/// `RUST_LOG` still wins over `default_level` when it is set. With `json`
/// enabled every event is emitted as one JSON object per line.
pub fn init_tracing_with(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // A second init (tests, embedding hosts) keeps the first subscriber.
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        tracing::debug!("tracing already initialized: {err}");
    }
}
