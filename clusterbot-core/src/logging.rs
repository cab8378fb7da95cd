//! Tracing subscriber setup
//!
//! Logs always go to stderr: in offline mode stdout carries the report and
//! nothing else.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::error::{ClusterbotError, ClusterbotResult};

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) -> ClusterbotResult<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(format!("clusterbot={level},clusterbot_core={level}")),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        ClusterbotError::ConfigError(format!("Failed to install log subscriber: {}", e))
    })
}
