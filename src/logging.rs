//! Logging initialization for hosts embedding the pipeline.

use crate::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing output. `RUST_LOG` overrides the configured level.
///
/// Call at most once per process; hosts with their own subscriber should
/// skip this entirely.
pub fn init_logging(settings: &Settings) {
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            format!("tett={}", settings.general.log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
