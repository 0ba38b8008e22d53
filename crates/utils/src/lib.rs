use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when neither `RUST_LOG` nor a configured level applies.
pub const DEFAULT_FILTER: &str = "info,cproxy=debug";

/// Builds the filter: `RUST_LOG` wins, then `level` (if non-empty), then
/// [`DEFAULT_FILTER`].
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let fallback = if level.trim().is_empty() {
            DEFAULT_FILTER
        } else {
            level
        };
        EnvFilter::try_new(fallback).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}

pub fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false),
        )
        .init();
}
