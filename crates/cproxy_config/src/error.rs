use thiserror::Error;

/// Startup configuration failures. Never reaches the request path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config '{file}': {source}")]
    Load {
        file: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("invalid configuration\n{0}")]
    Invalid(String),
}
