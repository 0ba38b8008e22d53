mod error;
mod proxy;
mod validation;

pub use error::ConfigError;
pub use proxy::{ConfigOverrides, ProxyConfig, DEFAULT_CONFIG_FILE, DEFAULT_TTL_SECS, ENV_PREFIX};
pub use validation::{validate, ConfigReport};
