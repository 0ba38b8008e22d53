use serde::Deserialize;

use crate::error::ConfigError;
use crate::validation::{validate, ConfigReport};

/// Config file looked up when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "caching-proxy.toml";

/// Environment variables with this prefix override file values
/// (e.g. `CACHE_PROXY_TTL_SECS=60`).
pub const ENV_PREFIX: &str = "CACHE_PROXY";

/// Cache time-to-live used when neither file, env nor CLI sets one.
pub const DEFAULT_TTL_SECS: u64 = 300;

// =======================================================
// PROXY CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Origin base URL. Request paths are appended verbatim.
    pub origin: String,
    pub port: u16,
    pub bind: String,

    // Cache
    pub ttl_secs: u64,
    /// Share one origin fetch between concurrent misses on the same path.
    pub coalesce_misses: bool,
    /// On HIT answer with the stored origin status instead of a flat 200.
    pub replay_origin_status: bool,

    // Origin (seconds, 0 = no timeout)
    pub origin_timeout_secs: u64,

    // Limits
    pub max_connections: usize,

    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            port: 0,
            bind: "0.0.0.0".into(),
            ttl_secs: DEFAULT_TTL_SECS,
            coalesce_misses: false,
            replay_origin_status: true,
            origin_timeout_secs: 30,
            max_connections: 1024,
            log_level: "info".into(),
        }
    }
}

/// Values given on the command line. `None` keeps the file/env value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub origin: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub ttl_secs: Option<u64>,
    pub coalesce_misses: Option<bool>,
}

impl ProxyConfig {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// `bind:port`, bracketing IPv6 binds.
    pub fn listen_addr(&self) -> String {
        if self.bind.contains(':') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Returns the config back if it has no validation errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let report = self.validate();
        if report.has_errors() {
            return Err(ConfigError::Invalid(report.format()));
        }
        Ok(self)
    }

    /// Loads `file_name` (optional, TOML) and then `CACHE_PROXY_*` env vars.
    pub fn from_file(file_name: &str) -> Result<Self, ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|source| ConfigError::Load {
                file: file_name.to_string(),
                source,
            })?;

        let mut cfg: ProxyConfig =
            built
                .try_deserialize()
                .map_err(|source| ConfigError::Load {
                    file: file_name.to_string(),
                    source,
                })?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(origin) = overrides.origin {
            self.origin = origin;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(ttl_secs) = overrides.ttl_secs {
            self.ttl_secs = ttl_secs;
        }
        if let Some(coalesce) = overrides.coalesce_misses {
            self.coalesce_misses = coalesce;
        }
    }

    // ttl_secs and origin_timeout_secs keep 0 on purpose: both are meaningful.
    fn apply_defaults(&mut self) {
        let defaults = ProxyConfig::default();

        if self.bind.trim().is_empty() {
            self.bind = defaults.bind;
        }
        if self.max_connections == 0 {
            self.max_connections = defaults.max_connections;
        }
        if self.log_level.trim().is_empty() {
            self.log_level = defaults.log_level;
        }
    }

    pub fn print(&self) {
        println!("============ CACHING PROXY CONFIG ============");
        println!("  origin               = {}", self.origin);
        println!("  listen               = {}", self.listen_addr());
        println!("  ttl_secs             = {}", self.ttl_secs);
        println!("  coalesce_misses      = {}", self.coalesce_misses);
        println!("  replay_origin_status = {}", self.replay_origin_status);
        println!("  origin_timeout_secs  = {}", self.origin_timeout_secs);
        println!("  max_connections      = {}", self.max_connections);
        println!("  log_level            = {}", self.log_level);
        println!("==============================================");
    }
}
