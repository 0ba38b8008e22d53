//! caching-proxy --port <number> --origin <url>

use clap::Parser;
use cproxy_config::{ConfigOverrides, ProxyConfig, DEFAULT_CONFIG_FILE};
use cproxy_core::Master;
use tracing::info;
use utils::init_tracing;

/// Caching forward proxy for a single origin.
#[derive(Debug, Parser)]
#[command(name = "caching-proxy", version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Origin base URL; request paths are appended to it
    #[arg(long)]
    origin: Option<String>,

    /// Optional TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Cache time-to-live in seconds
    #[arg(long)]
    ttl: Option<u64>,

    /// Share one origin fetch between concurrent misses on the same path
    #[arg(long)]
    coalesce: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            origin: self.origin.clone(),
            port: self.port,
            bind: self.bind.clone(),
            ttl_secs: self.ttl,
            coalesce_misses: self.coalesce.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = match ProxyConfig::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("⚠️  {e}");
            std::process::exit(2);
        }
    };
    cfg.apply_overrides(cli.overrides());

    let report = cfg.validate();
    if report.has_errors() {
        eprintln!("Usage: caching-proxy --port <number> --origin <url>");
        eprintln!("{}", report.format());
        std::process::exit(2);
    }
    if !report.warnings().is_empty() {
        eprintln!("⚠️  Config warnings:");
        eprintln!("{}", report.format());
    }

    init_tracing(cfg.log_level());
    cfg.print();

    info!(
        target: "cproxy::master",
        origin = %cfg.origin(),
        listen = %cfg.listen_addr(),
        "Configuration loaded"
    );

    Master::new(cfg).run().await
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn port_and_origin_become_overrides() {
        let cli = Cli::try_parse_from([
            "caching-proxy",
            "--port",
            "3000",
            "--origin",
            "http://dummyjson.com",
        ])
        .expect("expected ok");

        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(3000));
        assert_eq!(overrides.origin.as_deref(), Some("http://dummyjson.com"));
        assert_eq!(overrides.coalesce_misses, None);
        assert_eq!(cli.config, DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn coalesce_flag_enables_coalescing() {
        let cli = Cli::try_parse_from(["caching-proxy", "--coalesce", "--ttl", "10"])
            .expect("expected ok");
        let overrides = cli.overrides();
        assert_eq!(overrides.coalesce_misses, Some(true));
        assert_eq!(overrides.ttl_secs, Some(10));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        assert!(Cli::try_parse_from(["caching-proxy", "--port", "abc"]).is_err());
    }
}
