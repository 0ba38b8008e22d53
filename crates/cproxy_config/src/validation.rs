use std::net::IpAddr;

use http::Uri;
use tokio::sync::Semaphore;

use crate::ProxyConfig;

/// Problems found in a [`ProxyConfig`]. Errors stop startup, warnings don't.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Errors first, then warnings, one `  - ` line each.
    pub fn format(&self) -> String {
        let sections = [("Errors", &self.errors), ("Warnings", &self.warnings)];
        sections
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(title, items)| {
                let lines: String = items.iter().map(|item| format!("  - {item}\n")).collect();
                format!("{title}:\n{lines}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a proxy configuration and return a report of issues.
pub fn validate(cfg: &ProxyConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_origin(cfg, &mut report);
    validate_listen(cfg, &mut report);
    validate_cache(cfg, &mut report);

    report
}

fn validate_origin(cfg: &ProxyConfig, report: &mut ConfigReport) {
    let origin = cfg.origin.trim();
    if origin.is_empty() {
        report.error("origin is required (--origin <url>)");
        return;
    }

    let uri = match origin.parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            report.error(format!("origin '{origin}' is not a valid URL: {e}"));
            return;
        }
    };

    match uri.scheme_str() {
        Some("http") => {}
        Some("https") => {
            report.error(format!(
                "origin '{origin}' uses https; only plain http origins are supported"
            ));
        }
        Some(other) => {
            report.error(format!("origin '{origin}' has unsupported scheme '{other}'"));
        }
        None => {
            report.error(format!(
                "origin '{origin}' has no scheme; expected something like http://host:port"
            ));
        }
    }

    if uri.authority().is_none() {
        report.error(format!("origin '{origin}' has no host"));
    }

    if uri.query().is_some() {
        report.error(format!(
            "origin '{origin}' contains a query string; request paths are appended to it"
        ));
    }

    if origin.ends_with('/') {
        report.warn(format!(
            "origin '{origin}' ends with '/'; paths are appended verbatim (e.g. '//foo')"
        ));
    }

    if cfg.origin_timeout_secs == 0 {
        report.warn("origin_timeout_secs is 0; a hung origin hangs its request forever");
    }
}

fn validate_listen(cfg: &ProxyConfig, report: &mut ConfigReport) {
    if cfg.port == 0 {
        report.error("port is required (--port <number>)");
    }

    if cfg.bind.parse::<IpAddr>().is_err() {
        report.error(format!("bind '{}' is not a valid IP address", cfg.bind));
    }

    if cfg.max_connections > Semaphore::MAX_PERMITS {
        report.error(format!(
            "max_connections {} is above the limit of {}",
            cfg.max_connections,
            Semaphore::MAX_PERMITS
        ));
    }
}

fn validate_cache(cfg: &ProxyConfig, report: &mut ConfigReport) {
    if cfg.ttl_secs == 0 {
        report.warn("ttl_secs is 0; cached entries expire immediately");
    }

    if !cfg.replay_origin_status {
        report.warn("replay_origin_status is false; every HIT answers 200");
    }
}
