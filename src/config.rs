use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::charts::ChartOptions;
use crate::enrichment::UnpaywallConfig;
use crate::error::ConfigError;

/// Command-line and environment configuration of the dashboard server.
#[derive(Debug, Clone, Parser)]
#[command(name = "oa-barometer")]
#[command(about = "Open Access barometer: enrich DOI lists with Unpaywall and chart the result")]
pub struct Config {
    #[arg(long, env = "OA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "OA_PORT", default_value_t = 8050)]
    pub port: u16,

    /// Path prefix the dashboard is served under.
    #[arg(long, env = "OA_BASE_PATH", default_value = "/")]
    pub base_path: String,

    #[arg(long, env = "UNPAYWALL_URL", default_value = "https://api.unpaywall.org/v2")]
    pub unpaywall_url: String,

    /// Contact email sent with every Unpaywall request.
    #[arg(long, env = "UNPAYWALL_EMAIL")]
    pub unpaywall_email: String,

    /// Maximum concurrent Unpaywall lookups.
    #[arg(long, default_value_t = 5)]
    pub concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    /// Idle time in seconds after which a session is discarded.
    #[arg(long, default_value_t = 3600)]
    pub session_ttl: u64,

    #[arg(long, default_value_t = 10)]
    pub top_publishers: usize,

    #[arg(long, default_value = "publisher")]
    pub publisher_field: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_positive("concurrency", self.concurrency as u64)?;
        validate_positive("request-timeout", self.request_timeout)?;
        validate_positive("session-ttl", self.session_ttl)?;

        if !self.unpaywall_email.contains('@') {
            return Err(invalid("unpaywall-email", &self.unpaywall_email, "must be an email address"));
        }
        if !self.base_path.starts_with('/') {
            return Err(invalid("base-path", &self.base_path, "must start with '/'"));
        }
        match reqwest::Url::parse(&self.unpaywall_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(invalid(
                    "unpaywall-url",
                    &self.unpaywall_url,
                    &format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
            Err(e) => return Err(invalid("unpaywall-url", &self.unpaywall_url, &e.to_string())),
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid("host", &self.host, &e.to_string()))
    }

    /// Base path without a trailing slash; `/` becomes the empty string.
    pub fn mount_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }

    pub fn unpaywall(&self) -> UnpaywallConfig {
        UnpaywallConfig {
            base_url: self.unpaywall_url.clone(),
            email: self.unpaywall_email.clone(),
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.request_timeout),
        }
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            publisher_field: self.publisher_field.clone(),
            top_publishers: self.top_publishers,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

fn validate_positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field, &value.to_string(), "must be at least 1"));
    }
    Ok(())
}

fn invalid(field: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
