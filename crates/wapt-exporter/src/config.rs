//! Command-line flags and the immutable exporter configuration.
//!
//! Flag names follow the usual Prometheus exporter conventions
//! (`--web.listen-address`, `--web.telemetry-path`). Every flag can also be
//! set from the environment.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;

use wapt_inventory::InventoryConfig;
use wapt_inventory::config::DEFAULT_ENDPOINT;

#[derive(Parser, Debug)]
#[command(
    name = "wapt-exporter",
    about = "Prometheus exporter for the WAPT deployment server",
    version
)]
pub struct Cli {
    /// Address to listen on for scrapes (`:port` binds every interface).
    #[arg(long = "web.listen-address", env = "WAPT_EXPORTER_LISTEN_ADDRESS", default_value = ":9976")]
    pub listen_address: String,

    /// Path under which to expose metrics.
    #[arg(
        long = "web.telemetry-path",
        alias = "web.endpoint",
        env = "WAPT_EXPORTER_TELEMETRY_PATH",
        default_value = "/metrics"
    )]
    pub telemetry_path: String,

    /// WAPT server API endpoint.
    #[arg(long = "wapt.api", env = "WAPT_API", default_value = DEFAULT_ENDPOINT)]
    pub wapt_api: String,

    /// WAPT API username.
    #[arg(long = "wapt.user", env = "WAPT_USER", default_value = "user")]
    pub wapt_user: String,

    /// WAPT API password.
    #[arg(long = "wapt.password", env = "WAPT_PASSWORD", default_value = "user", hide_env_values = true)]
    pub wapt_password: String,

    /// Per-request timeout in seconds for WAPT API calls.
    #[arg(long = "wapt.timeout", env = "WAPT_TIMEOUT")]
    pub wapt_timeout: Option<u64>,

    /// Log level for the exporter crates when RUST_LOG is not set (e.g. "debug").
    #[arg(long = "log.level", default_value = "info")]
    pub log_level: String,
}

/// Settings fixed at startup and shared read-only by every scrape.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub listen_address: SocketAddr,
    pub telemetry_path: String,
    pub inventory: InventoryConfig,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<ExporterConfig> {
        let listen_address = parse_listen_address(&self.listen_address)?;

        if !self.telemetry_path.starts_with('/') {
            bail!("telemetry path {:?} must start with '/'", self.telemetry_path);
        }

        let mut inventory = InventoryConfig::new(self.wapt_api, self.wapt_user, self.wapt_password);
        if let Some(secs) = self.wapt_timeout {
            inventory = inventory.with_timeout(Duration::from_secs(secs));
        }

        Ok(ExporterConfig {
            listen_address,
            telemetry_path: self.telemetry_path,
            inventory,
        })
    }
}

/// `EnvFilter` directives applying `level` to the exporter's own crates only.
pub fn log_directives(level: &str) -> String {
    ["wapt_exporter", "wapt_inventory", "wapt_metrics"]
        .map(|target| format!("{target}={level}"))
        .join(",")
}

/// Parse `host:port`, or `:port` for every IPv4 interface.
pub fn parse_listen_address(s: &str) -> anyhow::Result<SocketAddr> {
    if let Some(port) = s.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid port in listen address {s:?}"))?;
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }
    s.parse()
        .with_context(|| format!("invalid listen address {s:?}"))
}
