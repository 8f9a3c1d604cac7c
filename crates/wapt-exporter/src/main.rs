//! wapt-exporter: exposes WAPT server inventory gauges for Prometheus.
//!
//! # Usage
//!
//! ```text
//! wapt-exporter --wapt.api http://127.0.0.1:8080 --wapt.user admin --wapt.password ...
//! ```

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wapt_exporter::{Cli, log_directives};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log.level.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_directives(&cli.log_level))
            .with_context(|| format!("invalid log level {:?}", cli.log_level))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.into_config()?;
    wapt_exporter::run(config).await
}
