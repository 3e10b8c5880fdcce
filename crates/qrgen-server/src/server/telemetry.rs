//! Log output wiring.
//!
//! Installs the process-wide `tracing` subscriber exactly once, before any
//! component is constructed. The filter is seeded from the configured level
//! but a `RUST_LOG` directive takes precedence, so operators can raise
//! verbosity per-module without redeploying.

use crate::server::config::{LogFormat, ServerConfig};
use anyhow::Context;
use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid LOG_LEVEL filter: {}", config.log_level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Dev => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_file(true)
                    .pretty(),
            )
            .try_init()
            .context("failed to install tracing subscriber")?,
        LogFormat::Prod => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .json(),
            )
            .try_init()
            .context("failed to install tracing subscriber")?,
    }

    Ok(())
}
