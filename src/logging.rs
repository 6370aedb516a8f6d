//! Tracing subscriber setup for the CLI
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

const DEFAULT_LEVEL: &str = "info";

fn env_filter() -> EnvFilter {
  let base = env::var("RUST_LOG").map_or_else(|_| EnvFilter::new(DEFAULT_LEVEL), EnvFilter::new);
  // sqlx logs every statement at info; 400 inserts per commit is noise
  base.add_directive(
    "sqlx::query=warn"
      .parse()
      .unwrap_or_else(|_| tracing::Level::WARN.into()),
  )
}

/// Install the global subscriber. Returns an error if one is already set.
pub fn init(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  let registry = tracing_subscriber::registry().with(env_filter());

  match format {
    LogFormat::Json => {
      let layer = fmt::layer().json().with_target(true).with_writer(io::stderr);
      registry.with(layer).try_init()?;
    }
    LogFormat::Pretty => {
      let layer = fmt::layer().pretty().with_target(true).with_writer(io::stderr);
      registry.with(layer).try_init()?;
    }
    LogFormat::Compact => {
      let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(io::stderr);
      registry.with(layer).try_init()?;
    }
  }

  info!(log.format = ?format, version = env!("CARGO_PKG_VERSION"), "annual-plan starting");
  Ok(())
}
