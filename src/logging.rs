//! Structured logging setup: JSON output for production, pretty output for
//! development, filtering via `RUST_LOG`.

use anyhow::Result;
use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub environment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production = environment == "production" || environment == "prod";
        Self {
            format: if is_production {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            environment,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(format) = env::var("BIDVENTOR_LOG_FORMAT") {
            match format.to_ascii_lowercase().as_str() {
                "json" => config.format = LogFormat::Json,
                "pretty" => config.format = LogFormat::Pretty,
                _ => {}
            }
        }
        config
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(false))
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
        }
    }
    tracing::debug!(environment = %config.environment, "logging initialized");
    Ok(())
}
