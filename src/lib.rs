pub mod aggregate;
pub mod classify;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod policy;
pub mod reader;
pub mod report;
pub mod server;
pub mod utils;

pub use config::{CliArgs, EngineSettings, PolicySettings, ServerConfig, SheetPolicy};
pub use error::EngineError;
pub use logging::{LoggingConfig, init_logging};
pub use model::RunArtifacts;
pub use pipeline::optimize;

use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    config.ensure_upload_root()?;
    let config = Arc::new(config);

    tracing::info!(
        bind = %config.http_bind_address,
        upload_root = %config.upload_root.display(),
        sheet_policy = %config.sheet_policy,
        "starting bidventor server",
    );

    let router = server::router(config.clone());
    let listener = TcpListener::bind(config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .map_err(anyhow::Error::from)
}
