use std::sync::Arc;

use anyhow::Context;

use jobboard_api::app::{build_app, services::build_services};
use jobboard_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jobboard_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let services = build_services(&config)
        .await
        .context("failed to initialise services")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
