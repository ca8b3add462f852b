use axum_helpers::server::{RouterOptions, create_production_app, create_router, root_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

const ROOT_MESSAGE: &str = "VectorDB semantic search API is running";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables; lists every missing one
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment, config.log_level.as_deref());

    // Fail fast when Milvus is unreachable
    let state = AppState::connect(config).await?;

    let options = RouterOptions::new("/api/v1")
        .with_request_timeout(state.config.server.request_timeout)
        .with_cors_allowed_origin(state.config.cors_allowed_origin.clone());

    let router = create_router::<openapi::ApiDoc>(api::routes(&state), options).await?;
    let app = router
        .merge(root_router(ROOT_MESSAGE, state.config.app))
        .merge(api::readiness_router(state.clone()));

    info!(
        collection = %state.service.collection(),
        metric = %state.service.metric(),
        "Starting VectorDB API"
    );

    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, Duration::from_secs(30), async move {
        state.close().await;
        info!("Milvus client closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("VectorDB API shutdown complete");
    Ok(())
}
