//! Fragments API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use fragments_api::error::AppError;
use fragments_api::state::AppState;
use fragments_core::clock::SystemClock;
use fragments_engine::application::repository::InMemorySessionRepository;
use fragments_engine::domain::scenario::Scenario;
use fragments_oracle::{GenerativeOracle, OracleConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

async fn load_scenario() -> Result<Scenario, AppError> {
    let Ok(path) = std::env::var("SCENARIO_PATH") else {
        let scenario = Scenario::default();
        tracing::info!(
            title = %scenario.title,
            tracks = ?scenario.vitals.track_names(),
            "SCENARIO_PATH not set, using built-in scenario"
        );
        return Ok(scenario);
    };
    let source = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| AppError::Scenario(format!("cannot read {path}: {e}")))?;
    let scenario = Scenario::from_yaml(&source).map_err(|e| AppError::Scenario(e.to_string()))?;
    tracing::info!(
        path = %path,
        title = %scenario.title,
        tracks = ?scenario.vitals.track_names(),
        "loaded scenario"
    );
    Ok(scenario)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Fragments API server");

    // Read configuration from environment.
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
    let oracle_config = OracleConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    let scenario = load_scenario().await?;
    let oracle =
        GenerativeOracle::new(oracle_config).map_err(|e| AppError::Config(e.to_string()))?;
    tracing::info!(
        model = %oracle.config().model,
        base_url = %oracle.config().base_url,
        timeout = ?oracle.config().timeout,
        "oracle configured"
    );

    // Build application state.
    let app_state = AppState::new(
        Arc::new(scenario),
        Arc::new(SystemClock),
        Arc::new(oracle),
        Arc::new(InMemorySessionRepository::new()),
    );

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = fragments_api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
