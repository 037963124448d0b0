//! Flight Risk Prediction Server
//!
//! Serves pre-trained flight delay classifiers over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PREDICTION SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  API      │  │  Feature      │  │  Evaluation Engine  │ │
//! │  │  (Axum)   │─▶│  Encoder      │─▶│  (chunked CSV)      │ │
//! │  └─────┬─────┘  └───────┬───────┘  └──────────┬──────────┘ │
//! │        └────────────────┼─────────────────────┘            │
//! │                         ▼                                   │
//! │        ┌──────────────────────────────────┐                │
//! │        │ Registry: manifest, mappings,    │                │
//! │        │ classifiers (loaded once)        │                │
//! │        └──────────────────────────────────┘                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod evaluation;
mod features;
mod handlers;
mod models;
mod registry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
    services::ServeDir,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flight_risk_server=debug,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Prediction server starting...");
    tracing::info!("Manifest: {}", config.manifest_path.display());

    // Registry load is fatal on any error
    let registry = registry::Registry::load(&config.manifest_path)
        .with_context(|| format!("Failed to load registry from {}", config.manifest_path.display()))?;
    tracing::info!(
        "Registry ready: {} models, default '{}'",
        registry.models().len(),
        registry.default_model()
    );

    // Build application state
    let state = AppState {
        registry: Arc::new(registry),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Fully built before the server starts; read-only afterwards
    pub registry: Arc<registry::Registry>,
    pub config: config::Config,
}

/// Uploads are streamed, so the cap only applies when configured
fn upload_limit(config: &config::Config) -> DefaultBodyLimit {
    match config.max_upload_bytes() {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/models", get(handlers::catalog::list_models))
        .route("/api/mappings", get(handlers::catalog::mappings))
        .route("/api/predict-single", post(handlers::predict::predict_single))
        .route(
            "/api/evaluate-models",
            post(handlers::evaluate::evaluate_models).layer(upload_limit(&state.config)),
        );

    // Static UI when deployed alongside, otherwise a JSON landing page
    let frontend_dir = state.config.frontend_dir.clone();
    let app = if frontend_dir.is_dir() {
        tracing::info!("Serving frontend from {}", frontend_dir.display());
        api_routes.fallback_service(ServeDir::new(frontend_dir))
    } else {
        tracing::warn!("Frontend directory {} not found", frontend_dir.display());
        api_routes.route("/", get(handlers::catalog::root))
    };

    app.layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
