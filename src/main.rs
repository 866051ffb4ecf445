use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use globetrotter::{
    backend::{HttpQuizApi, QuizApi},
    config::AppConfig,
    state::AppState,
    sync::spawn_score_sync,
    ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "globetrotter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting city trivia...");

    let config = AppConfig::from_env();

    let api: Arc<dyn QuizApi> =
        match HttpQuizApi::new(config.api_base_url.clone(), config.request_timeout) {
            Ok(api) => {
                tracing::info!("Using trivia backend at {}", api.base_url());
                Arc::new(api)
            }
            Err(e) => {
                tracing::error!("Failed to create backend client: {}", e);
                std::process::exit(1);
            }
        };

    // Background task pushing score changes to the backend
    let (score_sync, _sync_task) = spawn_score_sync(api.clone());

    let bind_addr = config.bind_addr;
    let static_dir = config.static_dir.clone();
    let state = Arc::new(AppState::new(config, api, score_sync));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", bind_addr);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
