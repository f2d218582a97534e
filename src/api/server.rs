use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{auth, crop, pricing};
use crate::config::Config;
use crate::db::repo::Database;
use crate::db::store::{JsonFileStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            db: Database::new(store),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Krishi Mitr API is running!" }))
        .route("/health", get(|| async { "OK" }))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/crop/add", post(crop::add))
        .route("/api/crop/all", get(crop::all))
        // Older browser script still calls /list
        .route("/api/crop/list", get(crop::all))
        .route("/api/crop/barter/{crop_name}", get(crop::barter))
        .route("/api/crop/resell/{crop_name}", get(crop::resell))
        .route("/api/pricing", get(pricing::all).post(pricing::update))
        .route("/api/pricing/{crop_name}", get(pricing::by_crop))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(config: &Config) -> Result<()> {
    let store = JsonFileStore::new(&config.database);
    info!("Using database file {:?}", store.path());

    let state = Arc::new(AppState::new(Arc::new(store)));
    let app = build_router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;

    info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
