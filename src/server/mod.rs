//! Read-only JSON API plus the manual rescan trigger
//!
//! | Route               | Handler            |
//! |---------------------|--------------------|
//! | `GET /api/status`   | [`routes::status`] |
//! | `GET /api/stocks`   | [`routes::stocks`] |
//! | `GET /api/prices`   | [`routes::prices`] |
//! | `GET /api/stock/:t` | [`routes::stock`]  |
//! | `GET`, `POST` `/api/rescan` | [`routes::rescan`] |
//!
//! `/` and `/index.html` serve the configured front-end page when one is set.

pub mod routes;

use crate::scheduler::ScanCoordinator;
use axum::{routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ScanCoordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<ScanCoordinator>) -> Self {
        Self { coordinator }
    }
}

pub fn router(state: AppState, index_file: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let mut app = Router::new()
        .route("/api/status", get(routes::status))
        .route("/api/stocks", get(routes::stocks))
        .route("/api/prices", get(routes::prices))
        .route("/api/stock/:ticker", get(routes::stock))
        .route("/api/rescan", get(routes::rescan).post(routes::rescan));

    if let Some(index) = index_file {
        app = app
            .route_service("/", ServeFile::new(&index))
            .route_service("/index.html", ServeFile::new(&index));
    }

    app.fallback(routes::not_found).layer(cors).with_state(state)
}

/// Serve `app` until Ctrl+C
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🌐 API listening on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("⚠️  Received Ctrl+C, shutting down..."),
        Err(e) => {
            tracing::warn!("⚠️  Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
