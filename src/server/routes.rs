//! HTTP handlers
//!
//! Every handler reads through one `SharedState` call, so each response is
//! built from a single lock-consistent view.

use super::AppState;
use crate::scheduler::RescanOutcome;
use crate::state::{PricesView, StatusView, StocksView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RescanResponse {
    pub ok: bool,
    pub msg: &'static str,
}

/// Scheduler status and scan progress
pub async fn status(State(app): State<AppState>) -> Json<StatusView> {
    let now = app.coordinator.clock().now();
    Json(app.coordinator.state().status_view(now))
}

/// Full snapshot collection
pub async fn stocks(State(app): State<AppState>) -> Json<StocksView> {
    Json(app.coordinator.state().stocks_view())
}

/// Price and change only, for cheap polling
pub async fn prices(State(app): State<AppState>) -> Json<PricesView> {
    Json(app.coordinator.state().prices_view())
}

/// One snapshot by ticker, case-insensitive
pub async fn stock(State(app): State<AppState>, Path(ticker): Path<String>) -> Response {
    match app.coordinator.state().find(&ticker) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: "Not found" }),
        )
            .into_response(),
    }
}

/// Kick off a detached full scan unless one is running
pub async fn rescan(State(app): State<AppState>) -> Json<RescanResponse> {
    let response = match app.coordinator.try_start_rescan() {
        RescanOutcome::Started => RescanResponse {
            ok: true,
            msg: "Full rescan started",
        },
        RescanOutcome::AlreadyRunning => RescanResponse {
            ok: false,
            msg: "Scan already running",
        },
    };
    Json(response)
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
