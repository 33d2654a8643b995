use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use tracing::error;

use crate::server::AppState;

pub async fn show(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.conn.ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            error!("Health check failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
