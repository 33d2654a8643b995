use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde_json::json;

use super::Error;

use crate::{auth::CurrentUser, inertia::Inertia, server::AppState};

pub async fn index(
    CurrentUser(_user): CurrentUser,
    inertia: Inertia,
    State(state): State<Arc<AppState>>,
) -> Result<Response, Error> {
    let locations = super::listed_locations(&state.conn).await?;
    inertia.render("LocationList", json!({ "locations": locations })).await
}
