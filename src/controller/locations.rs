use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tower_sessions::Session;
use tracing::{debug, info};

use super::Error;

use crate::{auth::CurrentUser, database::location, inertia::Inertia, server::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    location: Option<Map<String, Value>>,
}

pub async fn create(
    CurrentUser(user): CurrentUser,
    inertia: Inertia,
    State(state): State<Arc<AppState>>,
    Json(form): Json<LocationForm>,
) -> Result<Response, Error> {
    // unknown keys are dropped, but only an absent or empty object counts as missing
    let Some(fields) = form.location.filter(|fields| !fields.is_empty()) else {
        return Err(Error::ParameterMissing("location"));
    };
    let params = serde_json::from_value::<location::LocationParams>(Value::Object(fields))
        .map_err(|_| Error::InvalidParameter("location"))?;

    let inertia = inertia.at("/");
    match params.into_active_model(user.id) {
        Ok(am) => {
            let location = am.insert(&state.conn).await?;
            info!("User {} saved location {} \"{}\"", user.id, location.id, location.name);
            let locations = super::listed_locations(&state.conn).await?;
            inertia
                .render("LocationList", json!({ "success": "Location saved successfully!", "locations": locations }))
                .await
        }
        Err(errors) => {
            debug!("User {} submitted an invalid location: {errors:?}", user.id);
            let locations = super::listed_locations(&state.conn).await?;
            inertia
                .render_with_status(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "LocationList",
                    json!({ "errors": errors, "locations": locations }),
                )
                .await
        }
    }
}

pub async fn destroy(
    CurrentUser(user): CurrentUser,
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, Error> {
    let location = location::Entity::find_by_id(id).one(&state.conn).await?.ok_or(Error::NotFound)?;

    if location.user_id != Some(user.id) && !user.is_admin() {
        return super::redirect_with_alert(&session, "/", "You don't have permission to delete this location.").await;
    }

    let name = location.name.clone();
    location.delete(&state.conn).await?;
    info!("User {} deleted location {id} \"{name}\"", user.id);

    super::redirect_with_notice(&session, "/", format!("Location '{name}' successfully deleted")).await
}
