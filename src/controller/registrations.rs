use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response, Json};
use sea_orm::ActiveModelTrait;
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::info;

use super::Error;

use crate::{auth, database::user::Registration, inertia::Inertia, server::AppState};

const SIGN_UP_PATH: &str = "/users/sign_up";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    user: Registration,
}

pub async fn new(inertia: Inertia, session: Session) -> Result<Response, Error> {
    if auth::session_user_id(&session).await?.is_some() {
        return super::redirect_with_alert(&session, "/", "You are already signed in.").await;
    }
    inertia.render("Register", json!({})).await
}

pub async fn create(
    inertia: Inertia,
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignUpForm>,
) -> Result<Response, Error> {
    let registration = form.user;

    let errors = registration.validate(&state.conn).await?;
    if !errors.is_empty() {
        return inertia
            .at(SIGN_UP_PATH)
            .render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Register",
                json!({ "errors": errors, "email": registration.email, "name": registration.name }),
            )
            .await;
    }

    let encrypted_password = auth::hash_password(&registration.password)?;
    let user = registration.into_active_model(encrypted_password).insert(&state.conn).await?;
    info!("User {} signed up", user.id);

    auth::sign_in(&session, &user).await?;
    super::redirect_with_notice(&session, "/", "Welcome! You have signed up successfully.").await
}
