use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, warn};

use super::Error;

use crate::{
    auth::{self, SIGN_IN_PATH},
    database::user,
    inertia::Inertia,
    server::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    user: Credentials,
}

pub async fn new(inertia: Inertia, session: Session) -> Result<Response, Error> {
    if auth::session_user_id(&session).await?.is_some() {
        return super::redirect_with_alert(&session, "/", "You are already signed in.").await;
    }
    inertia.render("Login", json!({})).await
}

pub async fn create(
    inertia: Inertia,
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignInForm>,
) -> Result<Response, Error> {
    let Credentials { email, password } = form.user;

    if let Some(user) = user::Entity::find_by_email(&state.conn, &email).await? {
        if auth::verify_password(&password, &user.encrypted_password)? {
            auth::sign_in(&session, &user).await?;
            info!("User {} signed in", user.id);
            return super::redirect_with_notice(&session, "/", "Signed in successfully.").await;
        }
    }

    warn!("Failed sign in for {email:?}");
    auth::alert(&session, "Invalid Email or password.").await?;
    inertia
        .at(SIGN_IN_PATH)
        .render_with_status(StatusCode::UNPROCESSABLE_ENTITY, "Login", json!({ "email": email }))
        .await
}

pub async fn destroy(session: Session) -> Result<Response, Error> {
    if let Some(user_id) = auth::session_user_id(&session).await? {
        info!("User {user_id} signed out");
    }
    auth::sign_out(&session).await?;
    auth::notice(&session, "Signed out successfully.").await?;
    Ok(Redirect::to(SIGN_IN_PATH).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{database::user::Role, test_support};

    #[tokio::test]
    async fn sign_in_and_out() {
        let state = test_support::state().await;
        test_support::create_user(&state.conn, "paul@example.com", Role::User).await;
        let mut client = test_support::Client::new(state).await;

        let res = client
            .request(
                Method::POST,
                "/users/sign_in",
                Some(json!({ "user": { "email": " Paul@Example.com", "password": test_support::PASSWORD } })),
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/"));

        let res = client.request(Method::GET, "/", None).await;
        assert_eq!(res.status, StatusCode::OK);

        let res = client.request(Method::GET, "/users/sign_in", None).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/"));

        let res = client.request(Method::DELETE, "/users/sign_out", None).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/users/sign_in"));

        let page = client.request(Method::GET, "/users/sign_in", None).await.json();
        assert_eq!(page["props"]["flash"]["notice"], "Signed out successfully.");

        let res = client.request(Method::GET, "/", None).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/users/sign_in"));
    }

    #[tokio::test]
    async fn wrong_password() {
        let state = test_support::state().await;
        test_support::create_user(&state.conn, "paul@example.com", Role::User).await;
        let mut client = test_support::Client::new(state).await;

        for email in ["paul@example.com", "nobody@example.com"] {
            let res = client
                .request(Method::POST, "/users/sign_in", Some(json!({ "user": { "email": email, "password": "nope" } })))
                .await;
            assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
            let page = res.json();
            assert_eq!(page["component"], "Login");
            assert_eq!(page["url"], "/users/sign_in");
            assert_eq!(page["props"]["email"], email);
            assert_eq!(page["props"]["flash"]["alert"], "Invalid Email or password.");
        }

        let res = client.request(Method::GET, "/", None).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
    }
}
