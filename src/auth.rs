use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

use crate::{controller, database::user, server::AppState};

pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_FLASH_KEY: &str = "flash";

pub const SIGN_IN_PATH: &str = "/users/sign_in";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("Invalid password hash: {0}")]
    InvalidHash(argon2::password_hash::Error),
}

/// Hash a password using Argon2id, returns a PHC string
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt).map_err(Error::Hash)?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC string, a mismatch is `Ok(false)`
pub fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash).map_err(Error::InvalidHash)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// One-shot messages shown by the next rendered page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub notice: Option<String>,
    pub alert: Option<String>,
}

pub async fn notice(session: &Session, message: impl Into<String>) -> Result<(), tower_sessions::session::Error> {
    let mut flash = session.get::<Flash>(SESSION_FLASH_KEY).await?.unwrap_or_default();
    flash.notice = Some(message.into());
    session.insert(SESSION_FLASH_KEY, flash).await
}

pub async fn alert(session: &Session, message: impl Into<String>) -> Result<(), tower_sessions::session::Error> {
    let mut flash = session.get::<Flash>(SESSION_FLASH_KEY).await?.unwrap_or_default();
    flash.alert = Some(message.into());
    session.insert(SESSION_FLASH_KEY, flash).await
}

pub async fn take_flash(session: &Session) -> Result<Flash, tower_sessions::session::Error> {
    Ok(session.remove::<Flash>(SESSION_FLASH_KEY).await?.unwrap_or_default())
}

/// Binds the session to the given user, rotating the session id
pub async fn sign_in(session: &Session, user: &user::Model) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, user.id).await
}

pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

pub async fn session_user_id(session: &Session) -> Result<Option<i64>, tower_sessions::session::Error> {
    session.get::<i64>(SESSION_USER_ID_KEY).await
}

async fn redirect_with_alert(session: &Session, to: &str, message: &str) -> Response {
    match alert(session, message).await {
        Ok(()) => Redirect::to(to).into_response(),
        Err(err) => controller::Error::from(err).into_response(),
    }
}

/// The signed in user, requests without one are sent to the sign in page
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let session = Session::from_request_parts(parts, state).await.map_err(IntoResponse::into_response)?;
        let user_id = session_user_id(&session).await.map_err(|err| controller::Error::from(err).into_response())?;

        let user = match user_id {
            Some(user_id) => {
                user::Entity::find_by_id(user_id)
                    .one(&state.conn)
                    .await
                    .map_err(|err| controller::Error::from(err).into_response())?
            }
            None => None,
        };

        let Some(user) = user else {
            if let Some(user_id) = user_id {
                warn!("Session bound to missing user {user_id}");
                session
                    .remove::<i64>(SESSION_USER_ID_KEY)
                    .await
                    .map_err(|err| controller::Error::from(err).into_response())?;
            }
            return Err(
                redirect_with_alert(&session, SIGN_IN_PATH, "You need to sign in or sign up before continuing.").await
            );
        };

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// A signed in admin, everybody else is sent back home
#[derive(Clone, Debug)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_admin() {
            return Ok(AdminUser(user));
        }

        warn!("User {} tried to reach {}", user.id, parts.uri.path());
        let session = Session::from_request_parts(parts, state).await.map_err(IntoResponse::into_response)?;
        Err(redirect_with_alert(&session, "/", "You don't have permission to access this page.").await)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::{database::user::Role, test_support};

    #[test]
    fn passwords() {
        let hash = super::hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(super::verify_password("password123", &hash).unwrap());
        assert!(!super::verify_password("password124", &hash).unwrap());
        assert!(super::verify_password("password123", "not a hash").is_err());
    }

    #[tokio::test]
    async fn anonymous_is_sent_to_sign_in() {
        let state = test_support::state().await;
        let mut client = test_support::Client::new(state).await;

        let res = client.request(Method::GET, "/", None).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/users/sign_in"));

        let res = client.request(Method::GET, "/users/sign_in", None).await;
        assert_eq!(res.status, StatusCode::OK);
        let page = res.json();
        assert_eq!(page["component"], "Login");
        assert_eq!(page["props"]["flash"]["alert"], "You need to sign in or sign up before continuing.");
        assert!(page["props"]["user"].is_null());
    }

    #[tokio::test]
    async fn deleted_user_session_is_dropped() {
        let state = test_support::state().await;
        let user = test_support::create_user(&state.conn, "gone@example.com", Role::User).await;
        let mut client = test_support::Client::new(state.clone()).await;
        client.sign_in("gone@example.com", test_support::PASSWORD).await;

        test_support::delete_user(&state.conn, user.id).await;

        let res = client.request(Method::GET, "/", None).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/users/sign_in"));
    }
}
