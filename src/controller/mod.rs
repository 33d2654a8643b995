use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use tower_sessions::Session;
use tracing::error;

use crate::{
    auth,
    database::{location, user},
};

pub mod dashboard;
pub mod health;
pub mod home;
pub mod locations;
pub mod registrations;
pub mod sessions;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Password error: {0}")]
    Password(#[from] auth::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not found")]
    NotFound,
    #[error("param is missing or the value is empty: {0}")]
    ParameterMissing(&'static str),
    #[error("param is invalid: {0}")]
    InvalidParameter(&'static str),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::ParameterMissing(_) | Error::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Error::Database(_) | Error::Session(_) | Error::Password(_) | Error::Json(_) => {
                error!("{self}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
            }
        };

        (status, self.to_string()).into_response()
    }
}

pub async fn redirect_with_notice(session: &Session, to: &str, message: impl Into<String>) -> Result<Response, Error> {
    auth::notice(session, message).await?;
    Ok(Redirect::to(to).into_response())
}

pub async fn redirect_with_alert(session: &Session, to: &str, message: impl Into<String>) -> Result<Response, Error> {
    auth::alert(session, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// A location as listed on the map
#[derive(Debug, Serialize)]
pub struct ListedLocation {
    #[serde(flatten)]
    pub location: location::Model,
    pub user_name: Option<String>,
}

impl From<(location::Model, Option<user::Model>)> for ListedLocation {
    fn from((location, user): (location::Model, Option<user::Model>)) -> Self {
        ListedLocation { location, user_name: user.and_then(|user| user.name) }
    }
}

pub async fn listed_locations<C: sea_orm::ConnectionTrait>(conn: &C) -> Result<Vec<ListedLocation>, DbErr> {
    Ok(location::Entity::all_with_user(conn).await?.into_iter().map(ListedLocation::from).collect())
}
