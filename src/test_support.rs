use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, EntityTrait};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    auth,
    config::Config,
    database::{
        self, location, migrate,
        user::{self, Role},
    },
    inertia,
    server::{self, AppState},
};

pub const PASSWORD: &str = "password123";

pub async fn state() -> Arc<AppState> {
    tracing_subscriber::fmt::try_init().ok();
    let conn = database::connect("sqlite::memory:").await.unwrap();
    migrate::run(&conn).await.unwrap();
    Arc::new(AppState { conn, config: Config::with_database("sqlite::memory:") })
}

// hashing is slow on purpose, do it once
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| auth::hash_password(PASSWORD).unwrap()).clone()
}

/// Creates a user named after the local part of the email, with [`PASSWORD`] as password
pub async fn create_user(conn: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    let name = email.split_once('@').map_or(email, |(local, _)| local);
    user::ActiveModel {
        email: ActiveValue::Set(email.to_owned()),
        encrypted_password: ActiveValue::Set(password_hash()),
        name: ActiveValue::Set(Some(name.to_owned())),
        role: ActiveValue::Set(role),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn delete_user(conn: &DatabaseConnection, id: i64) {
    user::Entity::delete_by_id(id).exec(conn).await.unwrap();
}

pub async fn create_location(
    conn: &DatabaseConnection,
    user_id: Option<i64>,
    name: &str,
    latitude: Decimal,
    longitude: Decimal,
) -> location::Model {
    location::ActiveModel {
        name: ActiveValue::Set(name.to_owned()),
        latitude: ActiveValue::Set(latitude),
        longitude: ActiveValue::Set(longitude),
        user_id: ActiveValue::Set(user_id),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|value| value.to_str().ok())
    }
}

/// Drives the router like a browser would, keeping the session cookie between requests
pub struct Client {
    app: Router,
    cookie: Option<String>,
    pub inertia: bool,
    pub version: Option<String>,
}

impl Client {
    pub async fn new(state: Arc<AppState>) -> Self {
        Client { app: server::app(state).await.unwrap(), cookie: None, inertia: true, version: None }
    }

    /// Swaps in a freshly built router, keeping the cookie
    pub async fn restart(&mut self, state: Arc<AppState>) {
        self.app = server::app(state).await.unwrap();
    }

    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if self.inertia {
            builder = builder.header(inertia::HEADER, "true");
        }
        if let Some(version) = &self.version {
            builder = builder.header(inertia::VERSION_HEADER, version.as_str());
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.as_str());
        }
        let req = match body {
            Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let res = self.app.clone().oneshot(req).await.unwrap();

        for value in res.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap_or_default().trim().to_owned();
            if value.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair);
            }
        }

        let status = res.status();
        let headers = res.headers().clone();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, headers, body }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) {
        let res = self
            .request(Method::POST, "/users/sign_in", Some(json!({ "user": { "email": email, "password": password } })))
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "sign in as {email} failed");
    }
}
