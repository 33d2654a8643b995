//! Inertia page protocol: JSON page objects for client visits, an HTML shell otherwise

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;

use crate::{
    auth::{self, CurrentUser},
    controller::Error,
    database::user::UserInfo,
    server::AppState,
};

pub const HEADER: &str = "x-inertia";
pub const VERSION_HEADER: &str = "x-inertia-version";
pub const LOCATION_HEADER: &str = "x-inertia-location";

#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub component: &'a str,
    pub props: Value,
    pub url: String,
    pub version: Option<String>,
}

/// Request side of a page render, extract it after [`CurrentUser`] so the user is shared
pub struct Inertia {
    session: Session,
    user: Option<UserInfo>,
    xhr: bool,
    url: String,
    version: Option<String>,
    entry: String,
}

impl FromRequestParts<Arc<AppState>> for Inertia {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await.map_err(IntoResponse::into_response)?;
        let xhr = parts.headers.get(HEADER).is_some_and(|value| value == "true");
        let url = parts.uri.path_and_query().map_or_else(|| String::from("/"), |pq| pq.as_str().to_owned());
        let version = state.config.assets.version.clone();

        // stale client bundle, make it reload the whole page
        if xhr && parts.method == Method::GET {
            if let Some(version) = &version {
                let client = parts.headers.get(VERSION_HEADER).and_then(|value| value.to_str().ok());
                if client != Some(version.as_str()) {
                    return Err((StatusCode::CONFLICT, [(LOCATION_HEADER, url)]).into_response());
                }
            }
        }

        Ok(Inertia {
            session,
            user: parts.extensions.get::<CurrentUser>().map(|CurrentUser(user)| UserInfo::from(user)),
            xhr,
            url,
            version,
            entry: state.config.assets.entry.clone(),
        })
    }
}

impl Inertia {
    /// Overrides the url the client shows for the rendered page
    pub fn at(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub async fn render(self, component: &str, props: Value) -> Result<Response, Error> {
        self.render_with_status(StatusCode::OK, component, props).await
    }

    pub async fn render_with_status(self, status: StatusCode, component: &str, props: Value) -> Result<Response, Error> {
        let flash = auth::take_flash(&self.session).await?;

        let mut props = match props {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert(String::from("data"), other);
                map
            }
        };
        props.entry("user").or_insert(serde_json::to_value(&self.user)?);
        props.entry("flash").or_insert(serde_json::to_value(&flash)?);

        let page = Page { component, props: Value::Object(props), url: self.url, version: self.version };

        let mut res = if self.xhr {
            let mut res = (status, Json(&page)).into_response();
            res.headers_mut().insert(HEADER, HeaderValue::from_static("true"));
            res
        } else {
            let page = serde_json::to_string(&page)?;
            (status, Html(shell(&page, &self.entry))).into_response()
        };
        res.headers_mut().insert(header::VARY, HeaderValue::from_static("X-Inertia"));

        Ok(res)
    }
}

fn shell(page: &str, entry: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width,initial-scale=1">
    <title>Locshare</title>
    <script type="module" src="{entry}"></script>
  </head>
  <body>
    <div id="app" data-page="{page}"></div>
  </body>
</html>
"#,
        entry = escape(entry),
        page = escape(page),
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
