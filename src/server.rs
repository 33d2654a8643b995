use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr};
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore,
};
use tower_sessions_sqlx_store::{MySqlStore, SqliteStore};
use tracing::{error, info};

use crate::{
    config::Config,
    controller::{dashboard, health, home, locations, registrations, sessions},
    database::{self, migrate},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Session store error: {0}")]
    SessionStore(#[from] sea_orm::sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported database backend: {0:?}")]
    UnsupportedBackend(DbBackend),
}

const SESSION_CLEANUP_PERIOD: std::time::Duration = std::time::Duration::from_secs(60);

pub struct AppState {
    pub conn: DatabaseConnection,
    pub config: Config,
}

/// Router with sessions stored next to the application data
pub async fn app(state: Arc<AppState>) -> Result<Router, Error> {
    let app = match state.conn.get_database_backend() {
        DbBackend::Sqlite => {
            let store = SqliteStore::new(state.conn.get_sqlite_connection_pool().clone());
            store.migrate().await?;
            tokio::spawn(delete_expired_sessions(store.clone()));
            router(state, store)
        }
        DbBackend::MySql => {
            let store = MySqlStore::new(state.conn.get_mysql_connection_pool().clone());
            store.migrate().await?;
            tokio::spawn(delete_expired_sessions(store.clone()));
            router(state, store)
        }
        backend => return Err(Error::UnsupportedBackend(backend)),
    };
    Ok(app)
}

async fn delete_expired_sessions<S: ExpiredDeletion>(store: S) {
    if let Err(err) = store.continuously_delete_expired(SESSION_CLEANUP_PERIOD).await {
        error!("Expired session cleanup stopped: {err}");
    }
}

pub fn router<S: SessionStore + Clone>(state: Arc<AppState>, store: S) -> Router {
    let session_layer = SessionManagerLayer::new(store)
        .with_secure(state.config.session.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(state.config.session.inactivity_days)));

    Router::new()
        .route("/", get(home::index))
        .route("/locations", post(locations::create))
        .route("/locations/{id}", delete(locations::destroy))
        .route("/dashboard", get(dashboard::index))
        .route("/dashboard/locations", delete(dashboard::destroy_all_locations))
        .route("/dashboard/locations/{id}", delete(dashboard::destroy_location))
        .route("/dashboard/users", delete(dashboard::destroy_all_users))
        .route("/dashboard/users/{id}", delete(dashboard::destroy_user))
        .route("/users", post(registrations::create))
        .route("/users/sign_up", get(registrations::new))
        .route("/users/sign_in", get(sessions::new).post(sessions::create))
        .route("/users/sign_out", delete(sessions::destroy))
        .route("/up", get(health::show))
        .nest_service("/assets", ServeDir::new(&state.config.assets.dir))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connects, migrates and serves until a shutdown signal arrives
pub async fn serve(config: Config) -> Result<(), Error> {
    info!("Connecting to database...");
    let conn = database::connect(&config.database_url).await?;
    migrate::run(&conn).await?;

    let state = Arc::new(AppState { conn, config });
    let app = app(state.clone()).await?;

    let listener = TcpListener::bind(state.config.bind).await?;
    info!("Server running on {}", state.config.bind);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
