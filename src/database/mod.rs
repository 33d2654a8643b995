use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub mod location;
pub mod migrate;
pub mod schema_migration;
pub mod seed;
pub mod user;

pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url);
    options.connect_timeout(Duration::from_secs(30)).sqlx_logging(false);
    // every connection to an in-memory sqlite is a brand new database
    if url.contains(":memory:") {
        options.max_connections(1).min_connections(1).idle_timeout(Duration::from_secs(3600));
    }
    Database::connect(options).await
}
