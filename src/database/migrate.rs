use std::collections::HashSet;

use sea_orm::{
    sea_query::Index, ActiveModelTrait, ActiveValue, ConnectionTrait, DbBackend, DbErr, EntityTrait, Schema, Statement,
};
use tracing::{debug, info};

use super::{location, schema_migration, user};

pub struct Migration {
    pub version: &'static str,
    pub name: &'static str,
    up: fn(&Schema, DbBackend) -> Vec<Statement>,
}

/// Ordered by version, never reorder or edit an entry once released
pub const MIGRATIONS: &[Migration] = &[
    Migration { version: "20250405120000", name: "create_users", up: create_users },
    Migration { version: "20250406155753", name: "create_locations", up: create_locations },
    Migration { version: "20250406160512", name: "add_user_index_to_locations", up: add_user_index_to_locations },
];

fn create_users(schema: &Schema, backend: DbBackend) -> Vec<Statement> {
    vec![backend.build(&schema.create_table_from_entity(user::Entity))]
}

fn create_locations(schema: &Schema, backend: DbBackend) -> Vec<Statement> {
    vec![backend.build(&schema.create_table_from_entity(location::Entity))]
}

fn add_user_index_to_locations(_schema: &Schema, backend: DbBackend) -> Vec<Statement> {
    let index = Index::create()
        .name("index_locations_on_user_id")
        .table(location::Entity)
        .col(location::Column::UserId)
        .to_owned();
    vec![backend.build(&index)]
}

async fn applied_versions<C: ConnectionTrait>(conn: &C) -> Result<HashSet<String>, DbErr> {
    let backend = conn.get_database_backend();
    let mut table = Schema::new(backend).create_table_from_entity(schema_migration::Entity);
    table.if_not_exists();
    conn.execute(backend.build(&table)).await?;

    Ok(schema_migration::Entity::find().all(conn).await?.into_iter().map(|model| model.version).collect())
}

/// Applies pending migrations, returns the applied versions
pub async fn run<C: ConnectionTrait>(conn: &C) -> Result<Vec<&'static str>, DbErr> {
    let applied = applied_versions(conn).await?;
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut done = Vec::new();
    for migration in MIGRATIONS.iter().filter(|migration| !applied.contains(migration.version)) {
        info!("Migrating {} {}", migration.version, migration.name);
        for statement in (migration.up)(&schema, backend) {
            debug!("{statement}");
            conn.execute(statement).await?;
        }
        schema_migration::ActiveModel {
            version: ActiveValue::Set(migration.version.to_owned()),
            name: ActiveValue::Set(migration.name.to_owned()),
            applied_at: ActiveValue::Set(chrono::Utc::now()),
        }
        .insert(conn)
        .await?;
        done.push(migration.version);
    }

    if done.is_empty() {
        info!("Schema up to date");
    }

    Ok(done)
}

/// Every known migration along with whether it has been applied
pub async fn status<C: ConnectionTrait>(conn: &C) -> Result<Vec<(&'static Migration, bool)>, DbErr> {
    let applied = applied_versions(conn).await?;
    Ok(MIGRATIONS.iter().map(|migration| (migration, applied.contains(migration.version))).collect())
}
