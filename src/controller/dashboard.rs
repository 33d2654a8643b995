use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    response::Response,
};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter, TransactionTrait};
use serde::Serialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, warn};

use super::Error;

use crate::{
    auth::AdminUser,
    database::{
        location,
        user::{self, Role, UserInfo},
    },
    inertia::Inertia,
    server::AppState,
};

const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Serialize)]
struct Owner {
    id: i64,
    name: Option<String>,
    email: String,
}

#[derive(Debug, Serialize)]
struct DashboardLocation {
    #[serde(flatten)]
    location: location::Model,
    user: Option<Owner>,
}

#[derive(Debug, Serialize)]
struct DashboardUser {
    #[serde(flatten)]
    user: UserInfo,
    locations_count: usize,
}

pub async fn index(
    AdminUser(admin): AdminUser,
    inertia: Inertia,
    State(state): State<Arc<AppState>>,
) -> Result<Response, Error> {
    let locations = location::Entity::all_with_user(&state.conn).await?;
    let users = user::Entity::all_ordered(&state.conn).await?;

    let mut counts = HashMap::<i64, usize>::new();
    for user_id in locations.iter().filter_map(|(location, _)| location.user_id) {
        *counts.entry(user_id).or_default() += 1;
    }

    let total_locations = locations.len();
    let total_users = users.len();

    let locations = locations
        .into_iter()
        .map(|(location, user)| DashboardLocation {
            location,
            user: user.map(|user| Owner { id: user.id, name: user.name, email: user.email }),
        })
        .collect::<Vec<_>>();
    let users = users
        .iter()
        .map(|user| DashboardUser {
            user: UserInfo::from(user),
            locations_count: counts.get(&user.id).copied().unwrap_or_default(),
        })
        .collect::<Vec<_>>();

    inertia
        .render(
            "Dashboard",
            json!({
                "locations": locations,
                "users": users,
                "totalLocations": total_locations,
                "totalUsers": total_users,
                "currentUserId": admin.id,
            }),
        )
        .await
}

pub async fn destroy_location(
    AdminUser(admin): AdminUser,
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, Error> {
    let location = location::Entity::find_by_id(id).one(&state.conn).await?.ok_or(Error::NotFound)?;
    let name = location.name.clone();
    location.delete(&state.conn).await?;
    info!("Admin {} deleted location {id} \"{name}\"", admin.id);

    super::redirect_with_notice(&session, DASHBOARD_PATH, format!("Location '{name}' successfully deleted")).await
}

pub async fn destroy_all_locations(
    AdminUser(admin): AdminUser,
    session: Session,
    State(state): State<Arc<AppState>>,
) -> Result<Response, Error> {
    let res = location::Entity::delete_many().exec(&state.conn).await?;
    info!("Admin {} deleted all {} locations", admin.id, res.rows_affected);

    super::redirect_with_notice(&session, DASHBOARD_PATH, "All locations successfully deleted").await
}

pub async fn destroy_user(
    AdminUser(admin): AdminUser,
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, Error> {
    if id == admin.id {
        warn!("Admin {} tried to delete their own account", admin.id);
        return super::redirect_with_alert(&session, DASHBOARD_PATH, "You cannot delete your own account.").await;
    }

    let txn = state.conn.begin().await?;
    let user = user::Entity::find_by_id(id).one(&txn).await?.ok_or(Error::NotFound)?;
    let name = user.display_name().to_owned();
    let locations = location::Entity::delete_many().filter(location::Column::UserId.eq(id)).exec(&txn).await?;
    // someone else got there first
    if user.delete(&txn).await?.rows_affected == 0 {
        return Err(Error::NotFound);
    }
    txn.commit().await?;
    info!("Admin {} deleted user {id} and their {} locations", admin.id, locations.rows_affected);

    super::redirect_with_notice(&session, DASHBOARD_PATH, format!("User '{name}' successfully deleted")).await
}

/// Removes every non admin account along with its locations
pub async fn destroy_all_users(
    AdminUser(admin): AdminUser,
    session: Session,
    State(state): State<Arc<AppState>>,
) -> Result<Response, Error> {
    let txn = state.conn.begin().await?;
    let ids = user::Entity::find()
        .filter(user::Column::Role.ne(Role::Admin))
        .all(&txn)
        .await?
        .into_iter()
        .map(|user| user.id)
        .collect::<Vec<_>>();
    let locations =
        location::Entity::delete_many().filter(location::Column::UserId.is_in(ids.clone())).exec(&txn).await?;
    let users = user::Entity::delete_many().filter(user::Column::Id.is_in(ids)).exec(&txn).await?;
    txn.commit().await?;
    info!("Admin {} deleted {} users and {} locations", admin.id, users.rows_affected, locations.rows_affected);

    super::redirect_with_notice(&session, DASHBOARD_PATH, "All non-admin users successfully deleted").await
}
