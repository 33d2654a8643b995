use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::info;

use super::{
    location,
    user::{self, Role},
};

use crate::auth;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Password error: {0}")]
    Password(#[from] auth::Error),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub locations_created: usize,
}

struct SeedUser {
    email: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

const USERS: &[SeedUser] = &[
    SeedUser { email: "hilary@example.com", password: "password123", name: "Hilary", role: Role::User },
    SeedUser { email: "paul@example.com", password: "password123", name: "Paul", role: Role::User },
    SeedUser { email: "john@example.com", password: "password123", name: "John", role: Role::User },
    SeedUser { email: "admin@example.com", password: "admin123", name: "Admin User", role: Role::Admin },
];

// around Kisumu, latitude and longitude scaled by 10^4
const LOCATIONS: &[(&str, i64, i64)] = &[
    ("Kisumu Museum", -917, 347560),
    ("Kisumu Impala Sanctuary", -850, 347350),
    ("Hippo Point", -1180, 347720),
    ("Dunga Hill Camp", -1400, 347850),
    ("Kisumu Yacht Club", -800, 347500),
    ("Kibuye Market", -950, 347650),
    ("Jomo Kenyatta International Airport", -13275, 369275),
    ("Kisumu CBD", -919, 347558),
    ("Lwang'ni Beach", -1050, 347900),
    ("Riat Hills", -500, 347000),
];

/// Creates the default users and locations, skipping what already exists
pub async fn run<C: ConnectionTrait>(conn: &C) -> Result<SeedReport, Error> {
    let mut report = SeedReport::default();

    for seed in USERS {
        if user::Entity::find_by_email(conn, seed.email).await?.is_some() {
            continue;
        }
        user::ActiveModel {
            email: ActiveValue::Set(seed.email.to_owned()),
            encrypted_password: ActiveValue::Set(auth::hash_password(seed.password)?),
            name: ActiveValue::Set(Some(seed.name.to_owned())),
            role: ActiveValue::Set(seed.role),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        info!("Created user: {}", seed.name);
        report.users_created += 1;
    }

    let owners = user::Entity::find().filter(user::Column::Role.ne(Role::Admin)).all(conn).await?;

    for (name, latitude, longitude) in LOCATIONS {
        let exists = location::Entity::find().filter(location::Column::Name.eq(*name)).one(conn).await?.is_some();
        if exists {
            continue;
        }
        let Some(owner) = owners.choose(&mut rand::thread_rng()) else {
            break;
        };
        location::ActiveModel {
            name: ActiveValue::Set((*name).to_owned()),
            latitude: ActiveValue::Set(Decimal::new(*latitude, 4)),
            longitude: ActiveValue::Set(Decimal::new(*longitude, 4)),
            user_id: ActiveValue::Set(Some(owner.id)),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        info!("Created location: {name} for user: {}", owner.display_name());
        report.locations_created += 1;
    }

    info!("Seeded {} users and {} locations", report.users_created, report.locations_created);

    Ok(report)
}
