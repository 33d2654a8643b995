use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use sea_orm::{entity::prelude::*, ActiveValue, QueryOrder};
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((10, 6)))")]
    pub latitude: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 6)))")]
    pub longitude: Decimal,
    pub user_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Entity {
    /// Every location along with its owner, if any
    pub async fn all_with_user<C: ConnectionTrait>(conn: &C) -> Result<Vec<(Model, Option<user::Model>)>, DbErr> {
        Entity::find().find_also_related(user::Entity).order_by_asc(Column::Id).all(conn).await
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..ActiveModelTrait::default()
        }
    }
}

/// A coordinate as the client sends it, either a JSON number or a numeric string
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

enum Coordinate {
    Missing,
    NotANumber,
    OutOfRange,
    Value(Decimal),
}

impl Coordinate {
    fn from_f64(n: f64) -> Self {
        match Decimal::from_f64(n) {
            Some(value) => Coordinate::Value(value),
            // finite, but bigger than a Decimal can hold
            None if n.is_finite() => Coordinate::OutOfRange,
            None => Coordinate::NotANumber,
        }
    }
}

impl From<Option<&RawCoordinate>> for Coordinate {
    fn from(raw: Option<&RawCoordinate>) -> Self {
        match raw {
            None => Coordinate::Missing,
            Some(RawCoordinate::Number(n)) => Coordinate::from_f64(*n),
            Some(RawCoordinate::Text(s)) if s.trim().is_empty() => Coordinate::Missing,
            Some(RawCoordinate::Text(s)) => match Decimal::from_str(s.trim()) {
                Ok(value) => Coordinate::Value(value),
                Err(_) => s.trim().parse::<f64>().map_or(Coordinate::NotANumber, Coordinate::from_f64),
            },
        }
    }
}

/// Permitted location attributes
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocationParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latitude: Option<RawCoordinate>,
    #[serde(default)]
    pub longitude: Option<RawCoordinate>,
}

impl LocationParams {
    /// Validates the attributes, returning the full error messages on failure
    pub fn into_active_model(self, user_id: i64) -> Result<ActiveModel, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            errors.push(String::from("Name can't be blank"));
        }

        let latitude = check_coordinate("Latitude", self.latitude.as_ref(), Decimal::from(90), &mut errors);
        let longitude = check_coordinate("Longitude", self.longitude.as_ref(), Decimal::from(180), &mut errors);

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if errors.is_empty() => Ok(ActiveModel {
                name: ActiveValue::Set(name.to_owned()),
                latitude: ActiveValue::Set(latitude),
                longitude: ActiveValue::Set(longitude),
                user_id: ActiveValue::Set(Some(user_id)),
                ..Default::default()
            }),
            _ => Err(errors),
        }
    }
}

fn check_coordinate(
    label: &str,
    raw: Option<&RawCoordinate>,
    bound: Decimal,
    errors: &mut Vec<String>,
) -> Option<Decimal> {
    match Coordinate::from(raw) {
        Coordinate::Missing => {
            errors.push(format!("{label} can't be blank"));
            None
        }
        Coordinate::NotANumber => {
            errors.push(format!("{label} is not a number"));
            None
        }
        Coordinate::OutOfRange => {
            errors.push(format!("{label} must be between -{bound} and {bound}"));
            None
        }
        Coordinate::Value(value) if value < -bound || value > bound => {
            errors.push(format!("{label} must be between -{bound} and {bound}"));
            None
        }
        Coordinate::Value(value) => Some(value),
    }
}
