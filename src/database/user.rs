use sea_orm::{entity::prelude::*, ActiveValue, QueryOrder};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    pub encrypted_password: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|name| !name.is_empty()).unwrap_or(&self.email)
    }
}

impl Entity {
    pub async fn find_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> Result<Option<Model>, DbErr> {
        Entity::find().filter(Column::Email.eq(normalize_email(email))).one(conn).await
    }

    pub async fn all_ordered<C: ConnectionTrait>(conn: &C) -> Result<Vec<Model>, DbErr> {
        Entity::find().order_by_asc(Column::Id).all(conn).await
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::location::Entity")]
    Locations,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Locations.def()
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

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// What the client gets to see of a user
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl From<&Model> for UserInfo {
    fn from(model: &Model) -> Self {
        UserInfo {
            id: model.id,
            email: model.email.clone(),
            name: model.name.clone(),
            role: model.role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Sign up payload
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
    pub name: Option<String>,
}

impl Registration {
    /// Returns the full error messages, empty when the registration can be saved
    pub async fn validate<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<String>, DbErr> {
        let mut errors = Vec::new();

        let email = normalize_email(&self.email);
        if email.is_empty() {
            errors.push(String::from("Email can't be blank"));
        } else if !is_valid_email(&email) {
            errors.push(String::from("Email is invalid"));
        } else if Entity::find_by_email(conn, &email).await?.is_some() {
            errors.push(String::from("Email has already been taken"));
        }

        let password_len = self.password.chars().count();
        if self.password.is_empty() {
            errors.push(String::from("Password can't be blank"));
        } else if password_len < PASSWORD_MIN_LEN {
            errors.push(format!("Password is too short (minimum is {PASSWORD_MIN_LEN} characters)"));
        } else if password_len > PASSWORD_MAX_LEN {
            errors.push(format!("Password is too long (maximum is {PASSWORD_MAX_LEN} characters)"));
        }

        if let Some(confirmation) = &self.password_confirmation {
            if confirmation != &self.password {
                errors.push(String::from("Password confirmation doesn't match Password"));
            }
        }

        Ok(errors)
    }

    pub fn into_active_model(self, encrypted_password: String) -> ActiveModel {
        ActiveModel {
            email: ActiveValue::Set(normalize_email(&self.email)),
            encrypted_password: ActiveValue::Set(encrypted_password),
            name: ActiveValue::Set(self.name.map(|name| name.trim().to_owned()).filter(|name| !name.is_empty())),
            role: ActiveValue::Set(Role::User),
            ..Default::default()
        }
    }
}

// one @, something on both sides, no whitespace
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
}
