use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

/// Identity forwarded by the auth gateway on each request.
///
/// `None` fields leave the stored value untouched on repeat logins.
/// `role: None` keeps the existing role (or `user` for a new row).
#[derive(Debug, Clone, Default)]
pub struct UserUpsert {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
}

impl User {
    /// Unsaved user for requests served without a database. `id` is 0, which
    /// owns no rows.
    pub fn transient(upsert: UserUpsert) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            open_id: upsert.open_id,
            name: upsert.name,
            email: upsert.email,
            login_method: upsert.login_method,
            role: upsert.role.unwrap_or(Role::User),
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        }
    }
}
