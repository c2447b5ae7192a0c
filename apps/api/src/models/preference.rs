use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::melody::MelodyType;

/// Per-user singleton; `user_id` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    pub id: i64,
    pub user_id: i64,
    pub preferred_languages: String,
    pub allow_mixed_language: bool,
    pub default_melody_type: MelodyType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PreferenceUpsert {
    pub user_id: i64,
    pub preferred_languages: String,
    pub allow_mixed_language: bool,
    pub default_melody_type: MelodyType,
}
