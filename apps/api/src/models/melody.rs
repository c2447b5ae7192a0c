use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "melody_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MelodyType {
    Text,
    Pattern,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Melody {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub melody_type: MelodyType,
    pub melody_data: Option<String>,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMelody {
    pub user_id: i64,
    pub description: String,
    pub melody_type: MelodyType,
    pub melody_data: Option<String>,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MelodyPatch {
    pub description: Option<String>,
    pub melody_type: Option<MelodyType>,
    pub melody_data: Option<String>,
    pub weight: Option<f64>,
}
