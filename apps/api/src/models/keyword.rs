use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub id: i64,
    pub user_id: i64,
    pub keyword: String,
    /// Cached search payload, stored as the client sent it.
    pub search_results: Option<String>,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewKeyword {
    pub user_id: i64,
    pub keyword: String,
    pub search_results: Option<String>,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordPatch {
    pub keyword: Option<String>,
    pub search_results: Option<String>,
    pub weight: Option<f64>,
}
