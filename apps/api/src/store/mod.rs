//! Persistence interface.
//!
//! Handlers and services only ever see `Arc<dyn Store>`. The backend is picked
//! once at startup from configuration:
//! - `PgStore`: sqlx over Postgres, schema from `migrations/`.
//! - `MemoryStore`: in-process tables for local tooling and tests.
//! - `UnavailableStore`: no database configured. Reads come back empty,
//!   writes fail with `StoreError::Unavailable`.
//!
//! Every query except `get_user_by_open_id` is scoped to the calling user.
//! Updates and deletes of ids the user does not own are silent no-ops.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::feedback::{FeedbackRecord, FeedbackType, NewFeedback};
use crate::models::keyword::{Keyword, KeywordPatch, NewKeyword};
use crate::models::lyric::{Lyric, LyricPatch, NewLyric};
use crate::models::melody::{Melody, MelodyPatch, NewMelody};
use crate::models::preference::{PreferenceUpsert, UserPreference};
use crate::models::user::{User, UserUpsert};

pub mod memory;
pub mod postgres;
pub mod unavailable;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use unavailable::UnavailableStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database not available")]
    Unavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for startup logs.
    fn backend(&self) -> &'static str;

    // ── users ──────────────────────────────────────────────────────────────

    /// Inserts on first login; afterwards refreshes `last_signed_in` and any
    /// supplied fields.
    async fn upsert_user(&self, user: UserUpsert) -> StoreResult<User>;

    async fn get_user_by_open_id(&self, open_id: &str) -> StoreResult<Option<User>>;

    // ── keywords ───────────────────────────────────────────────────────────

    async fn list_keywords(&self, user_id: i64) -> StoreResult<Vec<Keyword>>;
    async fn create_keyword(&self, keyword: NewKeyword) -> StoreResult<Keyword>;
    async fn update_keyword(&self, user_id: i64, id: i64, patch: KeywordPatch) -> StoreResult<()>;
    async fn delete_keyword(&self, user_id: i64, id: i64) -> StoreResult<()>;

    // ── melodies ───────────────────────────────────────────────────────────

    async fn list_melodies(&self, user_id: i64) -> StoreResult<Vec<Melody>>;
    async fn create_melody(&self, melody: NewMelody) -> StoreResult<Melody>;
    async fn update_melody(&self, user_id: i64, id: i64, patch: MelodyPatch) -> StoreResult<()>;
    async fn delete_melody(&self, user_id: i64, id: i64) -> StoreResult<()>;

    // ── lyrics ─────────────────────────────────────────────────────────────

    async fn list_lyrics(&self, user_id: i64) -> StoreResult<Vec<Lyric>>;
    async fn get_lyric(&self, user_id: i64, id: i64) -> StoreResult<Option<Lyric>>;
    async fn create_lyric(&self, lyric: NewLyric) -> StoreResult<Lyric>;
    async fn update_lyric(&self, user_id: i64, id: i64, patch: LyricPatch) -> StoreResult<()>;
    async fn delete_lyric(&self, user_id: i64, id: i64) -> StoreResult<()>;

    /// Read-modify-write of score and weight through `LyricStanding::adjust`,
    /// serialized per lyric. `None` when the lyric is gone.
    async fn apply_feedback(
        &self,
        user_id: i64,
        lyric_id: i64,
        feedback: FeedbackType,
    ) -> StoreResult<Option<Lyric>>;

    // ── preferences ────────────────────────────────────────────────────────

    async fn get_preference(&self, user_id: i64) -> StoreResult<Option<UserPreference>>;
    async fn upsert_preference(&self, preference: PreferenceUpsert) -> StoreResult<UserPreference>;

    // ── feedback history ───────────────────────────────────────────────────

    async fn create_feedback(&self, feedback: NewFeedback) -> StoreResult<FeedbackRecord>;
    async fn list_feedback_for_lyric(
        &self,
        user_id: i64,
        lyric_id: i64,
    ) -> StoreResult<Vec<FeedbackRecord>>;
    async fn list_feedback_for_user(&self, user_id: i64) -> StoreResult<Vec<FeedbackRecord>>;
}
