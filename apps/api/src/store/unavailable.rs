use async_trait::async_trait;
use tracing::warn;

use super::{Store, StoreError, StoreResult};
use crate::models::feedback::{FeedbackRecord, FeedbackType, NewFeedback};
use crate::models::keyword::{Keyword, KeywordPatch, NewKeyword};
use crate::models::lyric::{Lyric, LyricPatch, NewLyric};
use crate::models::melody::{Melody, MelodyPatch, NewMelody};
use crate::models::preference::{PreferenceUpsert, UserPreference};
use crate::models::user::{User, UserUpsert};

/// Stand-in used when no database is configured.
///
/// Reads answer with empty collections or `None`; writes fail, since a
/// silently dropped write would mislead the caller.
pub struct UnavailableStore;

fn refuse<T>(operation: &str) -> StoreResult<T> {
    warn!("Cannot {operation}: database not available");
    Err(StoreError::Unavailable)
}

#[async_trait]
impl Store for UnavailableStore {
    fn backend(&self) -> &'static str {
        "none"
    }

    async fn upsert_user(&self, _user: UserUpsert) -> StoreResult<User> {
        refuse("upsert user")
    }

    async fn get_user_by_open_id(&self, _open_id: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }

    async fn list_keywords(&self, _user_id: i64) -> StoreResult<Vec<Keyword>> {
        Ok(Vec::new())
    }

    async fn create_keyword(&self, _keyword: NewKeyword) -> StoreResult<Keyword> {
        refuse("create keyword")
    }

    async fn update_keyword(&self, _user_id: i64, _id: i64, _patch: KeywordPatch) -> StoreResult<()> {
        refuse("update keyword")
    }

    async fn delete_keyword(&self, _user_id: i64, _id: i64) -> StoreResult<()> {
        refuse("delete keyword")
    }

    async fn list_melodies(&self, _user_id: i64) -> StoreResult<Vec<Melody>> {
        Ok(Vec::new())
    }

    async fn create_melody(&self, _melody: NewMelody) -> StoreResult<Melody> {
        refuse("create melody")
    }

    async fn update_melody(&self, _user_id: i64, _id: i64, _patch: MelodyPatch) -> StoreResult<()> {
        refuse("update melody")
    }

    async fn delete_melody(&self, _user_id: i64, _id: i64) -> StoreResult<()> {
        refuse("delete melody")
    }

    async fn list_lyrics(&self, _user_id: i64) -> StoreResult<Vec<Lyric>> {
        Ok(Vec::new())
    }

    async fn get_lyric(&self, _user_id: i64, _id: i64) -> StoreResult<Option<Lyric>> {
        Ok(None)
    }

    async fn create_lyric(&self, _lyric: NewLyric) -> StoreResult<Lyric> {
        refuse("create lyric")
    }

    async fn update_lyric(&self, _user_id: i64, _id: i64, _patch: LyricPatch) -> StoreResult<()> {
        refuse("update lyric")
    }

    async fn delete_lyric(&self, _user_id: i64, _id: i64) -> StoreResult<()> {
        refuse("delete lyric")
    }

    async fn apply_feedback(
        &self,
        _user_id: i64,
        _lyric_id: i64,
        _feedback: FeedbackType,
    ) -> StoreResult<Option<Lyric>> {
        refuse("apply feedback")
    }

    async fn get_preference(&self, _user_id: i64) -> StoreResult<Option<UserPreference>> {
        Ok(None)
    }

    async fn upsert_preference(&self, _preference: PreferenceUpsert) -> StoreResult<UserPreference> {
        refuse("upsert preference")
    }

    async fn create_feedback(&self, _feedback: NewFeedback) -> StoreResult<FeedbackRecord> {
        refuse("create feedback")
    }

    async fn list_feedback_for_lyric(
        &self,
        _user_id: i64,
        _lyric_id: i64,
    ) -> StoreResult<Vec<FeedbackRecord>> {
        Ok(Vec::new())
    }

    async fn list_feedback_for_user(&self, _user_id: i64) -> StoreResult<Vec<FeedbackRecord>> {
        Ok(Vec::new())
    }
}
