use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use super::{Store, StoreResult};
use crate::feedback::scoring::LyricStanding;
use crate::models::feedback::{FeedbackRecord, FeedbackType, NewFeedback};
use crate::models::keyword::{Keyword, KeywordPatch, NewKeyword};
use crate::models::lyric::{Lyric, LyricPatch, NewLyric, DEFAULT_WEIGHT};
use crate::models::melody::{Melody, MelodyPatch, NewMelody};
use crate::models::preference::{PreferenceUpsert, UserPreference};
use crate::models::user::{Role, User, UserUpsert};

/// In-process tables behind one lock. Ids are assigned from a single counter,
/// so a higher id always means a later insert.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    keywords: Vec<Keyword>,
    melodies: Vec<Melody>,
    lyrics: Vec<Lyric>,
    preferences: Vec<UserPreference>,
    feedback: Vec<FeedbackRecord>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; ids break ties between rows created in the same instant.
fn newest_first<T: Clone>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert_user(&self, user: UserUpsert) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables.users.iter_mut().find(|u| u.open_id == user.open_id) {
            if user.name.is_some() {
                existing.name = user.name;
            }
            if user.email.is_some() {
                existing.email = user.email;
            }
            if user.login_method.is_some() {
                existing.login_method = user.login_method;
            }
            if let Some(role) = user.role {
                existing.role = role;
            }
            existing.last_signed_in = now;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = tables.allocate_id();
        let created = User {
            id,
            open_id: user.open_id,
            name: user.name,
            email: user.email,
            login_method: user.login_method,
            role: user.role.unwrap_or(Role::User),
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_user_by_open_id(&self, open_id: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.open_id == open_id).cloned())
    }

    async fn list_keywords(&self, user_id: i64) -> StoreResult<Vec<Keyword>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.keywords.iter().filter(|k| k.user_id == user_id).cloned(),
            |k| k.id,
        ))
    }

    async fn create_keyword(&self, keyword: NewKeyword) -> StoreResult<Keyword> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Keyword {
            id: tables.allocate_id(),
            user_id: keyword.user_id,
            keyword: keyword.keyword,
            search_results: keyword.search_results,
            weight: keyword.weight,
            created_at: now,
            updated_at: now,
        };
        tables.keywords.push(row.clone());
        Ok(row)
    }

    async fn update_keyword(&self, user_id: i64, id: i64, patch: KeywordPatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables
            .keywords
            .iter_mut()
            .find(|k| k.id == id && k.user_id == user_id)
        {
            if let Some(keyword) = patch.keyword {
                row.keyword = keyword;
            }
            if patch.search_results.is_some() {
                row.search_results = patch.search_results;
            }
            if let Some(weight) = patch.weight {
                row.weight = weight;
            }
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_keyword(&self, user_id: i64, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .keywords
            .retain(|k| !(k.id == id && k.user_id == user_id));
        Ok(())
    }

    async fn list_melodies(&self, user_id: i64) -> StoreResult<Vec<Melody>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.melodies.iter().filter(|m| m.user_id == user_id).cloned(),
            |m| m.id,
        ))
    }

    async fn create_melody(&self, melody: NewMelody) -> StoreResult<Melody> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Melody {
            id: tables.allocate_id(),
            user_id: melody.user_id,
            description: melody.description,
            melody_type: melody.melody_type,
            melody_data: melody.melody_data,
            weight: melody.weight,
            created_at: now,
            updated_at: now,
        };
        tables.melodies.push(row.clone());
        Ok(row)
    }

    async fn update_melody(&self, user_id: i64, id: i64, patch: MelodyPatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables
            .melodies
            .iter_mut()
            .find(|m| m.id == id && m.user_id == user_id)
        {
            if let Some(description) = patch.description {
                row.description = description;
            }
            if let Some(melody_type) = patch.melody_type {
                row.melody_type = melody_type;
            }
            if patch.melody_data.is_some() {
                row.melody_data = patch.melody_data;
            }
            if let Some(weight) = patch.weight {
                row.weight = weight;
            }
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_melody(&self, user_id: i64, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .melodies
            .retain(|m| !(m.id == id && m.user_id == user_id));
        Ok(())
    }

    async fn list_lyrics(&self, user_id: i64) -> StoreResult<Vec<Lyric>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.lyrics.iter().filter(|l| l.user_id == user_id).cloned(),
            |l| l.id,
        ))
    }

    async fn get_lyric(&self, user_id: i64, id: i64) -> StoreResult<Option<Lyric>> {
        let tables = self.tables.read().await;
        Ok(tables
            .lyrics
            .iter()
            .find(|l| l.id == id && l.user_id == user_id)
            .cloned())
    }

    async fn create_lyric(&self, lyric: NewLyric) -> StoreResult<Lyric> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Lyric {
            id: tables.allocate_id(),
            user_id: lyric.user_id,
            title: lyric.title,
            content: lyric.content,
            languages: lyric.languages,
            is_mixed: lyric.is_mixed,
            translation: lyric.translation,
            keyword_ids: lyric.keyword_ids,
            melody_id: lyric.melody_id,
            timing_data: lyric.timing_data.map(Json),
            satisfaction_score: 0,
            weight: DEFAULT_WEIGHT,
            created_at: now,
            updated_at: now,
        };
        tables.lyrics.push(row.clone());
        Ok(row)
    }

    async fn update_lyric(&self, user_id: i64, id: i64, patch: LyricPatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables
            .lyrics
            .iter_mut()
            .find(|l| l.id == id && l.user_id == user_id)
        {
            if patch.title.is_some() {
                row.title = patch.title;
            }
            if let Some(content) = patch.content {
                row.content = content;
            }
            if let Some(score) = patch.satisfaction_score {
                row.satisfaction_score = score;
            }
            if let Some(weight) = patch.weight {
                row.weight = weight;
            }
            if let Some(timing) = patch.timing_data {
                row.timing_data = Some(Json(timing));
            }
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_lyric(&self, user_id: i64, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .lyrics
            .retain(|l| !(l.id == id && l.user_id == user_id));
        Ok(())
    }

    async fn apply_feedback(
        &self,
        user_id: i64,
        lyric_id: i64,
        feedback: FeedbackType,
    ) -> StoreResult<Option<Lyric>> {
        // The write lock is the per-lyric serialization point.
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .lyrics
            .iter_mut()
            .find(|l| l.id == lyric_id && l.user_id == user_id)
        else {
            return Ok(None);
        };

        let adjusted = LyricStanding::new(row.satisfaction_score, row.weight).adjust(feedback);
        row.satisfaction_score = adjusted.satisfaction_score;
        row.weight = adjusted.weight;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn get_preference(&self, user_id: i64) -> StoreResult<Option<UserPreference>> {
        let tables = self.tables.read().await;
        Ok(tables
            .preferences
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_preference(&self, preference: PreferenceUpsert) -> StoreResult<UserPreference> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables
            .preferences
            .iter_mut()
            .find(|p| p.user_id == preference.user_id)
        {
            existing.preferred_languages = preference.preferred_languages;
            existing.allow_mixed_language = preference.allow_mixed_language;
            existing.default_melody_type = preference.default_melody_type;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = UserPreference {
            id: tables.allocate_id(),
            user_id: preference.user_id,
            preferred_languages: preference.preferred_languages,
            allow_mixed_language: preference.allow_mixed_language,
            default_melody_type: preference.default_melody_type,
            created_at: now,
            updated_at: now,
        };
        tables.preferences.push(row.clone());
        Ok(row)
    }

    async fn create_feedback(&self, feedback: NewFeedback) -> StoreResult<FeedbackRecord> {
        let mut tables = self.tables.write().await;
        let row = FeedbackRecord {
            id: tables.allocate_id(),
            user_id: feedback.user_id,
            lyric_id: feedback.lyric_id,
            feedback_type: feedback.feedback_type,
            comment: feedback.comment,
            created_at: Utc::now(),
        };
        tables.feedback.push(row.clone());
        Ok(row)
    }

    async fn list_feedback_for_lyric(
        &self,
        user_id: i64,
        lyric_id: i64,
    ) -> StoreResult<Vec<FeedbackRecord>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .feedback
                .iter()
                .filter(|f| f.lyric_id == lyric_id && f.user_id == user_id)
                .cloned(),
            |f| f.id,
        ))
    }

    async fn list_feedback_for_user(&self, user_id: i64) -> StoreResult<Vec<FeedbackRecord>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.feedback.iter().filter(|f| f.user_id == user_id).cloned(),
            |f| f.id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::melody::MelodyType;

    fn new_lyric(user_id: i64, title: &str) -> NewLyric {
        NewLyric {
            user_id,
            title: Some(title.to_string()),
            content: "line one\nline two".to_string(),
            languages: "zh".to_string(),
            is_mixed: false,
            translation: None,
            keyword_ids: None,
            melody_id: None,
            timing_data: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_user_refreshes_existing_row() {
        let store = MemoryStore::new();
        let first = store
            .upsert_user(UserUpsert {
                open_id: "oid-1".to_string(),
                name: Some("Mira".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = store
            .upsert_user(UserUpsert {
                open_id: "oid-1".to_string(),
                email: Some("mira@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Mira"));
        assert_eq!(second.email.as_deref(), Some("mira@example.com"));
        assert_eq!(second.role, Role::User);
        assert!(second.last_signed_in >= first.last_signed_in);

        let found = store.get_user_by_open_id("oid-1").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.get_user_by_open_id("oid-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let store = MemoryStore::new();
        let a = store.create_lyric(new_lyric(1, "a")).await.unwrap();
        let b = store.create_lyric(new_lyric(1, "b")).await.unwrap();
        store.create_lyric(new_lyric(2, "other")).await.unwrap();

        let ids: Vec<i64> = store
            .list_lyrics(1)
            .await
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_foreign_lyric_is_invisible_and_untouchable() {
        let store = MemoryStore::new();
        let lyric = store.create_lyric(new_lyric(1, "mine")).await.unwrap();

        assert!(store.get_lyric(2, lyric.id).await.unwrap().is_none());
        store.delete_lyric(2, lyric.id).await.unwrap();
        assert!(store
            .apply_feedback(2, lyric.id, FeedbackType::Like)
            .await
            .unwrap()
            .is_none());

        let still_there = store.get_lyric(1, lyric.id).await.unwrap().unwrap();
        assert_eq!(still_there.satisfaction_score, 0);
    }

    #[tokio::test]
    async fn test_apply_feedback_reads_fresh_values() {
        let store = MemoryStore::new();
        let lyric = store.create_lyric(new_lyric(1, "song")).await.unwrap();
        store
            .update_lyric(
                1,
                lyric.id,
                LyricPatch {
                    satisfaction_score: Some(9),
                    weight: Some(1.98),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = store
            .apply_feedback(1, lyric.id, FeedbackType::Like)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.satisfaction_score, 10);
        assert_eq!(updated.weight, 2.0);
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_not_lost() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let lyric = store.create_lyric(new_lyric(1, "song")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .apply_feedback(1, lyric.id, FeedbackType::Like)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let lyric = store.get_lyric(1, lyric.id).await.unwrap().unwrap();
        assert_eq!(lyric.satisfaction_score, 5);
        assert!((lyric.weight - 1.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_preference_upsert_keeps_single_row() {
        let store = MemoryStore::new();
        let first = store
            .upsert_preference(PreferenceUpsert {
                user_id: 7,
                preferred_languages: "zh".to_string(),
                allow_mixed_language: false,
                default_melody_type: MelodyType::Text,
            })
            .await
            .unwrap();
        let second = store
            .upsert_preference(PreferenceUpsert {
                user_id: 7,
                preferred_languages: "zh,en".to_string(),
                allow_mixed_language: true,
                default_melody_type: MelodyType::Pattern,
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.tables.read().await.preferences.len(), 1);
        let stored = store.get_preference(7).await.unwrap().unwrap();
        assert_eq!(stored.preferred_languages, "zh,en");
        assert_eq!(stored.default_melody_type, MelodyType::Pattern);
    }

    #[tokio::test]
    async fn test_keyword_patch_only_touches_supplied_fields() {
        let store = MemoryStore::new();
        let keyword = store
            .create_keyword(NewKeyword {
                user_id: 1,
                keyword: "moonlight".to_string(),
                search_results: Some("[]".to_string()),
                weight: DEFAULT_WEIGHT,
            })
            .await
            .unwrap();

        store
            .update_keyword(
                1,
                keyword.id,
                KeywordPatch {
                    weight: Some(1.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let listed = store.list_keywords(1).await.unwrap();
        assert_eq!(listed[0].keyword, "moonlight");
        assert_eq!(listed[0].search_results.as_deref(), Some("[]"));
        assert_eq!(listed[0].weight, 1.5);
    }
}
