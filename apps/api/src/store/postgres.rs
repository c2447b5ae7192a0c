use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{Store, StoreResult};
use crate::feedback::scoring::LyricStanding;
use crate::models::feedback::{FeedbackRecord, FeedbackType, NewFeedback};
use crate::models::keyword::{Keyword, KeywordPatch, NewKeyword};
use crate::models::lyric::{Lyric, LyricPatch, NewLyric};
use crate::models::melody::{Melody, MelodyPatch, NewMelody};
use crate::models::preference::{PreferenceUpsert, UserPreference};
use crate::models::user::{User, UserUpsert};

/// Postgres-backed store. Partial updates use `COALESCE($n, column)` so an
/// absent patch field keeps the stored value.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn upsert_user(&self, user: UserUpsert) -> StoreResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (open_id, name, email, login_method, role)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'user'::user_role))
            ON CONFLICT (open_id) DO UPDATE SET
                name = COALESCE($2, users.name),
                email = COALESCE($3, users.email),
                login_method = COALESCE($4, users.login_method),
                role = COALESCE($5, users.role),
                last_signed_in = now(),
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&user.open_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.login_method)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_user_by_open_id(&self, open_id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE open_id = $1 LIMIT 1")
            .bind(open_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_keywords(&self, user_id: i64) -> StoreResult<Vec<Keyword>> {
        let rows = sqlx::query_as::<_, Keyword>(
            "SELECT * FROM keywords WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_keyword(&self, keyword: NewKeyword) -> StoreResult<Keyword> {
        let row = sqlx::query_as::<_, Keyword>(
            r#"
            INSERT INTO keywords (user_id, keyword, search_results, weight)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(keyword.user_id)
        .bind(&keyword.keyword)
        .bind(&keyword.search_results)
        .bind(keyword.weight)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_keyword(&self, user_id: i64, id: i64, patch: KeywordPatch) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE keywords SET
                keyword = COALESCE($3, keyword),
                search_results = COALESCE($4, search_results),
                weight = COALESCE($5, weight),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.keyword)
        .bind(&patch.search_results)
        .bind(patch.weight)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_keyword(&self, user_id: i64, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM keywords WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_melodies(&self, user_id: i64) -> StoreResult<Vec<Melody>> {
        let rows = sqlx::query_as::<_, Melody>(
            "SELECT * FROM melodies WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_melody(&self, melody: NewMelody) -> StoreResult<Melody> {
        let row = sqlx::query_as::<_, Melody>(
            r#"
            INSERT INTO melodies (user_id, description, melody_type, melody_data, weight)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(melody.user_id)
        .bind(&melody.description)
        .bind(melody.melody_type)
        .bind(&melody.melody_data)
        .bind(melody.weight)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_melody(&self, user_id: i64, id: i64, patch: MelodyPatch) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE melodies SET
                description = COALESCE($3, description),
                melody_type = COALESCE($4, melody_type),
                melody_data = COALESCE($5, melody_data),
                weight = COALESCE($6, weight),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.description)
        .bind(patch.melody_type)
        .bind(&patch.melody_data)
        .bind(patch.weight)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_melody(&self, user_id: i64, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM melodies WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_lyrics(&self, user_id: i64) -> StoreResult<Vec<Lyric>> {
        let rows = sqlx::query_as::<_, Lyric>(
            "SELECT * FROM lyrics WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_lyric(&self, user_id: i64, id: i64) -> StoreResult<Option<Lyric>> {
        let row = sqlx::query_as::<_, Lyric>(
            "SELECT * FROM lyrics WHERE id = $1 AND user_id = $2 LIMIT 1",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_lyric(&self, lyric: NewLyric) -> StoreResult<Lyric> {
        let row = sqlx::query_as::<_, Lyric>(
            r#"
            INSERT INTO lyrics
                (user_id, title, content, languages, is_mixed, translation,
                 keyword_ids, melody_id, timing_data, satisfaction_score, weight)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 1.0)
            RETURNING *
            "#,
        )
        .bind(lyric.user_id)
        .bind(&lyric.title)
        .bind(&lyric.content)
        .bind(&lyric.languages)
        .bind(lyric.is_mixed)
        .bind(&lyric.translation)
        .bind(&lyric.keyword_ids)
        .bind(lyric.melody_id)
        .bind(lyric.timing_data.map(Json))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_lyric(&self, user_id: i64, id: i64, patch: LyricPatch) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE lyrics SET
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                satisfaction_score = COALESCE($5, satisfaction_score),
                weight = COALESCE($6, weight),
                timing_data = COALESCE($7, timing_data),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(patch.satisfaction_score)
        .bind(patch.weight)
        .bind(patch.timing_data.map(Json))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_lyric(&self, user_id: i64, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM lyrics WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn apply_feedback(
        &self,
        user_id: i64,
        lyric_id: i64,
        feedback: FeedbackType,
    ) -> StoreResult<Option<Lyric>> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent feedback on the same lyric queues here.
        let current: Option<(i32, f64)> = sqlx::query_as(
            "SELECT satisfaction_score, weight FROM lyrics WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(lyric_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((score, weight)) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let adjusted = LyricStanding::new(score, weight).adjust(feedback);

        let updated = sqlx::query_as::<_, Lyric>(
            r#"
            UPDATE lyrics SET satisfaction_score = $2, weight = $3, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lyric_id)
        .bind(adjusted.satisfaction_score)
        .bind(adjusted.weight)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn get_preference(&self, user_id: i64) -> StoreResult<Option<UserPreference>> {
        let row = sqlx::query_as::<_, UserPreference>(
            "SELECT * FROM user_preferences WHERE user_id = $1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_preference(&self, preference: PreferenceUpsert) -> StoreResult<UserPreference> {
        let row = sqlx::query_as::<_, UserPreference>(
            r#"
            INSERT INTO user_preferences
                (user_id, preferred_languages, allow_mixed_language, default_melody_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                preferred_languages = EXCLUDED.preferred_languages,
                allow_mixed_language = EXCLUDED.allow_mixed_language,
                default_melody_type = EXCLUDED.default_melody_type,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(preference.user_id)
        .bind(&preference.preferred_languages)
        .bind(preference.allow_mixed_language)
        .bind(preference.default_melody_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_feedback(&self, feedback: NewFeedback) -> StoreResult<FeedbackRecord> {
        let row = sqlx::query_as::<_, FeedbackRecord>(
            r#"
            INSERT INTO feedback_history (user_id, lyric_id, feedback_type, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(feedback.user_id)
        .bind(feedback.lyric_id)
        .bind(feedback.feedback_type)
        .bind(&feedback.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_feedback_for_lyric(
        &self,
        user_id: i64,
        lyric_id: i64,
    ) -> StoreResult<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, FeedbackRecord>(
            r#"
            SELECT * FROM feedback_history
            WHERE lyric_id = $1 AND user_id = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(lyric_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_feedback_for_user(&self, user_id: i64) -> StoreResult<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT * FROM feedback_history WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
