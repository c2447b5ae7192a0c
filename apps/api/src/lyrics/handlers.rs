use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::lyrics::playback::active_line;
use crate::models::feedback::FeedbackRecord;
use crate::models::lyric::{Lyric, LyricPatch, NewLyric, TimingEntry};
use crate::routes::SuccessResponse;
use crate::state::AppState;
use crate::validation::{
    normalize_language_codes, require_score, require_text, require_weight, Validate, ValidJson,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLyricRequest {
    pub title: Option<String>,
    pub content: String,
    /// Comma-joined codes, e.g. `"zh,en"`.
    pub languages: String,
    pub is_mixed: bool,
    pub translation: Option<String>,
    pub keyword_ids: Option<Vec<i64>>,
    pub melody_id: Option<i64>,
    pub timing_data: Option<Vec<TimingEntry>>,
}

impl Validate for CreateLyricRequest {
    fn validate(mut self) -> Result<Self, AppError> {
        require_text("content", &self.content)?;
        self.languages = normalize_language_codes("languages", &self.languages)?;
        Ok(self)
    }
}

impl Validate for LyricPatch {
    fn validate(self) -> Result<Self, AppError> {
        if let Some(content) = &self.content {
            require_text("content", content)?;
        }
        require_score(self.satisfaction_score)?;
        require_weight("weight", self.weight)?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueQuery {
    pub position_ms: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CueResponse {
    pub index: usize,
    #[serde(flatten)]
    pub entry: TimingEntry,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/lyrics
pub async fn handle_list_lyrics(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Lyric>>, AppError> {
    Ok(Json(state.store.list_lyrics(user.id()).await?))
}

/// GET /api/v1/lyrics/:id
///
/// `null` for missing ids and for lyrics owned by someone else.
pub async fn handle_get_lyric(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Option<Lyric>>, AppError> {
    Ok(Json(state.store.get_lyric(user.id(), id).await?))
}

/// POST /api/v1/lyrics
///
/// Saves a lyric written or edited by hand. Score and weight start neutral.
pub async fn handle_create_lyric(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateLyricRequest>,
) -> Result<Json<Lyric>, AppError> {
    let lyric = state
        .store
        .create_lyric(NewLyric {
            user_id: user.id(),
            title: request.title,
            content: request.content,
            languages: request.languages,
            is_mixed: request.is_mixed,
            translation: request.translation,
            keyword_ids: request.keyword_ids,
            melody_id: request.melody_id,
            timing_data: request.timing_data,
        })
        .await?;
    Ok(Json(lyric))
}

/// PATCH /api/v1/lyrics/:id
pub async fn handle_update_lyric(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<LyricPatch>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.update_lyric(user.id(), id, patch).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/v1/lyrics/:id
///
/// Succeeds for ids that are already gone. Feedback history is kept.
pub async fn handle_delete_lyric(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.delete_lyric(user.id(), id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/v1/lyrics/:id/feedback
pub async fn handle_lyric_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<FeedbackRecord>>, AppError> {
    Ok(Json(state.store.list_feedback_for_lyric(user.id(), id).await?))
}

/// GET /api/v1/lyrics/:id/cue?positionMs=N
///
/// The timing line playing at `positionMs`, or `null`.
pub async fn handle_cue(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    query: Result<Query<CueQuery>, QueryRejection>,
) -> Result<Json<Option<CueResponse>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    if query.position_ms < 0 {
        return Err(AppError::Validation(
            "positionMs cannot be negative".to_string(),
        ));
    }

    let Some(lyric) = state.store.get_lyric(user.id(), id).await? else {
        return Ok(Json(None));
    };

    let timing = lyric.timing();
    let cue = active_line(timing, query.position_ms).map(|index| CueResponse {
        index,
        entry: timing[index].clone(),
    });
    Ok(Json(cue))
}
