use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::feedback::{FeedbackRecord, FeedbackType, NewFeedback};
use crate::state::AppState;
use crate::validation::{Validate, ValidJson};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub lyric_id: i64,
    pub feedback_type: FeedbackType,
    pub comment: Option<String>,
}

impl Validate for FeedbackRequest {
    fn validate(mut self) -> Result<Self, AppError> {
        self.comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(self)
    }
}

/// POST /api/v1/feedback
///
/// Appends to the feedback history, then moves the lyric's score and weight.
/// The history row is written even when the lyric is gone; only the
/// adjustment is skipped.
pub async fn handle_create_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<FeedbackRequest>,
) -> Result<Json<FeedbackRecord>, AppError> {
    let record = state
        .store
        .create_feedback(NewFeedback {
            user_id: user.id(),
            lyric_id: request.lyric_id,
            feedback_type: request.feedback_type,
            comment: request.comment,
        })
        .await?;

    match state
        .store
        .apply_feedback(user.id(), request.lyric_id, request.feedback_type)
        .await?
    {
        Some(lyric) => info!(
            "Lyric {} feedback {:?}: score {}, weight {:.2}",
            lyric.id, request.feedback_type, lyric.satisfaction_score, lyric.weight
        ),
        None => debug!(
            "Feedback recorded for missing lyric {}; score unchanged",
            request.lyric_id
        ),
    }

    Ok(Json(record))
}

/// GET /api/v1/feedback
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<FeedbackRecord>>, AppError> {
    Ok(Json(state.store.list_feedback_for_user(user.id()).await?))
}
