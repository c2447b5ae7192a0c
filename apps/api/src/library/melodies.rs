use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::lyric::DEFAULT_WEIGHT;
use crate::models::melody::{Melody, MelodyPatch, MelodyType, NewMelody};
use crate::routes::SuccessResponse;
use crate::state::AppState;
use crate::validation::{require_text, require_weight, Validate, ValidJson};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMelodyRequest {
    pub description: String,
    pub melody_type: MelodyType,
    pub melody_data: Option<String>,
}

impl Validate for CreateMelodyRequest {
    fn validate(self) -> Result<Self, AppError> {
        require_text("description", &self.description)?;
        Ok(self)
    }
}

impl Validate for MelodyPatch {
    fn validate(self) -> Result<Self, AppError> {
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        require_weight("weight", self.weight)?;
        Ok(self)
    }
}

/// GET /api/v1/melodies
pub async fn handle_list_melodies(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Melody>>, AppError> {
    Ok(Json(state.store.list_melodies(user.id()).await?))
}

/// POST /api/v1/melodies
pub async fn handle_create_melody(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateMelodyRequest>,
) -> Result<Json<Melody>, AppError> {
    let melody = state
        .store
        .create_melody(NewMelody {
            user_id: user.id(),
            description: request.description,
            melody_type: request.melody_type,
            melody_data: request.melody_data,
            weight: DEFAULT_WEIGHT,
        })
        .await?;
    Ok(Json(melody))
}

/// PATCH /api/v1/melodies/:id
pub async fn handle_update_melody(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<MelodyPatch>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.update_melody(user.id(), id, patch).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/v1/melodies/:id
pub async fn handle_delete_melody(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.delete_melody(user.id(), id).await?;
    Ok(Json(SuccessResponse::ok()))
}
