use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::melody::MelodyType;
use crate::models::preference::{PreferenceUpsert, UserPreference};
use crate::routes::SuccessResponse;
use crate::state::AppState;
use crate::validation::{normalize_language_codes, Validate, ValidJson};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRequest {
    /// Comma-joined codes, e.g. `"zh,en"`.
    pub preferred_languages: String,
    pub allow_mixed_language: bool,
    pub default_melody_type: MelodyType,
}

impl Validate for PreferenceRequest {
    fn validate(mut self) -> Result<Self, AppError> {
        self.preferred_languages =
            normalize_language_codes("preferredLanguages", &self.preferred_languages)?;
        Ok(self)
    }
}

/// GET /api/v1/preferences
///
/// `null` until the user saves preferences for the first time.
pub async fn handle_get_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Option<UserPreference>>, AppError> {
    Ok(Json(state.store.get_preference(user.id()).await?))
}

/// PUT /api/v1/preferences
///
/// Creates the user's single preference row or overwrites it.
pub async fn handle_upsert_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<PreferenceRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .store
        .upsert_preference(PreferenceUpsert {
            user_id: user.id(),
            preferred_languages: request.preferred_languages,
            allow_mixed_language: request.allow_mixed_language,
            default_melody_type: request.default_melody_type,
        })
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
