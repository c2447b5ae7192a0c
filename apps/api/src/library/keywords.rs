use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::keyword::{Keyword, KeywordPatch, NewKeyword};
use crate::models::lyric::DEFAULT_WEIGHT;
use crate::routes::SuccessResponse;
use crate::state::AppState;
use crate::validation::{require_length, require_weight, Validate, ValidJson};

const KEYWORD_MAX_CHARS: usize = 255;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeywordRequest {
    pub keyword: String,
    pub search_results: Option<String>,
}

impl Validate for CreateKeywordRequest {
    fn validate(mut self) -> Result<Self, AppError> {
        self.keyword = self.keyword.trim().to_string();
        require_length("keyword", &self.keyword, 1, KEYWORD_MAX_CHARS)?;
        Ok(self)
    }
}

impl Validate for KeywordPatch {
    fn validate(mut self) -> Result<Self, AppError> {
        if let Some(keyword) = self.keyword.take() {
            let keyword = keyword.trim().to_string();
            require_length("keyword", &keyword, 1, KEYWORD_MAX_CHARS)?;
            self.keyword = Some(keyword);
        }
        require_weight("weight", self.weight)?;
        Ok(self)
    }
}

/// GET /api/v1/keywords
pub async fn handle_list_keywords(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Keyword>>, AppError> {
    Ok(Json(state.store.list_keywords(user.id()).await?))
}

/// POST /api/v1/keywords
pub async fn handle_create_keyword(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateKeywordRequest>,
) -> Result<Json<Keyword>, AppError> {
    let keyword = state
        .store
        .create_keyword(NewKeyword {
            user_id: user.id(),
            keyword: request.keyword,
            search_results: request.search_results,
            weight: DEFAULT_WEIGHT,
        })
        .await?;
    Ok(Json(keyword))
}

/// PATCH /api/v1/keywords/:id
pub async fn handle_update_keyword(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<KeywordPatch>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.update_keyword(user.id(), id, patch).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/v1/keywords/:id
pub async fn handle_delete_keyword(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.delete_keyword(user.id(), id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_keyword_trims_and_bounds() {
        let request = CreateKeywordRequest {
            keyword: "  moonlight ".to_string(),
            search_results: None,
        };
        assert_eq!(request.validate().unwrap().keyword, "moonlight");

        let blank = CreateKeywordRequest {
            keyword: "   ".to_string(),
            search_results: None,
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_keyword_patch_rejects_out_of_range_weight() {
        let patch = KeywordPatch {
            weight: Some(2.5),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
