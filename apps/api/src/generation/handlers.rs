//! Axum route handlers for the Generation API.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::generation::generator::{generate_lyrics, LyricRequest};
use crate::generation::keywords::expand_keywords;
use crate::generation::languages::join_codes;
use crate::models::lyric::{Lyric, NewLyric};
use crate::state::AppState;
use crate::validation::{normalize_list, require_non_empty_list, require_text, Validate, ValidJson};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExpandKeywordsRequest {
    pub keywords: Vec<String>,
}

impl Validate for ExpandKeywordsRequest {
    fn validate(self) -> Result<Self, AppError> {
        Ok(Self {
            keywords: normalize_list(self.keywords),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLyricsRequest {
    pub keywords: Vec<String>,
    pub melody_description: String,
    pub languages: Vec<String>,
    pub is_mixed: bool,
    /// Library rows the keywords were picked from, kept as provenance.
    pub keyword_ids: Option<Vec<i64>>,
    pub melody_id: Option<i64>,
}

impl Validate for GenerateLyricsRequest {
    fn validate(mut self) -> Result<Self, AppError> {
        self.keywords = require_non_empty_list("keywords", self.keywords)?;
        require_text("melodyDescription", &self.melody_description)?;
        self.languages = require_non_empty_list("languages", self.languages)?;
        Ok(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate/expand-keywords
///
/// Preview of the keyword context the generator would use. Never fails on
/// model errors: unexpanded keywords map to themselves.
pub async fn handle_expand_keywords(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidJson(request): ValidJson<ExpandKeywordsRequest>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    Ok(Json(
        expand_keywords(state.llm.as_ref(), &request.keywords).await,
    ))
}

/// POST /api/v1/generate/lyrics
///
/// Full pipeline: keyword expansion → structured lyric generation →
/// translation when Chinese was not requested → persist.
/// Returns the stored lyric with score 0 and weight 1.0.
pub async fn handle_generate_lyrics(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<GenerateLyricsRequest>,
) -> Result<Json<Lyric>, AppError> {
    let lyric_request = LyricRequest {
        keywords: request.keywords,
        melody_description: request.melody_description,
        languages: request.languages,
        is_mixed: request.is_mixed,
    };

    let generated = generate_lyrics(state.llm.as_ref(), &lyric_request).await?;

    let lyric = state
        .store
        .create_lyric(NewLyric {
            user_id: user.id(),
            title: Some(generated.title),
            content: generated.content,
            languages: join_codes(&lyric_request.languages),
            is_mixed: lyric_request.is_mixed,
            translation: generated.translation,
            keyword_ids: request.keyword_ids,
            melody_id: request.melody_id,
            timing_data: Some(generated.timing_data),
        })
        .await?;

    Ok(Json(lyric))
}
