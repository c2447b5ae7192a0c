pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;

use crate::auth::handlers as auth;
use crate::feedback::handlers as feedback;
use crate::generation::handlers as generation;
use crate::library::{keywords, melodies};
use crate::lyrics::handlers as lyrics;
use crate::preferences::handlers as preferences;
use crate::state::AppState;

/// Body of mutations that have nothing richer to return.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/me", get(auth::handle_me))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        // Library
        .route(
            "/api/v1/keywords",
            get(keywords::handle_list_keywords).post(keywords::handle_create_keyword),
        )
        .route(
            "/api/v1/keywords/:id",
            patch(keywords::handle_update_keyword).delete(keywords::handle_delete_keyword),
        )
        .route(
            "/api/v1/melodies",
            get(melodies::handle_list_melodies).post(melodies::handle_create_melody),
        )
        .route(
            "/api/v1/melodies/:id",
            patch(melodies::handle_update_melody).delete(melodies::handle_delete_melody),
        )
        // Generation
        .route(
            "/api/v1/generate/expand-keywords",
            post(generation::handle_expand_keywords),
        )
        .route(
            "/api/v1/generate/lyrics",
            post(generation::handle_generate_lyrics),
        )
        // Lyrics
        .route(
            "/api/v1/lyrics",
            get(lyrics::handle_list_lyrics).post(lyrics::handle_create_lyric),
        )
        .route(
            "/api/v1/lyrics/:id",
            get(lyrics::handle_get_lyric)
                .patch(lyrics::handle_update_lyric)
                .delete(lyrics::handle_delete_lyric),
        )
        .route(
            "/api/v1/lyrics/:id/feedback",
            get(lyrics::handle_lyric_feedback),
        )
        .route("/api/v1/lyrics/:id/cue", get(lyrics::handle_cue))
        // Preferences
        .route(
            "/api/v1/preferences",
            get(preferences::handle_get_preferences).put(preferences::handle_upsert_preferences),
        )
        // Feedback
        .route(
            "/api/v1/feedback",
            get(feedback::handle_list_feedback).post(feedback::handle_create_feedback),
        )
        .with_state(state)
}
