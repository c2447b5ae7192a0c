use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};

use crate::auth::AuthUser;
use crate::models::user::User;
use crate::routes::SuccessResponse;
use crate::state::AppState;

/// GET /api/v1/auth/me
///
/// The current user, or `null` when the request carries no identity.
pub async fn handle_me(user: Option<AuthUser>) -> Json<Option<User>> {
    Json(user.map(|AuthUser(user)| user))
}

/// POST /api/v1/auth/logout
///
/// Expires the session cookie. The gateway owns the session itself.
pub async fn handle_logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=None; Secure",
        state.config.session_cookie_name
    );
    (AppendHeaders([(SET_COOKIE, cookie)]), Json(SuccessResponse::ok()))
}
