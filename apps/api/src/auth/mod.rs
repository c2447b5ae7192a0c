//! Request identity.
//!
//! Sessions are issued by the upstream auth gateway, which forwards the
//! verified identity as headers. `AuthUser` turns those headers into a stored
//! `User`, creating the row on first sight and refreshing `last_signed_in`
//! on every request. Without a database the identity is served from the
//! headers alone.

pub mod handlers;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::errors::AppError;
use crate::models::user::{Role, User, UserUpsert};
use crate::state::AppState;
use crate::store::StoreError;

pub const OPEN_ID_HEADER: &str = "x-open-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const LOGIN_METHOD_HEADER: &str = "x-login-method";

#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let open_id = header(&parts.headers, OPEN_ID_HEADER).ok_or(AppError::Unauthorized)?;

        let role = match &state.config.owner_open_id {
            Some(owner) if *owner == open_id => Some(Role::Admin),
            _ => None,
        };

        let upsert = UserUpsert {
            open_id,
            name: header(&parts.headers, USER_NAME_HEADER),
            email: header(&parts.headers, USER_EMAIL_HEADER),
            login_method: header(&parts.headers, LOGIN_METHOD_HEADER),
            role,
        };

        let user = match state.store.upsert_user(upsert.clone()).await {
            Ok(user) => user,
            // Reads still work without a database; writes fail later on their own.
            Err(StoreError::Unavailable) => {
                let stored = state.store.get_user_by_open_id(&upsert.open_id).await?;
                stored.unwrap_or_else(|| User::transient(upsert))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(AuthUser(user))
    }
}

/// Trimmed, non-empty header value.
fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_ignores_blank_values() {
        let mut headers = HeaderMap::new();
        headers.insert(OPEN_ID_HEADER, HeaderValue::from_static("  "));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static(" Mei "));
        assert_eq!(header(&headers, OPEN_ID_HEADER), None);
        assert_eq!(header(&headers, USER_NAME_HEADER).as_deref(), Some("Mei"));
        assert_eq!(header(&headers, USER_EMAIL_HEADER), None);
    }
}
