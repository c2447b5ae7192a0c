//! Request validation. Every mutating handler takes `ValidJson<T>`, so bodies
//! are checked and normalized before anything touches the store or the model.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;
use crate::models::lyric::{SCORE_MAX, SCORE_MIN, WEIGHT_MAX, WEIGHT_MIN};

/// Checks (and may normalize) a deserialized request body.
pub trait Validate: Sized {
    fn validate(self) -> Result<Self, AppError>;
}

/// `Json<T>` plus `Validate`. Malformed JSON, unknown enum values and failed
/// checks all answer with a structured `VALIDATION_ERROR`.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))?;
        Ok(ValidJson(value.validate()?))
    }
}

pub fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Length in characters, not bytes.
pub fn require_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}

pub fn require_weight(field: &str, weight: Option<f64>) -> Result<(), AppError> {
    match weight {
        Some(w) if !(WEIGHT_MIN..=WEIGHT_MAX).contains(&w) => Err(AppError::Validation(format!(
            "{field} must be between {WEIGHT_MIN} and {WEIGHT_MAX}"
        ))),
        _ => Ok(()),
    }
}

pub fn require_score(score: Option<i32>) -> Result<(), AppError> {
    match score {
        Some(s) if !(SCORE_MIN..=SCORE_MAX).contains(&s) => Err(AppError::Validation(format!(
            "satisfactionScore must be between {SCORE_MIN} and {SCORE_MAX}"
        ))),
        _ => Ok(()),
    }
}

/// Trims entries, drops blanks and repeats (first occurrence wins).
pub fn normalize_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

pub fn require_non_empty_list(field: &str, values: Vec<String>) -> Result<Vec<String>, AppError> {
    let values = normalize_list(values);
    if values.is_empty() {
        return Err(AppError::Validation(format!("{field} must contain at least one entry")));
    }
    Ok(values)
}

/// `" zh, en ,,ja"` → `"zh,en,ja"`; fails when no code remains.
pub fn normalize_language_codes(field: &str, joined: &str) -> Result<String, AppError> {
    let codes = require_non_empty_list(field, joined.split(',').map(str::to_string).collect())?;
    Ok(codes.join(","))
}
