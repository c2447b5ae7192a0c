use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Lower and upper bounds of a lyric's satisfaction score.
pub const SCORE_MIN: i32 = -10;
pub const SCORE_MAX: i32 = 10;

/// Bounds shared by every weight column (lyrics, keywords, melodies).
pub const WEIGHT_MIN: f64 = 0.1;
pub const WEIGHT_MAX: f64 = 2.0;

pub const DEFAULT_WEIGHT: f64 = 1.0;

/// One displayed line and when it plays, in milliseconds from the start of the song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimingEntry {
    pub line: String,
    #[serde(deserialize_with = "millis")]
    pub start_time: i64,
    #[serde(deserialize_with = "millis")]
    pub duration: i64,
}

impl TimingEntry {
    pub fn end_time(&self) -> i64 {
        self.start_time.saturating_add(self.duration)
    }
}

/// Upper bound for any timing offset or duration: about 49 days.
const MAX_TIMING_MS: f64 = u32::MAX as f64;

/// Models answer with JSON numbers that are sometimes fractional; offsets are
/// stored as whole milliseconds.
fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(D::Error::custom(
            "timing values must be non-negative milliseconds",
        ));
    }
    if value > MAX_TIMING_MS {
        return Err(D::Error::custom(format!(
            "timing value {value} exceeds {MAX_TIMING_MS} milliseconds"
        )));
    }
    Ok(value.round() as i64)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lyric {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub content: String,
    /// Comma-joined language codes, e.g. `zh,en,ja`.
    pub languages: String,
    pub is_mixed: bool,
    pub translation: Option<String>,
    pub keyword_ids: Option<Vec<i64>>,
    pub melody_id: Option<i64>,
    pub timing_data: Option<Json<Vec<TimingEntry>>>,
    pub satisfaction_score: i32,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lyric {
    pub fn timing(&self) -> &[TimingEntry] {
        self.timing_data.as_ref().map(|t| t.0.as_slice()).unwrap_or(&[])
    }
}

/// Insert shape; score and weight always start at 0 / 1.0.
#[derive(Debug, Clone)]
pub struct NewLyric {
    pub user_id: i64,
    pub title: Option<String>,
    pub content: String,
    pub languages: String,
    pub is_mixed: bool,
    pub translation: Option<String>,
    pub keyword_ids: Option<Vec<i64>>,
    pub melody_id: Option<i64>,
    pub timing_data: Option<Vec<TimingEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub satisfaction_score: Option<i32>,
    pub weight: Option<f64>,
    pub timing_data: Option<Vec<TimingEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_entry_accepts_fractional_millis() {
        let entry: TimingEntry =
            serde_json::from_str(r#"{"line": "la", "startTime": 1500.4, "duration": 2999.6}"#)
                .unwrap();
        assert_eq!(entry.start_time, 1500);
        assert_eq!(entry.duration, 3000);
        assert_eq!(entry.end_time(), 4500);
    }

    #[test]
    fn test_timing_entry_rejects_negative_offsets() {
        let result: Result<TimingEntry, _> =
            serde_json::from_str(r#"{"line": "la", "startTime": -1, "duration": 100}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_timing_entry_rejects_oversized_offsets() {
        let result: Result<TimingEntry, _> =
            serde_json::from_str(r#"{"line": "la", "startTime": 1e30, "duration": 5}"#);
        assert!(result.is_err());

        let at_limit: TimingEntry = serde_json::from_str(
            r#"{"line": "la", "startTime": 4294967295, "duration": 4294967295}"#,
        )
        .unwrap();
        assert_eq!(at_limit.end_time(), 2 * 4_294_967_295);
    }

    #[test]
    fn test_end_time_saturates() {
        let entry = TimingEntry {
            line: "la".to_string(),
            start_time: i64::MAX,
            duration: 1,
        };
        assert_eq!(entry.end_time(), i64::MAX);
    }

    #[test]
    fn test_timing_entry_rejects_extra_fields() {
        let result: Result<TimingEntry, _> = serde_json::from_str(
            r#"{"line": "la", "startTime": 0, "duration": 100, "speaker": "a"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_timing_entry_serializes_camel_case() {
        let entry = TimingEntry {
            line: "first".to_string(),
            start_time: 0,
            duration: 3000,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["startTime"], 0);
        assert_eq!(value["duration"], 3000);
    }
}
