//! Lyric Generation: orchestrates the full generation pipeline.
//!
//! Flow: expand_keywords → keyword context block → language instruction →
//!       schema-constrained LLM call → parse → translate (when no `zh`).
//!
//! Expansion and translation degrade to fallbacks. The main call does not:
//! missing content, non-string content or a payload that does not match the
//! schema fails the whole generation.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::generation::keywords::{expand_keywords, keyword_context};
use crate::generation::languages::{language_list, needs_translation, TRANSLATION_TARGET};
use crate::generation::prompts::{
    fill_template, COHESIVE_LANGUAGE_TEMPLATE, LYRICIST_SYSTEM, LYRICS_PROMPT_TEMPLATE, LYRICS_SCHEMA_NAME,
    MIXED_LANGUAGE_TEMPLATE,
};
use crate::generation::translation::translate_lyrics;
use crate::llm_client::{strip_json_fences, ChatMessage, ChatModel, JsonSchemaSpec, LlmError, ResponseFormat};
use crate::models::lyric::TimingEntry;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Generation response had no text content")]
    EmptyContent,

    #[error("Generation response did not match the lyric schema: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Inputs to one generation run. Lists are already trimmed and non-empty.
#[derive(Debug, Clone)]
pub struct LyricRequest {
    pub keywords: Vec<String>,
    pub melody_description: String,
    pub languages: Vec<String>,
    pub is_mixed: bool,
}

/// What the generation pipeline hands back to the caller for persistence.
#[derive(Debug, Clone)]
pub struct GeneratedLyric {
    pub title: String,
    /// Newline-delimited lyric lines.
    pub content: String,
    pub translation: Option<String>,
    pub timing_data: Vec<TimingEntry>,
}

/// Exact shape the model must return under `lyric_response_format`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LyricPayload {
    title: String,
    lyrics: String,
    timing_data: Vec<TimingEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_lyrics(
    llm: &dyn ChatModel,
    request: &LyricRequest,
) -> Result<GeneratedLyric, GenerationError> {
    // Step 1: keyword context
    let expanded = expand_keywords(llm, &request.keywords).await;
    let context = keyword_context(&request.keywords, &expanded);

    // Steps 2–3: language instruction
    let instruction = language_instruction(&request.languages, request.is_mixed);

    // Step 4: structured generation call
    let prompt = build_lyrics_prompt(&context, &request.melody_description, &instruction);
    let messages = [ChatMessage::system(LYRICIST_SYSTEM), ChatMessage::user(prompt)];
    let format = lyric_response_format();

    let response = llm.invoke(&messages, Some(&format)).await?;

    // Step 5: parse, no partial success
    let text = response.text().ok_or(GenerationError::EmptyContent)?;
    let payload: LyricPayload = serde_json::from_str(strip_json_fences(text))?;
    warn_on_timing_gaps(&payload.timing_data);

    info!(
        "Generated lyric {:?}: {} lines, {} timing entries",
        payload.title,
        payload.lyrics.lines().count(),
        payload.timing_data.len()
    );

    // Step 6: translation when Chinese was not requested
    let translation = if needs_translation(&request.languages) {
        Some(translate_lyrics(llm, &payload.lyrics, TRANSLATION_TARGET).await)
    } else {
        None
    };

    Ok(GeneratedLyric {
        title: payload.title,
        content: payload.lyrics,
        translation,
        timing_data: payload.timing_data,
    })
}

pub fn language_instruction(languages: &[String], is_mixed: bool) -> String {
    let template = if is_mixed {
        MIXED_LANGUAGE_TEMPLATE
    } else {
        COHESIVE_LANGUAGE_TEMPLATE
    };
    fill_template(template, &[("languages", &language_list(languages))])
}

fn build_lyrics_prompt(keyword_context: &str, melody_description: &str, instruction: &str) -> String {
    fill_template(
        LYRICS_PROMPT_TEMPLATE,
        &[
            ("keyword_context", keyword_context),
            ("melody_description", melody_description),
            ("language_instruction", instruction),
        ],
    )
}

/// Strict JSON schema for the generation call: `title`, `lyrics` and
/// `timingData` required, no extra properties at either level.
pub fn lyric_response_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: JsonSchemaSpec {
            name: LYRICS_SCHEMA_NAME.to_string(),
            strict: true,
            schema: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "The title of the song" },
                    "lyrics": { "type": "string", "description": "The complete lyrics with line breaks" },
                    "timingData": {
                        "type": "array",
                        "description": "Timing information for each line",
                        "items": {
                            "type": "object",
                            "properties": {
                                "line": { "type": "string", "description": "The lyric line" },
                                "startTime": { "type": "number", "description": "Start time in milliseconds" },
                                "duration": { "type": "number", "description": "Duration in milliseconds" }
                            },
                            "required": ["line", "startTime", "duration"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["title", "lyrics", "timingData"],
                "additionalProperties": false
            }),
        },
    }
}

/// Timing entries are asked to be contiguous; the data is kept as returned,
/// but overlaps and reordering are logged.
fn warn_on_timing_gaps(entries: &[TimingEntry]) {
    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start_time < prev.end_time() {
            warn!(
                "Timing entry {:?} starts at {}ms, before previous line ends at {}ms",
                next.line.chars().take(40).collect::<String>(),
                next.start_time,
                prev.end_time()
            );
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prompts::{KEYWORD_EXPANSION_SYSTEM, TRANSLATOR_SYSTEM};
    use crate::testing::ScriptedModel;

    fn request(languages: &[&str], is_mixed: bool) -> LyricRequest {
        LyricRequest {
            keywords: vec!["rain".to_string(), "harbor".to_string()],
            melody_description: "slow piano ballad, 70 bpm".to_string(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            is_mixed,
        }
    }

    #[tokio::test]
    async fn test_english_lyrics_get_chinese_translation() {
        let model = ScriptedModel::new();
        let lyric = generate_lyrics(&model, &request(&["en"], false)).await.unwrap();

        assert_eq!(lyric.title, "Harbor Rain");
        assert_eq!(lyric.content, "Rain on the harbor\nLights on the sea");
        assert_eq!(lyric.translation.as_deref(), Some(ScriptedModel::TRANSLATION));
        assert_eq!(lyric.timing_data.len(), 2);
        assert_eq!(lyric.timing_data[1].start_time, 3000);
        assert_eq!(model.calls_to(TRANSLATOR_SYSTEM), 1);
    }

    #[tokio::test]
    async fn test_chinese_lyrics_skip_translation() {
        let model = ScriptedModel::new();
        let lyric = generate_lyrics(&model, &request(&["zh", "en"], true)).await.unwrap();

        assert!(lyric.translation.is_none());
        assert_eq!(model.calls_to(TRANSLATOR_SYSTEM), 0);
    }

    #[tokio::test]
    async fn test_prompt_embeds_context_melody_and_languages() {
        let model = ScriptedModel::new();
        generate_lyrics(&model, &request(&["en", "fr"], true)).await.unwrap();

        let prompt = model.last_user_prompt(LYRICIST_SYSTEM).unwrap();
        assert!(prompt.contains("- rain: Expanded: rain"));
        assert!(prompt.contains("- harbor: Expanded: harbor"));
        assert!(prompt.contains("slow piano ballad, 70 bpm"));
        assert!(prompt.contains("mixing these languages: English, French"));
        assert_eq!(model.calls_to(KEYWORD_EXPANSION_SYSTEM), 2);
    }

    #[tokio::test]
    async fn test_generation_call_carries_schema() {
        let model = ScriptedModel::new();
        generate_lyrics(&model, &request(&["zh"], false)).await.unwrap();

        let format = model.last_response_format(LYRICIST_SYSTEM).unwrap();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], LYRICS_SCHEMA_NAME);
        assert_eq!(
            format["json_schema"]["schema"]["required"],
            json!(["title", "lyrics", "timingData"])
        );
    }

    #[tokio::test]
    async fn test_expansion_failure_does_not_abort_generation() {
        let model = ScriptedModel::new().failing_expansion();
        let lyric = generate_lyrics(&model, &request(&["zh"], false)).await.unwrap();

        assert_eq!(lyric.title, "Harbor Rain");
        let prompt = model.last_user_prompt(LYRICIST_SYSTEM).unwrap();
        assert!(prompt.contains("- rain: rain"));
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_original_text() {
        let model = ScriptedModel::new().failing_translation();
        let lyric = generate_lyrics(&model, &request(&["en"], false)).await.unwrap();
        assert_eq!(lyric.translation.as_deref(), Some(lyric.content.as_str()));
    }

    #[tokio::test]
    async fn test_invalid_json_fails() {
        let model = ScriptedModel::new().with_lyric_content(json!("this is not json"));
        let result = generate_lyrics(&model, &request(&["zh"], false)).await;
        assert!(matches!(result, Err(GenerationError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_non_string_content_fails() {
        let model = ScriptedModel::new().with_lyric_content(json!({"title": "object, not text"}));
        let result = generate_lyrics(&model, &request(&["zh"], false)).await;
        assert!(matches!(result, Err(GenerationError::EmptyContent)));
    }

    #[tokio::test]
    async fn test_missing_timing_data_fails() {
        let body = json!({"title": "t", "lyrics": "a\nb"}).to_string();
        let model = ScriptedModel::new().with_lyric_content(json!(body));
        let result = generate_lyrics(&model, &request(&["zh"], false)).await;
        assert!(matches!(result, Err(GenerationError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_llm_error_fails() {
        let model = ScriptedModel::new().failing_generation();
        let result = generate_lyrics(&model, &request(&["zh"], false)).await;
        assert!(matches!(result, Err(GenerationError::Llm(_))));
    }

    #[test]
    fn test_cohesive_instruction() {
        let instruction = language_instruction(&["ja".to_string(), "ko".to_string()], false);
        assert!(instruction.starts_with("Create lyrics primarily in Japanese, ko."));
        assert!(instruction.contains("keep it cohesive"));
    }
}
