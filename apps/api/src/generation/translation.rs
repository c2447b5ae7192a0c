//! Lyric translation. Best-effort: any failure hands back the original text.

use tracing::warn;

use crate::generation::languages::language_name;
use crate::generation::prompts::{fill_template, TRANSLATION_PROMPT_TEMPLATE, TRANSLATOR_SYSTEM};
use crate::llm_client::{ChatMessage, ChatModel, LlmError};

/// Translates `lyrics` into the language named by `target_code`.
/// Never fails; on error or non-string content the input is returned unchanged.
pub async fn translate_lyrics(llm: &dyn ChatModel, lyrics: &str, target_code: &str) -> String {
    match request_translation(llm, lyrics, target_code).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to translate lyrics to {target_code}: {e}");
            lyrics.to_string()
        }
    }
}

async fn request_translation(
    llm: &dyn ChatModel,
    lyrics: &str,
    target_code: &str,
) -> Result<String, LlmError> {
    let prompt = fill_template(
        TRANSLATION_PROMPT_TEMPLATE,
        &[("language", language_name(target_code)), ("lyrics", lyrics)],
    );
    let messages = [ChatMessage::system(TRANSLATOR_SYSTEM), ChatMessage::user(prompt)];

    let response = llm.invoke(&messages, None).await?;
    response
        .text()
        .map(str::to_string)
        .ok_or(LlmError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[tokio::test]
    async fn test_translation_uses_language_name() {
        let model = ScriptedModel::new();
        let translated = translate_lyrics(&model, "hello\nworld", "ja").await;

        assert_eq!(translated, ScriptedModel::TRANSLATION);
        let prompt = model.last_user_prompt(TRANSLATOR_SYSTEM).unwrap();
        assert!(prompt.contains("to Japanese"), "prompt was {prompt}");
        assert!(prompt.ends_with("hello\nworld"));
    }

    #[tokio::test]
    async fn test_unknown_code_is_sent_raw() {
        let model = ScriptedModel::new();
        translate_lyrics(&model, "hello", "ko").await;
        let prompt = model.last_user_prompt(TRANSLATOR_SYSTEM).unwrap();
        assert!(prompt.contains("to ko."), "prompt was {prompt}");
    }

    #[tokio::test]
    async fn test_failure_returns_original() {
        let model = ScriptedModel::new().failing_translation();
        let translated = translate_lyrics(&model, "hello\nworld", "zh").await;
        assert_eq!(translated, "hello\nworld");
    }
}
