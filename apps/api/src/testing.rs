//! Test doubles shared by unit and router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Config;
use crate::generation::prompts::{KEYWORD_EXPANSION_SYSTEM, LYRICIST_SYSTEM, TRANSLATOR_SYSTEM};
use crate::llm_client::{ChatMessage, ChatModel, LlmError, LlmResponse, ResponseFormat};
use crate::state::AppState;
use crate::store::MemoryStore;

struct RecordedCall {
    system: String,
    user: String,
    response_format: Option<Value>,
}

/// Answers by system prompt: expansion, generation or translation.
pub struct ScriptedModel {
    expansion_content: Option<Value>,
    lyric_content: Option<Value>,
    translation_fails: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub const TRANSLATION: &'static str = "港口的雨\n海上的灯";

    pub fn new() -> Self {
        let lyric = json!({
            "title": "Harbor Rain",
            "lyrics": "Rain on the harbor\nLights on the sea",
            "timingData": [
                {"line": "Rain on the harbor", "startTime": 0, "duration": 3000},
                {"line": "Lights on the sea", "startTime": 3000, "duration": 3000}
            ]
        });
        Self {
            expansion_content: Some(Value::Null),
            lyric_content: Some(Value::String(lyric.to_string())),
            translation_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_expansion(mut self) -> Self {
        self.expansion_content = None;
        self
    }

    pub fn with_expansion_content(mut self, content: Value) -> Self {
        self.expansion_content = Some(content);
        self
    }

    pub fn failing_generation(mut self) -> Self {
        self.lyric_content = None;
        self
    }

    pub fn with_lyric_content(mut self, content: Value) -> Self {
        self.lyric_content = Some(content);
        self
    }

    pub fn failing_translation(mut self) -> Self {
        self.translation_fails = true;
        self
    }

    pub fn calls_to(&self, system: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.system == system)
            .count()
    }

    pub fn last_user_prompt(&self, system: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.system == system)
            .map(|c| c.user.clone())
    }

    pub fn last_response_format(&self, system: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.system == system)
            .and_then(|c| c.response_format.clone())
    }
}

fn unavailable() -> LlmError {
    LlmError::Api {
        status: 503,
        message: "scripted outage".to_string(),
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        response_format: Option<&ResponseFormat>,
    ) -> Result<LlmResponse, LlmError> {
        let system = messages[0].content.clone();
        let user = messages[1].content.clone();
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.clone(),
            user: user.clone(),
            response_format: response_format.map(|f| serde_json::to_value(f).unwrap()),
        });

        match system.as_str() {
            KEYWORD_EXPANSION_SYSTEM => match &self.expansion_content {
                None => Err(unavailable()),
                Some(Value::Null) => {
                    let keyword = user.rsplit(": ").next().unwrap_or_default();
                    Ok(LlmResponse::with_content(json!(format!("Expanded: {keyword}"))))
                }
                Some(content) => Ok(LlmResponse::with_content(content.clone())),
            },
            LYRICIST_SYSTEM => match &self.lyric_content {
                None => Err(unavailable()),
                Some(content) => Ok(LlmResponse::with_content(content.clone())),
            },
            TRANSLATOR_SYSTEM if self.translation_fails => Err(unavailable()),
            TRANSLATOR_SYSTEM => Ok(LlmResponse::with_content(json!(Self::TRANSLATION))),
            other => panic!("unexpected system prompt: {other}"),
        }
    }
}

/// Application state over a fresh `MemoryStore`.
pub fn test_state(model: ScriptedModel) -> AppState {
    AppState {
        store: Arc::new(MemoryStore::new()),
        llm: Arc::new(model),
        config: Config::test_defaults(),
    }
}
