//! Keyword expansion: best-effort enrichment before the main generation call.
//!
//! One LLM call per distinct keyword, awaited in order. A failed call (transport
//! error, missing or non-string content) falls back to the keyword itself and
//! never aborts the batch.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::generation::prompts::{
    fill_template, KEYWORD_EXPANSION_PROMPT_TEMPLATE, KEYWORD_EXPANSION_SYSTEM,
};
use crate::llm_client::{ChatMessage, ChatModel, LlmError};

/// Returns `keyword → expansion`. Repeated keywords collapse onto one entry.
pub async fn expand_keywords(llm: &dyn ChatModel, keywords: &[String]) -> BTreeMap<String, String> {
    let mut expanded = BTreeMap::new();

    for keyword in keywords {
        if expanded.contains_key(keyword) {
            continue;
        }

        let expansion = match expand_one(llm, keyword).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to expand keyword {:?}: {e}", keyword);
                keyword.clone()
            }
        };
        expanded.insert(keyword.clone(), expansion);
    }

    expanded
}

async fn expand_one(llm: &dyn ChatModel, keyword: &str) -> Result<String, LlmError> {
    let messages = [
        ChatMessage::system(KEYWORD_EXPANSION_SYSTEM),
        ChatMessage::user(fill_template(
            KEYWORD_EXPANSION_PROMPT_TEMPLATE,
            &[("keyword", keyword)],
        )),
    ];

    let response = llm.invoke(&messages, None).await?;
    response
        .text()
        .map(str::to_string)
        .ok_or(LlmError::EmptyContent)
}

/// Bullet block for the generation prompt, one line per distinct keyword in
/// caller order: `- keyword: expansion`.
pub fn keyword_context(keywords: &[String], expanded: &BTreeMap<String, String>) -> String {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for keyword in keywords {
        if !seen.insert(keyword.as_str()) {
            continue;
        }
        let expansion = expanded.get(keyword).unwrap_or(keyword);
        lines.push(format!("- {keyword}: {expansion}"));
    }
    lines.join("\n")
}
