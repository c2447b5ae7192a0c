use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend chosen at startup (Postgres, memory, or none).
    pub store: Arc<dyn Store>,
    /// Pluggable model. Default: `LlmClient`; tests script answers.
    pub llm: Arc<dyn ChatModel>,
    pub config: Config,
}
