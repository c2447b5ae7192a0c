use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which `Store` implementation the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
    /// No database: reads come back empty, writes fail.
    None,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            other => bail!("STORAGE_BACKEND must be postgres, memory or none (got '{other}')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_max_attempts: u32,
    /// Open id promoted to `admin` on login.
    pub owner_open_id: Option<String>,
    pub session_cookie_name: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let database_url = optional_env("DATABASE_URL");
        let storage = match optional_env("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None if database_url.is_some() => StorageBackend::Postgres,
            None => StorageBackend::Memory,
        };
        if storage == StorageBackend::Postgres && database_url.is_none() {
            bail!("STORAGE_BACKEND=postgres requires DATABASE_URL");
        }

        Ok(Config {
            storage,
            database_url,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_api_url: optional_env("LLM_API_URL")
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            llm_max_attempts: optional_env("LLM_MAX_ATTEMPTS")
                .unwrap_or_else(|| "1".to_string())
                .parse::<u32>()
                .context("LLM_MAX_ATTEMPTS must be a positive integer")?,
            owner_open_id: optional_env("OWNER_OPEN_ID"),
            session_cookie_name: optional_env("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| "app_session_id".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    #[cfg(test)]
    pub fn test_defaults() -> Self {
        Config {
            storage: StorageBackend::Memory,
            database_url: None,
            llm_api_key: "test-key".to_string(),
            llm_api_url: "http://localhost:0".to_string(),
            llm_model: "test-model".to_string(),
            llm_max_attempts: 1,
            owner_open_id: Some("owner-open-id".to_string()),
            session_cookie_name: "app_session_id".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and empty both read as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parses_case_insensitively() {
        assert_eq!("Postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("none".parse::<StorageBackend>().unwrap(), StorageBackend::None);
    }

    #[test]
    fn test_storage_backend_rejects_unknown() {
        assert!("mysql".parse::<StorageBackend>().is_err());
    }
}
