use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Runtime configuration, read from the environment (a `.env` file is
/// loaded by the binaries before this runs, see `env.example`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub database_path: PathBuf,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key =
            env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingEnv("OPENAI_API_KEY"))?;

        Ok(Self {
            openai_api_key,
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            embedding_model: env_or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
            chat_model: env_or("OPENAI_CHAT_MODEL", "gpt-4-turbo-preview"),
            database_path: PathBuf::from(env_or("PDF_CHAT_DATABASE", "pdf-chat.db")),
            bind_addr: env_or("PDF_CHAT_ADDR", "0.0.0.0:8000"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
