use std::env;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};

pub const DEFAULT_BACKEND_URL: &str = "https://inference.api.nscale.com/v1/chat/completions";
pub const DEFAULT_BACKEND_MODEL: &str = "openai/gpt-oss-20b";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub json_payload_limit: usize,
    pub backend_url: String,
    pub backend_token: SecretString,
    pub backend_model: String,
    pub backend_timeout_seconds: u64,
    pub pipeline: PipelineConfig,
}

/// Tunables of the generation and refine pipelines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Source text embedded in a generation prompt is cut to this many characters.
    pub max_source_chars: usize,
    pub refine_chunk_size: usize,
    pub grading_snippet_chars: usize,
    pub mcq_exclusions: usize,
    pub open_exclusions: usize,
    pub multi_exclusions: usize,
    /// Normalized stems longer than this also match by substring containment.
    pub duplicate_containment_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_source_chars: 20_000,
            refine_chunk_size: 8_000,
            grading_snippet_chars: 12_000,
            mcq_exclusions: 100,
            open_exclusions: 100,
            multi_exclusions: 150,
            duplicate_containment_threshold: 20,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_source_chars: env_parse("PIPELINE_MAX_SOURCE_CHARS", default.max_source_chars),
            refine_chunk_size: env_parse("PIPELINE_REFINE_CHUNK_SIZE", default.refine_chunk_size),
            grading_snippet_chars: env_parse(
                "PIPELINE_GRADING_SNIPPET_CHARS",
                default.grading_snippet_chars,
            ),
            mcq_exclusions: env_parse("PIPELINE_MCQ_EXCLUSIONS", default.mcq_exclusions),
            open_exclusions: env_parse("PIPELINE_OPEN_EXCLUSIONS", default.open_exclusions),
            multi_exclusions: env_parse("PIPELINE_MULTI_EXCLUSIONS", default.multi_exclusions),
            duplicate_containment_threshold: default.duplicate_containment_threshold,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "pass-quiz".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env_parse("WEB_SERVER_PORT", 8080),
            json_payload_limit: env_parse("JSON_PAYLOAD_LIMIT", 4 * 1024 * 1024),
            backend_url: env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            backend_token: SecretString::from(env::var("BACKEND_TOKEN").unwrap_or_default()),
            backend_model: env::var("BACKEND_MODEL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_MODEL.to_string()),
            backend_timeout_seconds: env_parse("BACKEND_TIMEOUT_SECONDS", 300),
            pipeline: PipelineConfig::from_env(),
        }
    }

    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.backend_token.expose_secret().trim().is_empty() {
            return Err(AppError::InternalError(
                "BACKEND_TOKEN is not set".to_string(),
            ));
        }

        if self.pipeline.refine_chunk_size == 0 || self.pipeline.max_source_chars == 0 {
            return Err(AppError::InternalError(
                "pipeline sizes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "pass-quiz-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            json_payload_limit: 1024 * 1024,
            backend_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            backend_token: SecretString::from("test_token".to_string()),
            backend_model: DEFAULT_BACKEND_MODEL.to_string(),
            backend_timeout_seconds: 5,
            pipeline: PipelineConfig::default(),
        }
    }
}
