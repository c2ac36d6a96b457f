use std::env;

use crate::completion::CompletionConfig;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub completion: CompletionConfig,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Reads the service settings from the process environment. Unset or
    /// unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8000);

        let api_key = lookup("OPENAI_API_KEY").unwrap_or_default();

        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_ms = lookup("OPENAI_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60_000);

        let max_attempts = lookup("GENERATION_MAX_ATTEMPTS")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|attempts| *attempts > 0)
            .unwrap_or(RetryPolicy::DEFAULT_MAX_ATTEMPTS);

        Self {
            host,
            port,
            timeout_ms,
            completion: CompletionConfig::new(api_key, base_url, model, timeout_ms),
            retry: RetryPolicy::new(max_attempts),
        }
    }
}
