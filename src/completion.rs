use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{timeout, Duration};

pub const SYSTEM_PROMPT: &str = "You are an excellent writer and you have been tasked with writing a story about a topic base from the style requested by the user.";

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    api_key: String,
    base_url: String,
    model: String,
    timeout_ms: u64,
}

impl CompletionConfig {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout_ms,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Failure of a single generation call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("Request timed out.")]
    Timeout,
    #[error("{message}")]
    RateLimited { message: String },
    #[error("{message}")]
    Status { code: u16, message: String },
    #[error("failed to reach completion API: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to decode completion response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// A text-completion backend: one system instruction, one user prompt, one
/// block of text back. An empty string is a valid answer.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI and API-compatible servers.
pub struct OpenAiCompletion {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiCompletion {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn request(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        let payload = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        parse_completion(&body)
    }
}

#[async_trait]
impl Completion for OpenAiCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        if !self.config.has_api_key() {
            return Err(CompletionError::MissingApiKey);
        }

        timeout(
            Duration::from_millis(self.config.timeout_ms),
            self.request(system, prompt),
        )
        .await
        .map_err(|_| CompletionError::Timeout)?
    }
}

fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|err| CompletionError::Decode(err.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Decode("response contained no choices".to_string()))?;

    Ok(choice.message.content.unwrap_or_default())
}

fn status_error(status: StatusCode, body: &str) -> CompletionError {
    let message = upstream_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.to_string()
        } else {
            trimmed.to_string()
        }
    });

    if status == StatusCode::TOO_MANY_REQUESTS {
        CompletionError::RateLimited { message }
    } else {
        CompletionError::Status {
            code: status.as_u16(),
            message,
        }
    }
}

// OpenAI error bodies look like {"error": {"message": "..."}}.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"]
        .as_str()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
