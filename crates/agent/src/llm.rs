use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use storefront_core::domain::conversation::ConversationTurn;
use thiserror::Error;
use tracing::{debug, warn};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Body of an OpenAI-compatible `chat/completions` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionReply {
    pub content: Option<String>,
    pub model: Option<String>,
}

impl CompletionReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), model: None }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("authentication rejected by completion api (status {status})")]
    Authentication { status: u16 },
    #[error("rate limited by completion api")]
    RateLimited,
    #[error("completion api returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
    #[error("invalid completion client configuration: {0}")]
    Configuration(String),
}

impl LlmError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Authentication { .. } => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Upstream { .. } => "upstream",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Configuration(_) => "configuration",
        }
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::Authentication { status: status.as_u16() }
            }
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            other => Self::Upstream { status: other.as_u16(), body: truncate(body) },
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply, LlmError>;
}

/// Client for any endpoint speaking the OpenAI chat-completions dialect
/// (Hugging Face router, OpenAI, local servers).
pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: Url,
    api_key: SecretString,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        validate_base_url(base_url)?;

        let endpoint = Url::parse(&format!("{}/chat/completions", base_url.trim_end_matches('/')))
            .map_err(|error| LlmError::Configuration(format!("invalid base_url: {error}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LlmError::Configuration(format!("http client: {error}")))?;

        Ok(Self { client, endpoint, api_key })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatCompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply, LlmError> {
        debug!(
            event_name = "llm.completion.send",
            model = %request.model,
            turns = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(LlmError::from_transport)?;

        if !status.is_success() {
            warn!(
                event_name = "llm.completion.rejected",
                status = status.as_u16(),
                "completion api returned a non-success status"
            );
            return Err(LlmError::from_status(status, &body));
        }

        let decoded: ChatCompletionBody = serde_json::from_str(&body)
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;

        let content = decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        Ok(CompletionReply { content, model: decoded.model })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    #[serde(default)]
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Remote endpoints must use https; plain http is accepted for local servers only.
fn validate_base_url(base_url: &str) -> Result<(), LlmError> {
    let parsed = Url::parse(base_url)
        .map_err(|error| LlmError::Configuration(format!("invalid base_url `{base_url}`: {error}")))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let host = parsed.host_str().unwrap_or("");
            if matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1") {
                Ok(())
            } else {
                Err(LlmError::Configuration(format!(
                    "http is only permitted for localhost, use https for `{base_url}`"
                )))
            }
        }
        other => Err(LlmError::Configuration(format!(
            "unsupported url scheme `{other}` in base_url `{base_url}`"
        ))),
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}
