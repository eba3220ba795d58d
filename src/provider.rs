use crate::config::AiProviderConfig;
use crate::constants::{MAX_PROVIDER_RETRIES, OPENAI_CHAT_URL, PROVIDER_TIMEOUT_SECS};
use crate::warning;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// one role-tagged message in a generation request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    /// transient, retried with backoff
    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider retries exhausted after {0} attempts")]
    RetriesExhausted(u32),

    #[error("provider request failed: {0}")]
    Http(#[source] Box<ureq::Error>),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// the text-generation collaborator
pub trait Provider {
    fn send(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, ProviderError>;
}

/// blocking client for the OpenAI chat completions API
///
/// constructed from an explicit provider config, never from ambient
/// credential state
pub struct OpenAiClient {
    agent: ureq::Agent,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(config: &AiProviderConfig) -> Result<Self, ProviderError> {
        if !config.name.eq_ignore_ascii_case("openai") {
            return Err(ProviderError::UnsupportedProvider(config.name.clone()));
        }
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(PROVIDER_TIMEOUT_SECS)))
            .build()
            .into();
        Ok(Self {
            agent,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: MAX_PROVIDER_RETRIES,
        })
    }

    fn request(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let mut response = self
            .agent
            .post(OPENAI_CHAT_URL)
            .header("authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::StatusCode(429) => ProviderError::RateLimited,
                ureq::Error::StatusCode(code) => ProviderError::Status(code),
                other => ProviderError::Http(Box::new(other)),
            })?;

        let parsed: ChatResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        Ok(content.trim().to_string())
    }
}

impl Provider for OpenAiClient {
    fn send(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, ProviderError> {
        retry_on_rate_limit(self.max_retries, || self.request(messages, temperature))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
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
    content: String,
}

/// retry on rate limiting with exponential backoff, sleeping 2^attempt
/// seconds before each retry; any other error propagates immediately
pub(crate) fn retry_on_rate_limit<T>(
    max_attempts: u32,
    mut attempt: impl FnMut() -> Result<T, ProviderError>,
) -> Result<T, ProviderError> {
    let mut attempts = 0;
    loop {
        if attempts >= max_attempts {
            return Err(ProviderError::RetriesExhausted(max_attempts));
        }
        match attempt() {
            Ok(value) => return Ok(value),
            Err(ProviderError::RateLimited) => {
                let wait = Duration::from_secs(1u64 << attempts);
                warning!("rate limited by provider, retrying in {}s...", wait.as_secs());
                std::thread::sleep(wait);
                attempts += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
