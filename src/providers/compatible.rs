//! Generic OpenAI-compatible provider.
//! Most hosted LLM APIs follow the same `/v1/chat/completions` format; one
//! implementation covers all of them.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{Provider, ProviderError, ReplyShape};
use crate::sessions::{Message, Role};

/// A provider that speaks the OpenAI-compatible chat completions API.
pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f64,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>, temperature: f64) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(ToString::to_string),
            temperature,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build the chat completions URL, accepting base URLs that already
    /// include the full endpoint path.
    fn chat_completions_url(&self) -> String {
        if self
            .base_url
            .trim_end_matches('/')
            .ends_with("/chat/completions")
        {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    async fn chat(&self, model: &str, messages: &[Message]) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: wire_role(m.role),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
        };

        let mut builder = self.client.post(self.chat_completions_url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable(format!(
                "{} returned {status}: {}",
                self.name,
                super::sanitize_api_error(&body)
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("unreadable response body: {e}")))?;

        // Primary shape: choices[0].message.content. Anything else goes
        // through the generic reply-shape classification, which never fails.
        if let Ok(parsed) = serde_json::from_value::<ApiChatResponse>(raw.clone()) {
            if let Some(content) = parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
            {
                if !content.is_empty() {
                    return Ok(content);
                }
            }
        }

        Ok(ReplyShape::classify(&raw).into_text())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
