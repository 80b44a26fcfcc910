//! Model backend providers.
//!
//! Each provider implements the [`Provider`] trait defined in [`traits`] and
//! is constructed through the factory function [`create_provider`] by its
//! canonical string key.

pub mod compatible;
pub mod traits;

pub use compatible::OpenAiCompatibleProvider;
pub use traits::{Provider, ProviderError, ReplyShape};

const MAX_API_ERROR_CHARS: usize = 200;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Scrub bearer-style secrets from backend error strings before they reach
/// logs or fallback messages.
fn scrub_secret_patterns(input: &str) -> String {
    let mut scrubbed = String::with_capacity(input.len());
    for token in input.split_whitespace() {
        if !scrubbed.is_empty() {
            scrubbed.push(' ');
        }
        if token.starts_with("sk-") && token.len() > 3 {
            scrubbed.push_str("[REDACTED]");
        } else {
            scrubbed.push_str(token);
        }
    }
    scrubbed
}

/// Sanitize API error text: scrub secrets, bound length.
pub(crate) fn sanitize_api_error(input: &str) -> String {
    crate::util::truncate_with_marker(&scrub_secret_patterns(input), MAX_API_ERROR_CHARS)
}

/// Resolve the API key from an explicit config value or the environment.
fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    if let Some(key) = configured {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }

    for env_var in ["DISPUTEFLOW_API_KEY", "API_KEY"] {
        if let Ok(value) = std::env::var(env_var) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Factory: create the configured provider, with an optional base URL
/// override for self-hosted OpenAI-compatible endpoints.
pub fn create_provider(
    name: &str,
    api_key: Option<&str>,
    api_url: Option<&str>,
    temperature: f64,
) -> anyhow::Result<Box<dyn Provider>> {
    let key = resolve_api_key(api_key);
    let base_url = api_url.unwrap_or(OPENAI_BASE_URL);

    match name.trim().to_ascii_lowercase().as_str() {
        "openai" => Ok(Box::new(OpenAiCompatibleProvider::new(
            "openai",
            base_url,
            key.as_deref(),
            temperature,
        ))),
        other => anyhow::bail!(
            "Unknown provider: {other}. Only \"openai\" (and OpenAI-compatible endpoints via api_url) is supported."
        ),
    }
}
