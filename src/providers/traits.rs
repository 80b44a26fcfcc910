//! Model backend contract and reply-shape normalization.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::sessions::Message;

/// Failure modes of a model backend call.
///
/// Malformed-but-parseable replies are not an error: they are absorbed by
/// [`ReplyShape`] normalization. Only a call that produces no reply at all
/// (network failure, timeout, non-success status) surfaces here.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model backend unavailable: {0}")]
    Unavailable(String),
}

/// A generative-text backend: full transcript in, reply text out.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Invoke the backend with the directive-plus-history transcript.
    async fn chat(&self, model: &str, messages: &[Message]) -> Result<String, ProviderError>;

    /// The name of this provider implementation.
    fn name(&self) -> &str;
}

/// The reply shapes a backend may produce, classified explicitly rather than
/// probed field-by-field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    /// The whole response body is the reply text.
    Text(String),
    /// An object carrying the reply under one of the recognized keys.
    Keyed(String),
    /// Nothing usable — the raw response is serialized as the reply rather
    /// than failing the turn.
    Unrecognized(String),
}

/// Keys checked, in order, when the backend replies with an object.
const RECOGNIZED_REPLY_KEYS: [&str; 4] = ["response", "output_text", "reply", "text"];

impl ReplyShape {
    /// Classify a backend response value.
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::String(text) if !text.is_empty() => Self::Text(text.clone()),
            Value::Object(fields) => {
                for key in RECOGNIZED_REPLY_KEYS {
                    if let Some(Value::String(text)) = fields.get(key) {
                        if !text.is_empty() {
                            return Self::Keyed(text.clone());
                        }
                    }
                }
                Self::Unrecognized(value.to_string())
            }
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The normalized reply text.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Keyed(text) | Self::Unrecognized(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_is_text() {
        let shape = ReplyShape::classify(&json!("hello"));
        assert_eq!(shape, ReplyShape::Text("hello".into()));
    }

    #[test]
    fn response_key_is_recognized() {
        let shape = ReplyShape::classify(&json!({"response": "from response"}));
        assert_eq!(shape.into_text(), "from response");
    }

    #[test]
    fn output_text_key_is_recognized() {
        let shape = ReplyShape::classify(&json!({"output_text": "from output_text"}));
        assert_eq!(shape.into_text(), "from output_text");
    }

    #[test]
    fn response_key_wins_over_output_text() {
        let shape = ReplyShape::classify(&json!({
            "output_text": "second",
            "response": "first"
        }));
        assert_eq!(shape.into_text(), "first");
    }

    #[test]
    fn empty_string_field_is_skipped() {
        let shape = ReplyShape::classify(&json!({"response": "", "text": "fallback"}));
        assert_eq!(shape.into_text(), "fallback");
    }

    #[test]
    fn unrecognized_object_serializes_raw() {
        let shape = ReplyShape::classify(&json!({"tokens": 12, "done": true}));
        match shape {
            ReplyShape::Unrecognized(raw) => {
                assert!(raw.contains("tokens"));
                assert!(raw.contains("12"));
            }
            other => panic!("expected unrecognized shape, got {other:?}"),
        }
    }

    #[test]
    fn non_object_non_string_serializes_raw() {
        assert_eq!(ReplyShape::classify(&json!(42)).into_text(), "42");
        assert_eq!(ReplyShape::classify(&json!(null)).into_text(), "null");
    }
}
