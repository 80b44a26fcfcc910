//! HTTP gateway: axum server wiring for the chat boundary.

pub mod api;
pub mod page;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};
use tracing::info;

use crate::config::{Config, DEFAULT_MODEL};
use crate::providers::create_provider;
use crate::routing::SessionRouter;
use crate::sessions::create_session_store;

/// Request bodies beyond this are rejected before JSON parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Outer request deadline. The model call carries its own client timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Shared state for all gateway handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SessionRouter>,
}

/// Build the gateway route table over the given session router.
pub fn build_app(router: Arc<SessionRouter>) -> Router {
    let state = AppState { router };

    Router::new()
        .route("/", get(api::handle_index))
        .route("/api/chat", post(api::handle_chat))
        .route("/state", get(api::handle_state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Assemble the session router from config: store backend, model provider,
/// clock, and identifier minting.
pub fn build_session_router(config: &Config) -> Result<Arc<SessionRouter>> {
    let store = create_session_store(&config.session, &config.workspace_dir)
        .context("Failed to initialize session store")?;

    let provider_name = config.default_provider.as_deref().unwrap_or("openai");
    let provider = create_provider(
        provider_name,
        config.api_key.as_deref(),
        config.api_url.as_deref(),
        config.default_temperature,
    )
    .context("Failed to initialize model provider")?;

    let model = config
        .default_model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(Arc::new(
        SessionRouter::new(Arc::from(store), Arc::from(provider), model)
            .with_model_history_bound(config.session.max_model_messages),
    ))
}

/// Start the gateway server and serve until shutdown.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let router = build_session_router(&config)?;
    let app = build_app(router);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind gateway to {addr}"))?;
    let bound = listener.local_addr().context("Failed to read bound address")?;

    info!("Gateway listening on http://{bound}");

    axum::serve(listener, app)
        .await
        .context("Gateway server terminated")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Provider, ProviderError};
    use crate::sessions::{InMemorySessionStore, Message, Role, SessionStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        async fn chat(&self, _model: &str, messages: &[Message]) -> Result<String, ProviderError> {
            let last_user = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(format!("echo: {last_user}"))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn chat(&self, _model: &str, _messages: &[Message]) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("no backend in tests".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn test_app(provider: Arc<dyn Provider>) -> Router {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        build_app(Arc::new(SessionRouter::new(store, provider, "test-model")))
    }

    fn chat_request(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_turn_returns_reply_digest_and_messages() {
        let app = test_app(Arc::new(EchoProvider));

        let response = app
            .oneshot(chat_request(r#"{"message":"I was charged twice"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("first turn must mint a session cookie")
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("df_session_id="));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("SameSite=Lax"));

        let body = json_body(response).await;
        assert_eq!(body["reply"], "echo: I was charged twice");
        assert_eq!(
            body["dispute"]["summary"],
            "Latest dispute description: I was charged twice"
        );
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn existing_cookie_continues_the_session() {
        let app = test_app(Arc::new(EchoProvider));

        let first = app
            .clone()
            .oneshot(chat_request(r#"{"message":"first"}"#, None))
            .await
            .unwrap();
        let cookie = first
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let second = app
            .oneshot(chat_request(r#"{"message":"second"}"#, Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(second.status(), StatusCode::OK);
        // No new credential for a caller that presented one.
        assert!(second.headers().get(header::SET_COOKIE).is_none());
        let body = json_body(second).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn invalid_json_is_rejected() {
        let app = test_app(Arc::new(EchoProvider));
        let response = app
            .oneshot(chat_request("{not json", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid JSON");
    }

    #[tokio::test]
    async fn whitespace_message_is_rejected_and_state_untouched() {
        let app = test_app(Arc::new(EchoProvider));

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"   "}"#, Some("df_session_id=fixed")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Message is required");

        let state = app
            .oneshot(
                Request::builder()
                    .uri("/state")
                    .header(header::COOKIE, "df_session_id=fixed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(state).await, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn missing_message_field_is_rejected() {
        let app = test_app(Arc::new(EchoProvider));
        let response = app.oneshot(chat_request(r#"{}"#, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Message is required");
    }

    #[tokio::test]
    async fn backend_failure_still_returns_ok_with_echo() {
        let app = test_app(Arc::new(FailingProvider));

        let response = app
            .clone()
            .oneshot(chat_request(
                r#"{"message":"I was charged twice"}"#,
                Some("df_session_id=degraded"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let reply = body["reply"].as_str().unwrap();
        assert!(!reply.is_empty());
        assert!(reply.contains("I was charged twice"));

        // The degraded turn persisted like a normal one.
        let state = app
            .oneshot(
                Request::builder()
                    .uri("/state")
                    .header(header::COOKIE, "df_session_id=degraded")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let state = json_body(state).await;
        assert_eq!(state["messages"].as_array().unwrap().len(), 2);
        assert_eq!(state["dispute"]["lastUserMessage"], "I was charged twice");
    }

    #[tokio::test]
    async fn state_without_cookie_is_null() {
        let app = test_app(Arc::new(EchoProvider));
        let response = app
            .oneshot(Request::builder().uri("/state").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn state_for_unused_identifier_is_null() {
        let app = test_app(Arc::new(EchoProvider));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/state")
                    .header(header::COOKIE, "df_session_id=never-used")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn index_serves_chat_page() {
        let app = test_app(Arc::new(EchoProvider));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Dispute Assistant"));
    }
}
