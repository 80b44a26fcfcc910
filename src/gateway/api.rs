//! HTTP handlers for the chat boundary.
//!
//! Session identity rides a path-scoped, lax cross-site cookie. A request
//! without one gets a freshly minted identifier echoed back via
//! `Set-Cookie`, which the client retains for the session's lifetime.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::error;

use super::{page, AppState};
use crate::routing::TurnError;

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "df_session_id";

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extract the session cookie value, if present.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Path-scoped, lax cross-site policy, session lifetime.
fn set_cookie_value(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; SameSite=Lax")
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// GET / — embedded chat page.
pub async fn handle_index() -> impl IntoResponse {
    Html(page::CHAT_PAGE)
}

/// POST /api/chat — run one chat turn for the caller's session.
pub async fn handle_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Ok(parsed) = serde_json::from_str::<ChatBody>(&body) else {
        return bad_request("Invalid JSON");
    };

    let message = parsed.message.unwrap_or_default();
    if message.trim().is_empty() {
        return bad_request("Message is required");
    }

    let resolved = state.router.resolve_identity(session_cookie(&headers).as_deref());

    let outcome = match state.router.chat_turn(&resolved.id, &message).await {
        Ok(outcome) => outcome,
        Err(TurnError::Validation(e)) => return bad_request(&e.to_string()),
        Err(TurnError::Storage(e)) => {
            error!(session = %resolved.id, error = %format!("{e:#}"), "failed to persist chat turn");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to persist session" })),
            )
                .into_response();
        }
    };

    let mut response = Json(serde_json::json!({
        "reply": outcome.reply,
        "dispute": outcome.dispute,
        "messages": outcome.messages,
    }))
    .into_response();

    if resolved.minted {
        if let Ok(cookie) = set_cookie_value(&resolved.id).parse() {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }

    response
}

/// GET /state — full persisted session state, or `null` when the caller has
/// no session cookie or the identifier never completed a turn. Never an
/// error for a missing session.
pub async fn handle_state(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(id) = session_cookie(&headers) else {
        return Json(serde_json::Value::Null).into_response();
    };

    match state.router.session_state(&id).await {
        Ok(Some(session)) => Json(session).into_response(),
        Ok(None) => Json(serde_json::Value::Null).into_response(),
        Err(e) => {
            error!(session = %id, error = %format!("{e:#}"), "failed to load session state");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to load session" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_parses_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; df_session_id=abc-123; lang=en".parse().unwrap(),
        );
        assert_eq!(session_cookie(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn session_cookie_absent() {
        let headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);

        let mut other = HeaderMap::new();
        other.insert(header::COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(session_cookie(&other), None);
    }

    #[test]
    fn session_cookie_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "df_session_id=".parse().unwrap());
        assert_eq!(session_cookie(&headers), None);
    }

    #[test]
    fn set_cookie_is_path_scoped_and_lax() {
        let value = set_cookie_value("abc-123");
        assert_eq!(value, "df_session_id=abc-123; Path=/; SameSite=Lax");
    }
}
