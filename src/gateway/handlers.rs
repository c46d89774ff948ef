use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
};

use super::AppState;
use crate::error::ProviderError;
use crate::prompt;
use crate::providers::{self, ProviderMessage};
use crate::util::truncate_with_ellipsis;

/// User-facing error strings. The chat endpoint reports exactly these two for
/// upstream failures; everything else stays in logs.
pub const TIMEOUT_ERROR: &str =
    "⚠️ The request to Gemini timed out. Please try again later or simplify your prompt.";
pub const UPSTREAM_ERROR: &str = "⚠️ An unexpected error occurred while contacting Gemini.";
pub const WRONG_PASSWORD_ERROR: &str = "❌ Incorrect password. Try again.";

#[derive(serde::Deserialize)]
pub struct LoginBody {
    pub password: String,
}

#[derive(serde::Deserialize)]
pub struct ChatBody {
    pub message: String,
}

/// GET / - the chat page (public; everything behind it requires a token)
pub(super) async fn handle_index(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.page.as_ref().clone())
}

/// GET /health - always public (no secrets leaked)
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "unlocked": state.gate.is_unlocked(),
    });
    Json(body)
}

/// POST /login - exchange the shared password for a bearer token
pub(super) async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(login)) = body else {
        let err = serde_json::json!({
            "error": "Invalid JSON. Expected: {\"password\": \"...\"}"
        });
        return (StatusCode::BAD_REQUEST, Json(err));
    };

    match state.gate.unlock(&login.password) {
        Ok(Some(token)) => {
            tracing::info!("🔓 client unlocked the gate");
            let body = serde_json::json!({
                "token": token,
                "message": "Use this token as Authorization: Bearer <token>"
            });
            (StatusCode::OK, Json(body))
        }
        Ok(None) => {
            tracing::warn!("🔒 unlock attempt with wrong password");
            let err = serde_json::json!({"error": WRONG_PASSWORD_ERROR});
            (StatusCode::FORBIDDEN, Json(err))
        }
        Err(lockout_secs) => {
            tracing::warn!(
                "🔒 unlock locked out — too many failed attempts ({lockout_secs}s remaining)"
            );
            let err = serde_json::json!({
                "error": format!("Too many failed attempts. Try again in {lockout_secs}s."),
                "retry_after": lockout_secs
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(err))
        }
    }
}

/// GET /session - transcript turns for rendering
pub(super) async fn handle_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let token = match authorize(&state, &headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let turns = state.sessions.history(&token);
    Json(serde_json::json!({"turns": turns})).into_response()
}

/// POST /chat - append the user turn, call the model, append the reply
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatBody>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let token = match authorize(&state, &headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let Ok(Json(chat)) = body else {
        let err = serde_json::json!({
            "error": "Invalid JSON. Expected: {\"message\": \"...\"}"
        });
        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
    };

    let message = chat.message.trim();
    if message.is_empty() {
        let err = serde_json::json!({"error": "Message cannot be empty"});
        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
    }

    tracing::info!("chat turn: {}", truncate_with_ellipsis(message, 50));

    // The transcript keeps the raw input; only the copy sent to the model is
    // wrapped. Prior turns are replayed as stored. The user turn stays in the
    // transcript even if the provider call fails.
    let prior: Vec<ProviderMessage> = state.sessions.with_transcript(&token, |transcript| {
        let prior = transcript.turns().iter().map(ProviderMessage::from).collect();
        transcript.push_user(message);
        prior
    });

    let wrapped = {
        let mut engine = state
            .engine
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prompt::build_reply_prompt(&mut engine, &state.brand, message)
    };
    let wrapped = match wrapped {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("reply prompt render failed: {e:#}");
            let err = serde_json::json!({"error": UPSTREAM_ERROR});
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(err)).into_response();
        }
    };

    let mut history = prior;
    history.push(ProviderMessage::user(wrapped));

    match state
        .provider
        .generate(&history, &state.model, state.temperature)
        .await
    {
        Ok(reply) => {
            state
                .sessions
                .with_transcript(&token, |transcript| transcript.push_model(&reply));
            let body = serde_json::json!({"reply": reply, "model": state.model});
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(ProviderError::Timeout) => {
            tracing::warn!("provider request timed out");
            let err = serde_json::json!({"error": TIMEOUT_ERROR});
            (StatusCode::GATEWAY_TIMEOUT, Json(err)).into_response()
        }
        Err(e) => {
            tracing::error!(
                "chat provider error: {}",
                providers::sanitize_api_error(&e.to_string())
            );
            let err = serde_json::json!({"error": UPSTREAM_ERROR});
            (StatusCode::BAD_GATEWAY, Json(err)).into_response()
        }
    }
}

/// POST /reset - fresh transcript with only the greeting
pub(super) async fn handle_reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = match authorize(&state, &headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    state.sessions.reset(&token);
    let turns = state.sessions.history(&token);
    Json(serde_json::json!({"turns": turns})).into_response()
}

/// Extract and validate the bearer token; on failure, the 401 response.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, Response> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");

    if state.gate.is_authorized(token) {
        Ok(token.to_string())
    } else {
        let err = serde_json::json!({"error": "Unauthorized — unlock with the password first"});
        Err((StatusCode::UNAUTHORIZED, Json(err)).into_response())
    }
}
