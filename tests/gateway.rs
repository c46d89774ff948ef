use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use replygate::config::Config;
use replygate::gateway::{AppState, TIMEOUT_ERROR, UPSTREAM_ERROR, WRONG_PASSWORD_ERROR, router};
use replygate::providers::{GeminiProvider, Provider};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PASSWORD: &str = "open-sesame";
const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn test_config() -> Config {
    let mut config = Config::default();
    config.password = Some(PASSWORD.to_string());
    config
}

fn app_with_provider(provider: GeminiProvider) -> Router {
    let provider: Arc<dyn Provider> = Arc::new(provider);
    let state = AppState::from_config(&test_config(), provider)
        .expect("gateway state should build from test config");
    router(state)
}

/// App wired to a wiremock Gemini backend.
async fn app_against(mock: &MockServer) -> Router {
    app_with_provider(GeminiProvider::new(Some("test-key")).with_base_url(mock.uri()))
}

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    })
}

async fn send_json(
    app: &Router,
    method_name: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method_name).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"]
        .as_str()
        .expect("login response should carry a token")
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;

    let (status, body) = send_json(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["unlocked"], false);
}

#[tokio::test]
async fn index_serves_branded_page() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let html = std::str::from_utf8(&bytes).expect("page should be utf-8");
    assert!(html.contains("Invesho"));
    assert!(html.contains("data:image/svg+xml;base64,"));
}

#[tokio::test]
async fn login_then_chat_then_reset_round_trips() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("Love this!\n\nGreat momentum.\n\n@InveshoAI")),
        )
        .mount(&mock)
        .await;

    let app = app_against(&mock).await;
    let token = login(&app).await;

    // Fresh session holds only the greeting.
    let (status, body) = send_json(&app, "GET", "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["turns"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["turns"][0]["role"], "model");

    let (status, body) = send_json(
        &app,
        "POST",
        "/chat",
        Some(&token),
        Some(json!({ "message": "We just closed our seed round!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reply"].as_str().unwrap().contains("@InveshoAI"));
    assert_eq!(body["model"], "gemini-2.0-flash");

    // Transcript shows raw input plus the model reply.
    let (_, body) = send_json(&app, "GET", "/session", Some(&token), None).await;
    let turns = body["turns"].as_array().expect("turns array");
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1]["role"], "user");
    assert_eq!(turns[1]["text"], "We just closed our seed round!");
    assert_eq!(turns[2]["role"], "model");

    // The wire request wraps the post in the brand prompt.
    let requests = mock.received_requests().await.expect("recorded requests");
    let sent = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(sent.contains("You're replying as Invesho"));
    assert!(sent.contains(r#"\"\"\"We just closed our seed round!\"\"\""#));

    let (status, body) = send_json(&app, "POST", "/reset", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["turns"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn wrong_password_is_forbidden_with_exact_message() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "password": "guess" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], WRONG_PASSWORD_ERROR);
}

#[tokio::test]
async fn repeated_bad_passwords_lock_the_gate() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;

    for _ in 0..5 {
        let (status, _) = send_json(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // Even the correct password is refused while locked out.
    let (status, body) = send_json(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["retry_after"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn chat_requires_a_token() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/chat",
        None,
        Some(json!({ "message": "a post" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, "GET", "/session", Some("rg_bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upstream_error_maps_to_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&mock)
        .await;

    let app = app_against(&mock).await;
    let token = login(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/chat",
        Some(&token),
        Some(json!({ "message": "a post" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], UPSTREAM_ERROR);

    // The failed turn keeps the user message in the transcript.
    let (_, body) = send_json(&app, "GET", "/session", Some(&token), None).await;
    let turns = body["turns"].as_array().expect("turns array");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["text"], "a post");
}

#[tokio::test]
async fn upstream_timeout_maps_to_gateway_timeout() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("too late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock)
        .await;

    let app = app_with_provider(
        GeminiProvider::new(Some("test-key"))
            .with_base_url(mock.uri())
            .with_timeout_secs(1),
    );
    let token = login(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/chat",
        Some(&token),
        Some(json!({ "message": "a post" })),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], TIMEOUT_ERROR);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;
    let token = login(&app).await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/chat",
        Some(&token),
        Some(json!({ "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;
    let token = login(&app).await;

    let huge = "x".repeat(128 * 1024);
    let (status, _) = send_json(
        &app,
        "POST",
        "/chat",
        Some(&token),
        Some(json!({ "message": huge })),
    )
    .await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let mock = MockServer::start().await;
    let app = app_against(&mock).await;
    let token = login(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request should build");
    let response = app
        .oneshot(request)
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn each_login_gets_its_own_transcript() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("reply")))
        .mount(&mock)
        .await;

    let app = app_against(&mock).await;
    let token_a = login(&app).await;
    let token_b = login(&app).await;
    assert_ne!(token_a, token_b);

    let (status, _) = send_json(
        &app,
        "POST",
        "/chat",
        Some(&token_a),
        Some(json!({ "message": "from a" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&app, "GET", "/session", Some(&token_b), None).await;
    assert_eq!(body["turns"].as_array().map(Vec::len), Some(1));
}
