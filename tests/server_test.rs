use std::sync::Arc;

use serde_json::{Value, json};
use spotwatch::Error;
use spotwatch::config::Settings;
use spotwatch::server::{AuthorizationContext, router};
use spotwatch::spotify::http_client;
use spotwatch::types::PendingAuthorization;
use tokio::sync::Mutex;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Serves the callback router on an ephemeral port and returns its base URL
async fn serve(token_base: &str, state: &str) -> (String, Arc<AuthorizationContext>) {
    let token_url = format!("{token_base}/api/token");
    let settings = Settings::from_lookup(|key| match key {
        "SPOTIFY_CLIENT_ID" => Some("client-id".to_string()),
        "SPOTIFY_CLIENT_SECRET" => Some("client-secret".to_string()),
        "SPOTIFY_REDIRECT_URI" => Some("http://127.0.0.1:8888/callback".to_string()),
        "SPOTIFY_API_TOKEN_URL" => Some(token_url.clone()),
        _ => None,
    })
    .unwrap();

    let context = Arc::new(AuthorizationContext {
        settings,
        http: http_client().unwrap(),
        pending: Mutex::new(PendingAuthorization::new(state.to_string())),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::clone(&context));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), context)
}

#[tokio::test]
async fn test_health() {
    let (base, _) = serve("http://127.0.0.1:9", "state").await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["name"], json!("spotwatch"));
}

#[tokio::test]
async fn test_callback_exchanges_code() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("code=code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": 3600,
            "refresh_token": "refresh-1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (base, context) = serve(&mock_server.uri(), "expected-state").await;

    let response = reqwest::get(format!("{base}/callback?code=code-1&state=expected-state"))
        .await
        .unwrap();
    assert!(response.status().is_success());

    let outcome = context.pending.lock().await.outcome.take();
    let credential = outcome.unwrap().unwrap();
    assert_eq!(credential.refresh_token, "refresh-1");
    assert_eq!(credential.access_token.as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (base, context) = serve(&mock_server.uri(), "expected-state").await;

    reqwest::get(format!("{base}/callback?code=code-1&state=forged"))
        .await
        .unwrap();

    let outcome = context.pending.lock().await.outcome.take();
    match outcome {
        Some(Err(Error::Auth { status, message })) => {
            assert_eq!(status, 400);
            assert!(message.contains("state mismatch"));
        }
        other => panic!("Expected state mismatch, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_callback_reports_denied_consent() {
    let (base, context) = serve("http://127.0.0.1:9", "expected-state").await;

    reqwest::get(format!("{base}/callback?error=access_denied&state=expected-state"))
        .await
        .unwrap();

    let outcome = context.pending.lock().await.outcome.take();
    match outcome {
        Some(Err(Error::Auth { message, .. })) => assert!(message.contains("access_denied")),
        other => panic!("Expected denied authorization, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_callback_without_code_ends_the_wait() {
    let (base, context) = serve("http://127.0.0.1:9", "expected-state").await;

    reqwest::get(format!("{base}/callback?state=expected-state"))
        .await
        .unwrap();

    let outcome = context.pending.lock().await.outcome.take();
    match outcome {
        Some(Err(Error::Auth { status, message })) => {
            assert_eq!(status, 400);
            assert!(message.contains("without code"));
        }
        other => panic!("Expected missing code error, got: {:?}", other),
    }
}
