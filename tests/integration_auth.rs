#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

mod common;

#[tokio::test]
async fn test_login_redirects_to_consent_screen() {
    let app = common::TestApp::spawn().await;

    let resp = app.get("/login", None).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = reqwest::Url::parse(&common::location(&resp)).unwrap();
    assert_eq!(target.path(), "/authorize");

    let params: std::collections::HashMap<_, _> = target.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "test-client");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "user-read-private user-read-email");
    assert_eq!(params["redirect_uri"], "http://localhost/callback");
}

#[tokio::test]
async fn test_callback_error_is_echoed_without_session_change() {
    let app = common::TestApp::spawn().await;
    let (id, cookie) = app.seed_session(Default::default()).await;

    let resp = app.get("/callback?error=access_denied", Some(&cookie)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "access_denied"}));
    assert!(app.session(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_exchanges_code_and_stores_tokens() {
    let app = common::TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("client_id=test-client"))
        .and(body_string_contains("client_secret=test-client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "scope": "user-read-private user-read-email",
            "expires_in": 3600,
            "refresh_token": "refresh-1"
        })))
        .expect(1)
        .mount(&app.provider)
        .await;

    let (id, cookie) = app.seed_session(Default::default()).await;
    let before = common::now();
    let resp = app.get("/callback?code=auth-code-1&state=xyz", Some(&cookie)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["access_token"], "access-1");
    assert_eq!(body["refresh_token"], "refresh-1");

    let session = app.session(id).await.unwrap();
    assert_eq!(session.access_token.as_deref(), Some("access-1"));
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));

    let expires_at = session.expires_at.unwrap();
    assert_eq!(body["expires_at"], expires_at);
    assert!((expires_at - (before + 3600)).abs() <= 1, "expires_at drifted: {expires_at} vs {before}");
}

#[tokio::test]
async fn test_callback_without_cookie_issues_one() {
    let app = common::TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": 3600,
            "refresh_token": "refresh-1"
        })))
        .mount(&app.provider)
        .await;

    let resp = app.get("/callback?code=abc", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = common::session_cookie(&resp).expect("Missing session cookie");

    // The issued cookie addresses the session that now holds the tokens.
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"name": "Qualm"}]})))
        .mount(&app.provider)
        .await;
    let resp = app.get("/playlists", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_callback_without_code_or_error_is_bad_request() {
    let app = common::TestApp::spawn().await;

    let resp = app.get("/callback", None).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("code"));
}

#[tokio::test]
async fn test_callback_with_duplicate_code_is_json_bad_request() {
    let app = common::TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider)
        .await;

    let (id, cookie) = app.seed_session(Default::default()).await;
    let resp = app.get("/callback?code=a&code=b", Some(&cookie)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let content_type = resp.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/json"));
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("code"));
    assert!(app.session(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_with_incomplete_token_response_is_bad_request() {
    let app = common::TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
        .mount(&app.provider)
        .await;

    let (id, cookie) = app.seed_session(Default::default()).await;
    let resp = app.get("/callback?code=abc", Some(&cookie)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Token response is missing access_token");
    assert!(app.session(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_with_rejected_code_surfaces_provider_error() {
    let app = common::TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .mount(&app.provider)
        .await;

    let resp = app.get("/callback?code=stale", None).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_grant: Invalid authorization code");
}
