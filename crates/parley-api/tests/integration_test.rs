mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::{TimeDelta, Utc};
use serde_json::json;

use common::{spawn_app, token_issuer, Behavior};
use parley_auth::UserIdentity;
use parley_llm::Message;

#[tokio::test]
async fn test_full_scenario() {
    let app = spawn_app(Behavior::Reply);
    let credentials = json!({ "username": "alice", "password": "pw123" });

    let (status, body) = app
        .request(Method::POST, "/api/auth/register", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = app
        .request(Method::POST, "/api/auth/login", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    let (status, body) = app.chat(&token, "t1", "hi").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["reply"].as_str().unwrap().is_empty());

    let (status, body) = app.request(Method::GET, "/api/thread", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["threadId"], "t1");
    assert_eq!(body[0]["title"], "hi");

    let (status, body) = app.request(Method::GET, "/api/thread/t1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hi");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "reply to: hi");

    let (status, _) = app.request(Method::DELETE, "/api/thread/t1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::GET, "/api/thread/t1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_register_conflict_and_missing_fields() {
    let app = spawn_app(Behavior::Reply);
    app.login_as("alice", "pw123").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists");
    assert_eq!(body["code"], "conflict");

    let (status, body) = app
        .request(Method::POST, "/api/auth/register", None, Some(json!({ "username": "bob" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn test_bad_login_responses_are_identical() {
    let app = spawn_app(Behavior::Reply);
    app.login_as("alice", "pw123").await;

    let wrong_password = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
    let unknown_user = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "mallory", "password": "pw123" })),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_rejected() {
    let app = spawn_app(Behavior::Reply);

    let (status, body) = app.request(Method::GET, "/api/thread", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = app.request(Method::GET, "/api/thread", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.chat("garbage", "t1", "hi").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = spawn_app(Behavior::Reply);
    let identity = UserIdentity {
        user_id: "user-1".to_string(),
        username: "alice".to_string(),
    };
    let expired = token_issuer()
        .issue_at(&identity, Utc::now() - TimeDelta::days(8))
        .unwrap();

    let (status, _) = app.request(Method::GET, "/api/thread", Some(&expired.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_threads_are_private_to_their_owner() {
    let app = spawn_app(Behavior::Reply);
    let alice = app.login_as("alice", "pw123").await;
    let bob = app.login_as("bob", "hunter2").await;

    let (status, _) = app.chat(&alice, "t1", "alice's secret").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, "/api/thread/t1", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request(Method::DELETE, "/api/thread/t1", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.chat(&bob, "t1", "let me in").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (_, body) = app.request(Method::GET, "/api/thread", Some(&bob), None).await;
    assert!(body.as_array().unwrap().is_empty());
    assert_eq!(app.store.message_count("t1").await, 2);
}

#[tokio::test]
async fn test_each_exchange_adds_two_messages_in_order() {
    let app = spawn_app(Behavior::Reply);
    let token = app.login_as("alice", "pw123").await;

    for (i, text) in ["one", "two", "three"].iter().enumerate() {
        let (status, _) = app.chat(&token, "t1", text).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.message_count("t1").await, 2 * (i + 1));
    }

    // The provider saw the whole prior history plus the new message
    assert_eq!(
        app.provider.last_history(),
        vec![
            Message::human("one"),
            Message::ai("reply to: one"),
            Message::human("two"),
            Message::ai("reply to: two"),
            Message::human("three"),
        ]
    );

    let first = app.request(Method::GET, "/api/thread/t1", Some(&token), None).await;
    let second = app.request(Method::GET, "/api/thread/t1", Some(&token), None).await;
    assert_eq!(first, second);
    let contents: Vec<&str> = first.1
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(
        contents,
        vec!["one", "reply to: one", "two", "reply to: two", "three", "reply to: three"]
    );
}

#[tokio::test]
async fn test_provider_failure_persists_nothing() {
    let app = spawn_app(Behavior::Fail);
    let token = app.login_as("alice", "pw123").await;

    let (status, body) = app.chat(&token, "t1", "hi").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "upstream_failure");
    assert!(!body["error"].as_str().unwrap().contains("exploded"));

    assert_eq!(app.store.message_count("t1").await, 0);
    let (_, body) = app.request(Method::GET, "/api/thread", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_timeout_is_upstream_failure() {
    let app = spawn_app(Behavior::Stall(Duration::from_secs(5)));
    let token = app.login_as("alice", "pw123").await;

    let (status, body) = app.chat(&token, "t1", "hi").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "upstream_failure");
    assert_eq!(app.store.message_count("t1").await, 0);
}

#[tokio::test]
async fn test_dropped_chat_request_is_still_persisted() {
    let app = spawn_app(Behavior::Stall(Duration::from_millis(100)));
    let token = app.login_as("alice", "pw123").await;

    let dropped = tokio::time::timeout(Duration::from_millis(50), app.chat(&token, "t1", "hi")).await;
    assert!(dropped.is_err());
    assert_eq!(app.provider.calls(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(app.store.message_count("t1").await, 2);

    let (status, body) = app.request(Method::GET, "/api/thread", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["threadId"], "t1");
}

#[tokio::test]
async fn test_empty_message_is_invalid() {
    let app = spawn_app(Behavior::Reply);
    let token = app.login_as("alice", "pw123").await;

    let (status, body) = app.chat(&token, "t1", "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, _) = app.chat(&token, "", "hi").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_invalid_input() {
    let app = spawn_app(Behavior::Reply);
    let token = app.login_as("alice", "pw123").await;

    let (status, body) = app
        .raw_request(Method::POST, "/api/chat", Some(&token), Some("{not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, _) = app
        .raw_request(Method::POST, "/api/auth/login", None, Some("[]".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let app = spawn_app(Behavior::Reply);
    let token = app.login_as("alice", "pw123").await;

    let (status, body) = app.request(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    // Stateless tokens keep working until they expire
    let (status, _) = app.request(Method::GET, "/api/thread", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = spawn_app(Behavior::Reply);

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["storage"], "up");

    let (status, body) = app.request(Method::GET, "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/chat"].is_object());
}
