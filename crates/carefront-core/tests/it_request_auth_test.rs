//! Integration tests for bearer attachment and the exempt-path allowlist

use std::sync::Arc;

use carefront_core::auth::store::{KEY_ACCESS_TOKEN, KEY_IS_LOGIN};
use carefront_core::auth::{SessionState, SessionStore};
use carefront_core::{ApiClient, Config};
use mockito::{Matcher, Server, ServerGuard};
use tempfile::TempDir;

fn client_for(server: &ServerGuard) -> (ApiClient, Arc<SessionStore>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(SessionStore::open(dir.path().to_path_buf()).expect("session store"));
    let config = Config {
        api_base_url: server.url(),
        ..Default::default()
    };
    let client = ApiClient::new(&config, store.clone()).expect("api client");
    (client, store, dir)
}

const PROFILE_BODY: &str =
    r#"{"isSuccess":true,"data":{"id":7,"firstName":"Pat","lastName":"Doe"}}"#;

#[tokio::test]
async fn login_request_is_bearer_exempt() {
    //* Given
    let mut server = Server::new_async().await;
    let (client, store, _dir) = client_for(&server);
    // A leftover session must not leak a bearer header into the login call.
    store.sign_in("old-access", "old-refresh", "patient");

    let login_mock = server
        .mock("POST", "/api/v1/auth/login")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(serde_json::json!({
            "username": "pat@example.com",
            "password": "hunter2"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "isSuccess": true,
                "data": {
                    "accessToken": "acc-1",
                    "refreshToken": "ref-1",
                    "userType": "patient",
                    "user": {"id": 7, "firstName": "Pat", "lastName": "Doe", "email": "pat@example.com"}
                }
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    //* When
    let profile = client
        .login("pat@example.com", "hunter2")
        .await
        .expect("login should succeed");

    //* Then
    login_mock.assert_async().await;
    assert_eq!(profile.full_name(), "Pat Doe");
    assert_eq!(store.access_token().as_deref(), Some("acc-1"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref-1"));
    assert_eq!(store.current_user().as_deref(), Some("patient"));
    assert!(store.is_logged_in());
    assert_eq!(store.state(), SessionState::SignedIn);
}

#[tokio::test]
async fn signed_in_request_carries_stored_token() {
    //* Given
    let mut server = Server::new_async().await;
    let (client, store, _dir) = client_for(&server);
    store.sign_in("acc-1", "ref-1", "patient");

    let profile_mock = server
        .mock("GET", "/api/v1/profile")
        .match_header("authorization", "Bearer acc-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_BODY)
        .expect(1)
        .create_async()
        .await;

    //* When
    let profile = client.fetch_profile().await.expect("fetch should succeed");

    //* Then
    profile_mock.assert_async().await;
    assert_eq!(profile.display_name(), "Doe, Pat");
}

#[tokio::test]
async fn signed_out_request_has_no_authorization() {
    //* Given
    let mut server = Server::new_async().await;
    let (client, _store, _dir) = client_for(&server);

    let profile_mock = server
        .mock("GET", "/api/v1/profile")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_BODY)
        .expect(1)
        .create_async()
        .await;

    //* When
    client.fetch_profile().await.expect("fetch should succeed");

    //* Then
    profile_mock.assert_async().await;
}

#[tokio::test]
async fn token_without_session_flag_is_not_attached() {
    //* Given
    let mut server = Server::new_async().await;
    let (client, store, _dir) = client_for(&server);
    // Token present but the flag was never set, so the session is not live.
    store.set(KEY_ACCESS_TOKEN, "acc-1");

    let profile_mock = server
        .mock("GET", "/api/v1/profile")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_BODY)
        .expect(1)
        .create_async()
        .await;

    //* When
    client.fetch_profile().await.expect("fetch should succeed");

    //* Then
    profile_mock.assert_async().await;
}

#[tokio::test]
async fn session_flag_without_token_is_not_attached() {
    //* Given
    let mut server = Server::new_async().await;
    let (client, store, _dir) = client_for(&server);
    store.set(KEY_IS_LOGIN, "true");

    let profile_mock = server
        .mock("GET", "/api/v1/profile")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_BODY)
        .expect(1)
        .create_async()
        .await;

    //* When
    client.fetch_profile().await.expect("fetch should succeed");

    //* Then
    profile_mock.assert_async().await;
}

#[tokio::test]
async fn logout_clears_session_and_broadcasts() {
    //* Given
    let server = Server::new_async().await;
    let (client, store, dir) = client_for(&server);
    store.sign_in("acc-1", "ref-1", "doctor");
    let mut state_rx = store.subscribe();

    //* When
    client.logout();

    //* Then
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(store.current_user(), None);
    assert!(!store.is_logged_in());
    assert_eq!(*state_rx.borrow_and_update(), SessionState::SignedOut);
    assert!(!dir.path().join("session.json").exists());
}
