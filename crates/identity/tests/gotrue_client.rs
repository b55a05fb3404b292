//! Drives [`GoTrueClient`] against a local axum stand-in for the GoTrue API.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use ecom_core::auth::ports::{AccountMetadata, CredentialProvider, ProviderError};
use ecom_identity::{GoTrueClient, GoTrueConfig};
use serde_json::{json, Value};
use uuid::Uuid;

const API_KEY: &str = "anon-key";
const SERVICE_KEY: &str = "service-key";
const USER_ID: &str = "6f1c2a4e-8d0b-4a5f-9c3e-2b7d1e0f4a6c";

// ---------------------------------------------------------------------------
// Fake server
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<String>>>,
}

impl Seen {
    fn push(&self, entry: String) {
        self.requests.lock().unwrap().push(entry);
    }

    fn all(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn has_api_key(headers: &HeaderMap, expected: &str) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(expected)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn token(
    State(seen): State<Seen>,
    Query(params): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !has_api_key(&headers, API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "no apikey" })));
    }
    let grant_type = params.get("grant_type").cloned().unwrap_or_default();
    seen.push(format!("token:{grant_type}"));

    match grant_type.as_str() {
        "password" if body["password"] == "secret123" => (
            StatusCode::OK,
            Json(json!({
                "access_token": "A1",
                "refresh_token": "R1",
                "expires_at": 1767229200,
                "user": { "id": USER_ID, "email": body["email"] }
            })),
        ),
        "refresh_token" if body["refresh_token"] == "R1" => (
            StatusCode::OK,
            Json(json!({
                "access_token": "A2",
                "refresh_token": "R2",
                "expires_in": 3600,
                "user": { "id": USER_ID }
            })),
        ),
        "refresh_token" if body["refresh_token"] == "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": "database unavailable" })),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error_code": "invalid_credentials", "msg": "Invalid login credentials" })),
        ),
    }
}

async fn user(headers: HeaderMap) -> impl IntoResponse {
    match bearer(&headers).as_deref() {
        Some("A1") => (
            StatusCode::OK,
            Json(json!({ "id": USER_ID, "email": "a@x.com" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error_code": "bad_jwt", "msg": "invalid JWT" })),
        ),
    }
}

async fn logout(State(seen): State<Seen>, headers: HeaderMap) -> StatusCode {
    seen.push(format!("logout:{}", bearer(&headers).unwrap_or_default()));
    StatusCode::NO_CONTENT
}

async fn signup(Json(body): Json<Value>) -> impl IntoResponse {
    if body["email"] == "taken@x.com" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error_code": "user_already_exists", "msg": "User already registered" })),
        );
    }
    assert_eq!(body["data"]["role"], "seller");
    (
        StatusCode::OK,
        Json(json!({ "id": USER_ID, "email": body["email"] })),
    )
}

async fn admin_delete(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    if !has_api_key(&headers, SERVICE_KEY) || bearer(&headers).as_deref() != Some(SERVICE_KEY) {
        return StatusCode::FORBIDDEN;
    }
    seen.push(format!("delete:{id}"));
    StatusCode::OK
}

async fn recover(
    State(seen): State<Seen>,
    Query(params): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    let redirect = params.get("redirect_to").cloned().unwrap_or_default();
    seen.push(format!(
        "recover:{}:{redirect}",
        body["email"].as_str().unwrap_or_default()
    ));
    StatusCode::OK
}

async fn update_user(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    seen.push(format!(
        "update:{}:{}",
        bearer(&headers).unwrap_or_default(),
        body["password"].as_str().unwrap_or_default()
    ));
    StatusCode::OK
}

async fn spawn_fake(service_role_key: Option<&str>) -> (GoTrueClient, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/token", post(token))
        .route("/user", get(user).put(update_user))
        .route("/logout", post(logout))
        .route("/signup", post(signup))
        .route("/admin/users/{id}", delete(admin_delete))
        .route("/recover", post(recover))
        .route("/health", get(|| async { StatusCode::OK }))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = GoTrueClient::new(GoTrueConfig {
        base_url: format!("http://{addr}"),
        api_key: API_KEY.to_string(),
        service_role_key: service_role_key.map(str::to_string),
        recovery_redirect_url: Some("https://shop.example/reset".to_string()),
    });
    (client, seen)
}

fn metadata() -> AccountMetadata {
    AccountMetadata {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        phone_number: "+44 207 946 0958".into(),
        role: "seller".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn password_grant_maps_to_token_grant() {
    let (client, seen) = spawn_fake(None).await;

    let grant = client.token_by_password("a@x.com", "secret123").await.unwrap();

    assert_eq!(grant.access_token, "A1");
    assert_eq!(grant.refresh_token, "R1");
    assert_eq!(grant.owner_id, Uuid::parse_str(USER_ID).unwrap());
    assert_eq!(grant.expires_at.timestamp(), 1767229200);
    assert_eq!(seen.all(), vec!["token:password".to_string()]);
}

#[tokio::test]
async fn bad_password_is_rejected() {
    let (client, _) = spawn_fake(None).await;

    let err = client.token_by_password("a@x.com", "wrong").await.unwrap_err();

    assert_matches!(err, ProviderError::Rejected { status: 400, .. });
}

#[tokio::test]
async fn refresh_grant_returns_successor() {
    let (client, _) = spawn_fake(None).await;

    let grant = client.refresh("R1").await.unwrap();
    assert_eq!(grant.refresh_token, "R2");

    assert_matches!(
        client.refresh("R0").await,
        Err(ProviderError::Rejected { .. })
    );
    assert_matches!(
        client.refresh("boom").await,
        Err(ProviderError::Unavailable(_))
    );
}

#[tokio::test]
async fn validate_resolves_principal() {
    let (client, _) = spawn_fake(None).await;

    let principal = client.validate("A1").await.unwrap();
    assert_eq!(principal.email.as_deref(), Some("a@x.com"));

    assert_matches!(
        client.validate("forged").await,
        Err(ProviderError::Rejected { status: 401, .. })
    );
}

#[tokio::test]
async fn invalidate_posts_logout_with_bearer() {
    let (client, seen) = spawn_fake(None).await;

    client.invalidate("A1").await.unwrap();

    assert_eq!(seen.all(), vec!["logout:A1".to_string()]);
}

#[tokio::test]
async fn create_account_sends_metadata() {
    let (client, _) = spawn_fake(None).await;

    let owner = client
        .create_account("new@x.com", "secret123", &metadata())
        .await
        .unwrap();
    assert_eq!(owner, Uuid::parse_str(USER_ID).unwrap());

    assert_matches!(
        client.create_account("taken@x.com", "secret123", &metadata()).await,
        Err(ProviderError::AlreadyExists)
    );
}

#[tokio::test]
async fn admin_delete_uses_service_role_key() {
    let (client, seen) = spawn_fake(Some(SERVICE_KEY)).await;
    let owner = Uuid::parse_str(USER_ID).unwrap();

    client.admin_delete_account(owner).await.unwrap();

    assert_eq!(seen.all(), vec![format!("delete:{USER_ID}")]);
}

#[tokio::test]
async fn admin_delete_without_service_role_key_fails() {
    let (client, seen) = spawn_fake(None).await;

    let err = client
        .admin_delete_account(Uuid::parse_str(USER_ID).unwrap())
        .await
        .unwrap_err();

    assert_matches!(err, ProviderError::Unavailable(_));
    assert!(seen.all().is_empty());
}

#[tokio::test]
async fn recovery_and_password_update() {
    let (client, seen) = spawn_fake(None).await;

    client.send_password_recovery("a@x.com").await.unwrap();
    CredentialProvider::update_password(&client, "A1", "new-secret-456")
        .await
        .unwrap();

    assert_eq!(
        seen.all(),
        vec![
            "recover:a@x.com:https://shop.example/reset".to_string(),
            "update:A1:new-secret-456".to_string(),
        ]
    );
}

#[tokio::test]
async fn health_endpoint() {
    let (client, _) = spawn_fake(None).await;
    client.health().await.unwrap();
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    let client = GoTrueClient::new(GoTrueConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: API_KEY.to_string(),
        service_role_key: None,
        recovery_redirect_url: None,
    });

    let err = client.token_by_password("a@x.com", "secret123").await.unwrap_err();

    assert_matches!(err, ProviderError::Unavailable(_));
}
