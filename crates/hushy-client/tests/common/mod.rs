//! In-process stand-in for the Hushy backend.
//!
//! Every request is counted and its JSON body recorded so tests can assert
//! on what the client actually sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use hushy_client::http::ApiClient;
use hushy_client::retry::RetryConfig;
use hushy_client::services::link_preview::LinkPreviewConfig;
use hushy_client::HushyClient;
use hushy_store::Database;

#[derive(Default)]
pub struct Backend {
    hits: Mutex<HashMap<String, usize>>,
    bodies: Mutex<Vec<(String, Value)>>,
    /// Number of upcoming link-preview requests answered with a 500.
    pub preview_failures: AtomicUsize,
    pub preview_delay: Mutex<Duration>,
    pub read_delay: Mutex<Duration>,
    pub conversations: Mutex<Value>,
    pub onboarding_url: Mutex<String>,
    /// When set, the keyword endpoint answers 503.
    pub keywords_down: std::sync::atomic::AtomicBool,
}

impl Backend {
    /// Requests received for `"METHOD /path"`.
    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    /// JSON bodies received for `"METHOD /path"`, oldest first.
    pub fn bodies(&self, route: &str) -> Vec<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn set_conversations(&self, value: Value) {
        *self.conversations.lock().unwrap() = value;
    }

    fn record(&self, route: &str, body: &Bytes) -> Value {
        *self.hits.lock().unwrap().entry(route.to_string()).or_insert(0) += 1;
        let value = serde_json::from_slice(body).unwrap_or(Value::Null);
        self.bodies
            .lock()
            .unwrap()
            .push((route.to_string(), value.clone()));
        value
    }
}

pub struct TestServer {
    pub base_url: String,
    pub backend: Arc<Backend>,
}

pub async fn spawn_backend() -> TestServer {
    let backend = Arc::new(Backend::default());
    *backend.conversations.lock().unwrap() = json!([]);
    *backend.onboarding_url.lock().unwrap() = "https://connect.example.com/onboard/acct_1".into();

    let app = Router::new().fallback(handle).with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        backend,
    }
}

/// Preview settings fast enough for tests.
pub fn fast_previews() -> LinkPreviewConfig {
    LinkPreviewConfig {
        min_interval: Duration::from_millis(5),
        timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            backoff_multiplier: 2.0,
        },
        ..LinkPreviewConfig::default()
    }
}

pub fn client_for(server: &TestServer, database: Option<Database>) -> HushyClient {
    client_with_previews(server, database, fast_previews())
}

pub fn client_with_previews(
    server: &TestServer,
    database: Option<Database>,
    previews: LinkPreviewConfig,
) -> HushyClient {
    let api = ApiClient::new(&server.base_url, Duration::from_secs(5)).unwrap();
    HushyClient::with_parts(api, database, previews)
}

/// A client already signed in as `u1`.
pub async fn signed_in_client(server: &TestServer) -> HushyClient {
    let client = client_for(server, Some(Database::open_in_memory().unwrap()));
    client.auth().login("ana@example.com", "hunter22").await.unwrap();
    client
}

async fn handle(
    State(backend): State<Arc<Backend>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let route = format!("{method} {path}");
    let body = backend.record(&route, &body);

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "health"]) => StatusCode::OK.into_response(),

        ("POST", ["api", "users", "login"]) | ("POST", ["api", "users", "register"]) => Json(json!({
            "token": "tok-1",
            "user": { "_id": "u1", "username": "ana", "email": body["email"] }
        }))
        .into_response(),

        ("POST", ["api", "secrets"]) => Json(json!({
            "_id": "s1",
            "content": body["content"],
            "label": body["label"],
            "price": body["price"],
            "currency": body["currency"],
            "creator": "u1",
            "expiresAt": (Utc::now() + chrono::Duration::hours(24)).to_rfc3339(),
        }))
        .into_response(),

        ("GET", ["api", "secrets", "conversations"]) => {
            let list = backend.conversations.lock().unwrap().clone();
            Json(list).into_response()
        }

        ("POST", ["api", "secrets", "conversations", _, "read"]) => {
            let delay = *backend.read_delay.lock().unwrap();
            tokio::time::sleep(delay).await;
            StatusCode::NO_CONTENT.into_response()
        }

        ("POST", ["api", "link-preview"]) => {
            let delay = *backend.preview_delay.lock().unwrap();
            tokio::time::sleep(delay).await;
            let failing = backend
                .preview_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "upstream unavailable" })),
                )
                    .into_response();
            }
            Json(json!({
                "url": body["url"],
                "title": "Example Domain",
                "siteName": "example.com",
            }))
            .into_response()
        }

        ("GET", ["api", "payments", "account-status"]) => Json(json!({
            "accountId": "acct_1",
            "detailsSubmitted": true,
            "chargesEnabled": true,
            "payoutsEnabled": false,
            "requirementsDue": ["external_account"],
        }))
        .into_response(),

        ("POST", ["api", "payments", "onboarding-link"]) => {
            let url = backend.onboarding_url.lock().unwrap().clone();
            Json(json!({ "url": url })).into_response()
        }

        ("POST", ["api", "payments", "payment-intent"]) => Json(json!({
            "clientSecret": format!("pi_{}_secret", body["secretId"].as_str().unwrap_or("")),
            "amount": 5.0,
            "currency": "eur",
        }))
        .into_response(),

        ("GET", ["api", "moderation", "keywords"]) => {
            if backend.keywords_down.load(Ordering::SeqCst) {
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
            Json(json!({ "keywords": ["pyramid scheme", "kys"] })).into_response()
        }

        ("POST", ["api", "notifications", "register-token"]) => Json(json!({})).into_response(),
        ("DELETE", ["api", "notifications", "token"]) => StatusCode::NO_CONTENT.into_response(),

        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("no route for {route}") })),
        )
            .into_response(),
    }
}
