#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use bookgate::google::{GoogleProfile, IdTokenError, IdTokenVerifier};
use bookgate::jwt::TokenService;
use bookgate::{ServerConfig, create_app, db::Database};
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-0123456789abcdef";

/// Google verifier stub. Accepts exactly the ID tokens registered with
/// `allow` and rejects everything else.
pub struct StubVerifier {
    profiles: Mutex<HashMap<String, GoogleProfile>>,
}

impl StubVerifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            profiles: Mutex::new(HashMap::new()),
        })
    }

    /// Register an ID token the stub will accept.
    pub fn allow(&self, id_token: &str, profile: GoogleProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(id_token.to_string(), profile);
    }

    /// A verified profile for the given Google account.
    pub fn profile(google_id: &str, email: &str) -> GoogleProfile {
        GoogleProfile {
            id: google_id.to_string(),
            email: email.to_string(),
            name: Some("Test User".to_string()),
            picture: None,
            email_verified: true,
        }
    }
}

impl IdTokenVerifier for StubVerifier {
    fn verify(&self, id_token: &str) -> Result<GoogleProfile, IdTokenError> {
        self.profiles
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or(IdTokenError::Rejected)
    }
}

/// Create a test app backed by an in-memory database and the verifier stub.
pub async fn create_test_app() -> (axum::Router, Database, Arc<StubVerifier>) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let verifier = StubVerifier::new();
    let config = ServerConfig {
        db: db.clone(),
        verifier: verifier.clone(),
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
    };
    (create_app(&config), db, verifier)
}

/// Token service sharing the test app's secrets, for issuing and decoding
/// tokens directly in tests.
pub fn token_service() -> TokenService {
    TokenService::new(ACCESS_SECRET, REFRESH_SECRET)
}

static NEXT_IP: AtomicU32 = AtomicU32::new(1);

/// A unique client address per call. Rate limit budgets are per address, so
/// tests that are not about rate limiting must not share one.
pub fn fresh_ip() -> String {
    let n = NEXT_IP.fetch_add(1, Ordering::Relaxed);
    format!("10.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff)
}

/// Parse a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a Google account with the stub and log it in.
/// Returns the parsed login response body.
pub async fn login(
    app: &axum::Router,
    verifier: &StubVerifier,
    google_id: &str,
    email: &str,
) -> serde_json::Value {
    let id_token = format!("idtok-{}", google_id);
    verifier.allow(&id_token, StubVerifier::profile(google_id, email));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(format!(
                    r#"{{"googleIdToken": "{}"}}"#,
                    id_token
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// GET a path with a bearer token, from a fresh client address.
pub async fn get_with_token(app: &axum::Router, path: &str, token: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .header("authorization", format!("Bearer {}", token))
                .header("x-forwarded-for", fresh_ip())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET a path with no credentials, from a fresh client address.
pub async fn get_anonymous(app: &axum::Router, path: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .header("x-forwarded-for", fresh_ip())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// POST a JSON body with a bearer token, from a fresh client address.
pub async fn post_json_with_token(
    app: &axum::Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}
