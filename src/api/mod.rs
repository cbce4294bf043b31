pub mod auth;
pub mod error;

use axum::{Json, Router, http::HeaderMap, http::HeaderName, routing::get};

use crate::AppState;
use crate::auth::{
    IS_ADMIN_HEADER, IS_SUPERADMIN_HEADER, USER_EMAIL_HEADER, USER_ID_HEADER, USER_PHONE_HEADER,
};

pub use error::{ApiError, ResultExt};

/// Create the API router: the `/auth` endpoints plus the health probes and
/// the identity endpoints that read what the gate forwarded.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth::router(state))
        .route("/api/health", get(health))
        // Monitoring probe inside the admin tree; the gate excludes it.
        .route("/api/admin/health", get(health))
        .route("/api/user/me", get(whoami))
        .route("/api/admin/me", get(whoami))
        .route("/api/admin/admins/me", get(whoami))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Echo the identity headers attached by the gate. The booking service's
/// handlers consume these headers the same way instead of re-resolving
/// authorization per request.
async fn whoami(headers: HeaderMap) -> Json<serde_json::Value> {
    let text = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    let flag = |name: &HeaderName| headers.get(name).map(|v| v == "true").unwrap_or(false);
    Json(serde_json::json!({
        "id": text(&USER_ID_HEADER),
        "email": text(&USER_EMAIL_HEADER),
        "phone": text(&USER_PHONE_HEADER),
        "isAdmin": flag(&IS_ADMIN_HEADER),
        "isSuperAdmin": flag(&IS_SUPERADMIN_HEADER),
    }))
}
