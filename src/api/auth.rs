//! Authentication API endpoints.
//!
//! - POST `/google` - Sign in with a Google ID token
//! - POST `/refresh` - Exchange a refresh token for a new access token
//! - POST `/logout` - Revoke the current session (or all of the caller's)
//! - GET `/sessions` - Active sessions for the caller's devices
//! - GET `/profile` - Current user's profile
//!
//! These routes sit outside the path gate; logout and profile authenticate
//! through the `ApiAuth` extractor instead.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, FromRequest, Request, State},
    http::{header, request::Parts},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{ApiError, ResultExt};
use crate::AppState;
use crate::auth::ApiAuth;
use crate::authz::AdminAccess;
use crate::db::{NewSession, User, UserRole, UserStatus, format_timestamp, token_hash, unix_now};
use crate::jwt::TokenError;

/// Request bodies past this size are rejected outright.
const BODY_LIMIT: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/google", post(google_login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/sessions", get(sessions))
        .route("/profile", get(profile))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleLoginRequest {
    #[serde(default)]
    google_id_token: String,
    #[serde(default)]
    device_info: Option<DeviceInfo>,
}

/// Device metadata stored on the session row. Clients may report it
/// explicitly; otherwise it is parsed from the User-Agent header.
#[derive(Default, Deserialize)]
struct DeviceInfo {
    #[serde(rename = "type")]
    device_type: Option<String>,
    os: Option<String>,
    browser: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    all_devices: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload {
    id: String,
    email: String,
    name: String,
    phone: Option<String>,
    role: UserRole,
    status: UserStatus,
    is_admin: bool,
    is_super_admin: bool,
    created_at: String,
    updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_new_user: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user: UserPayload,
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    token_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    expires_in: u64,
    token_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    id: String,
    device_type: Option<String>,
    os: Option<String>,
    browser: Option<String>,
    ip_address: Option<String>,
    last_activity_at: String,
    idle_seconds: i64,
    current: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionsResponse {
    sessions: Vec<SessionPayload>,
}

/// Sign in with a verified Google ID token. Creates the user on first
/// login, links the Google account to an existing user matched by email,
/// opens a session, and returns both tokens bound to it.
async fn google_login(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, body) = request.into_parts();
    let ip_address = extract_client_ip(&parts);
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let request = Request::from_parts(parts, body);
    let Json(body): Json<GoogleLoginRequest> = Json::from_request(request, &())
        .await
        .map_err(|_| ApiError::bad_request("Invalid request body"))?;

    if body.google_id_token.is_empty() {
        return Err(ApiError::bad_request("Google ID token is required"));
    }

    let google = match state.verifier.verify(&body.google_id_token) {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Google ID token rejected: {}", e);
            return Err(ApiError::unauthorized("Google authentication failed"));
        }
    };
    if !google.email_verified {
        return Err(ApiError::bad_request("Email not verified"));
    }

    let now = unix_now();
    let users = state.db.users();
    let (user, is_new_user) = match users
        .get_by_email(&google.email)
        .await
        .db_err("Failed to look up user")?
    {
        Some(mut user) => {
            if user.google_id.is_none() {
                users
                    .link_google_id(&user.id, &google.id, now)
                    .await
                    .db_err("Failed to link Google account")?;
                user.google_id = Some(google.id.clone());
            }
            (user, false)
        }
        None => {
            let id = Uuid::new_v4().to_string();
            let name = google.name.as_deref().unwrap_or("");
            users
                .create_from_google(&id, &google.email, name, &google.id, now)
                .await
                .db_err("Failed to create user")?;
            let user = users
                .get_by_id(&id)
                .await
                .db_err("Failed to load new user")?
                .ok_or_else(|| ApiError::internal("An unexpected error occurred"))?;
            (user, true)
        }
    };

    if !user.can_login(now) {
        return Err(ApiError::account_restricted(restriction_message(&user)));
    }

    let session_id = Uuid::new_v4().to_string();
    let access = state
        .tokens
        .issue_access_token(&user.id, &user.email, &session_id)
        .map_err(|e| ApiError::signing_error("Failed to issue access token", e))?;
    let refresh = state
        .tokens
        .issue_refresh_token(&user.id, &user.email, &session_id)
        .map_err(|e| ApiError::signing_error("Failed to issue refresh token", e))?;

    let device = body
        .device_info
        .or_else(|| user_agent.as_deref().map(parse_user_agent))
        .unwrap_or_default();
    let access_hash = token_hash(&access.token);
    let refresh_hash = token_hash(&refresh.token);
    state
        .db
        .sessions()
        .create(
            &NewSession {
                id: &session_id,
                user_id: &user.id,
                access_token_hash: &access_hash,
                refresh_token_hash: &refresh_hash,
                expires_at: refresh.expires_at as i64,
                device_type: device.device_type.as_deref(),
                os: device.os.as_deref(),
                browser: device.browser.as_deref(),
                ip_address: ip_address.as_deref(),
                user_agent: user_agent.as_deref(),
            },
            now,
        )
        .await
        .db_err("Failed to create session")?;

    let admin_access = state
        .resolver
        .resolve(&user.email)
        .await
        .db_err("Failed to resolve admin status")?;

    info!("User {} logged in", user.email);
    Ok(Json(LoginResponse {
        user: user_payload(&user, admin_access, Some(is_new_user)),
        access_token: access.token,
        refresh_token: refresh.token,
        expires_in: access.duration,
        token_type: "Bearer",
    }))
}

/// Mint a new access token for an existing session. The session row is
/// authoritative: a revoked or expired session rejects even a refresh token
/// that still verifies cryptographically. The refresh token itself is not
/// rotated; it stays valid until its own expiry or logout.
async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token is required"));
    }

    let claims = state
        .tokens
        .verify_refresh_token(&body.refresh_token)
        .map_err(|e| match e {
            TokenError::Expired => ApiError::session_expired("Session has expired or been revoked"),
            _ => ApiError::invalid_token("Token is invalid"),
        })?;

    let now = unix_now();
    let session = state
        .db
        .sessions()
        .get_by_id(&claims.session_id)
        .await
        .db_err("Failed to look up session")?
        .ok_or_else(|| ApiError::session_expired("Session has expired or been revoked"))?;
    if !session.is_active || session.expires_at <= now {
        return Err(ApiError::session_expired("Session has expired or been revoked"));
    }

    let user = state
        .db
        .users()
        .get_by_id(&session.user_id)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::user_not_found("User not found"))?;
    if !user.can_login(now) {
        return Err(ApiError::account_restricted(restriction_message(&user)));
    }

    let access = state
        .tokens
        .issue_access_token(&user.id, &user.email, &session.id)
        .map_err(|e| ApiError::signing_error("Failed to issue access token", e))?;

    // The update re-checks active/expiry, closing the race with a
    // concurrent logout between the lookup above and this write.
    let rotated = state
        .db
        .sessions()
        .rotate(&session.id, &token_hash(&access.token), now)
        .await
        .db_err("Failed to update session")?;
    if !rotated {
        return Err(ApiError::session_expired("Session has expired or been revoked"));
    }

    Ok(Json(RefreshResponse {
        access_token: access.token,
        expires_in: access.duration,
        token_type: "Bearer",
    }))
}

/// Revoke the caller's current session, a specific session the caller owns,
/// or every session the caller has.
async fn logout(
    State(state): State<AppState>,
    ApiAuth(claims): ApiAuth,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let body: LogoutRequest = read_optional_json(request).await?;

    if body.all_devices {
        let count = state
            .db
            .sessions()
            .revoke_all_for_user(&claims.sub)
            .await
            .db_err("Failed to revoke sessions")?;
        info!("User {} logged out of {} sessions", claims.email, count);
        return Ok(Json(
            serde_json::json!({ "message": "Logged out from all devices" }),
        ));
    }

    let target = body
        .session_id
        .filter(|id| !id.is_empty())
        .or_else(|| (!claims.session_id.is_empty()).then(|| claims.session_id.clone()));
    let Some(target) = target else {
        return Err(ApiError::bad_request("No session to log out"));
    };

    // Ownership is checked server-side; the client-supplied id is never
    // trusted on its own.
    let session = state
        .db
        .sessions()
        .get_by_id(&target)
        .await
        .db_err("Failed to look up session")?
        .ok_or_else(|| ApiError::session_not_found("Session not found"))?;
    if session.user_id != claims.sub {
        return Err(ApiError::forbidden("Cannot revoke another user's session"));
    }

    state
        .db
        .sessions()
        .revoke(&target)
        .await
        .db_err("Failed to revoke session")?;
    Ok(Json(
        serde_json::json!({ "message": "Logged out successfully" }),
    ))
}

/// Active sessions for the caller, most recently used first. The ids listed
/// here are what a logout request names to revoke a single device.
async fn sessions(
    State(state): State<AppState>,
    ApiAuth(claims): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    let now = unix_now();
    let sessions = state
        .db
        .sessions()
        .find_active_by_user(&claims.sub, now)
        .await
        .db_err("Failed to list sessions")?;

    let sessions = sessions
        .into_iter()
        .map(|session| SessionPayload {
            current: session.id == claims.session_id,
            idle_seconds: session.idle_seconds(now),
            last_activity_at: format_timestamp(session.last_activity_at),
            id: session.id,
            device_type: session.device_type,
            os: session.os,
            browser: session.browser,
            ip_address: session.ip_address,
        })
        .collect();
    Ok(Json(SessionsResponse { sessions }))
}

/// Current user's profile, with admin flags from the resolver.
async fn profile(
    State(state): State<AppState>,
    ApiAuth(claims): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(&claims.sub)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::user_not_found("User not found"))?;
    let admin_access = state
        .resolver
        .resolve(&user.email)
        .await
        .db_err("Failed to resolve admin status")?;
    Ok(Json(user_payload(&user, admin_access, None)))
}

fn user_payload(user: &User, access: AdminAccess, is_new_user: Option<bool>) -> UserPayload {
    UserPayload {
        id: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        phone: user.phone.clone(),
        role: user.role,
        status: user.status,
        is_admin: access.is_admin,
        is_super_admin: access.is_super_admin,
        created_at: format_timestamp(user.created_at),
        updated_at: format_timestamp(user.updated_at),
        is_new_user,
    }
}

fn restriction_message(user: &User) -> &'static str {
    match user.status {
        UserStatus::Banned => "Account is banned",
        _ => "Account is suspended",
    }
}

/// Deserialize a JSON body, treating an absent body as all defaults.
async fn read_optional_json<T: serde::de::DeserializeOwned + Default>(
    request: Request,
) -> Result<T, ApiError> {
    let bytes = axum::body::to_bytes(request.into_body(), BODY_LIMIT)
        .await
        .map_err(|_| ApiError::bad_request("Invalid request body"))?;
    if bytes.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|_| ApiError::bad_request("Invalid request body"))
}

/// Client address for the session audit trail. Behind the production proxy
/// the socket address is the proxy itself, so x-forwarded-for wins.
fn extract_client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
}

/// Best-effort device classification from the User-Agent string. Order
/// matters throughout: tablets report Mobile, Android reports Linux, iOS
/// reports Mac OS X, and every WebKit browser reports Safari.
fn parse_user_agent(ua: &str) -> DeviceInfo {
    let lower = ua.to_ascii_lowercase();

    let device_type = if lower.contains("tablet") || lower.contains("ipad") {
        "tablet"
    } else if lower.contains("mobile") || lower.contains("android") || lower.contains("iphone") {
        "mobile"
    } else {
        "desktop"
    };

    let os = if lower.contains("windows") {
        "Windows"
    } else if lower.contains("android") {
        "Android"
    } else if lower.contains("iphone") || lower.contains("ipad") || lower.contains("ipod") {
        "iOS"
    } else if lower.contains("mac os x") || lower.contains("macintosh") {
        "macOS"
    } else if lower.contains("linux") {
        "Linux"
    } else {
        "Unknown"
    };

    let browser = if lower.contains("edg") {
        "Edge"
    } else if lower.contains("chrome") || lower.contains("crios") {
        "Chrome"
    } else if lower.contains("firefox") || lower.contains("fxios") {
        "Firefox"
    } else if lower.contains("safari") {
        "Safari"
    } else {
        "Unknown"
    };

    DeviceInfo {
        device_type: Some(device_type.to_string()),
        os: Some(os.to_string()),
        browser: Some(browser.to_string()),
    }
}
