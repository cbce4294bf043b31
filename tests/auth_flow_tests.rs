//! Tests for the Google login, refresh, logout, session listing, and
//! profile endpoints.
//!
//! Tests cover:
//! - First login creates the user; later logins reuse it
//! - Linking a Google account to an existing user matched by email
//! - Rejected, unverified, and missing ID tokens
//! - Suspended and banned accounts
//! - Session-bound refresh, including revoked and expired sessions
//! - Logout of the current session, a named session, and all devices
//! - Device metadata recorded on the session row
//! - Listing the caller's active sessions per device

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use bookgate::db::unix_now;
use bookgate::jwt::REFRESH_TOKEN_DURATION_SECS;
use common::*;
use serde_json::json;
use tower::ServiceExt;

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_first_login_creates_user() {
    let (app, db, verifier) = create_test_app().await;

    let body = login(&app, &verifier, "g-1", "alice@example.com").await;

    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["isNewUser"], true);
    assert_eq!(body["user"]["isAdmin"], false);
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["status"], "active");
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 900);
    assert!(body["accessToken"].as_str().is_some());
    assert!(body["refreshToken"].as_str().is_some());

    let user = db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(user.google_id.as_deref(), Some("g-1"));

    let sessions = db
        .sessions()
        .find_active_by_user(&user.id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_second_login_is_not_new_user() {
    let (app, _db, verifier) = create_test_app().await;

    let first = login(&app, &verifier, "g-1", "alice@example.com").await;
    let second = login(&app, &verifier, "g-1", "alice@example.com").await;

    assert_eq!(first["user"]["isNewUser"], true);
    assert_eq!(second["user"]["isNewUser"], false);
    assert_eq!(first["user"]["id"], second["user"]["id"]);
}

#[tokio::test]
async fn test_login_links_google_account_by_email() {
    let (app, db, verifier) = create_test_app().await;

    // Account created before any Google login, matched by email.
    db.users()
        .create("user-1", "alice@example.com", "Alice", unix_now())
        .await
        .unwrap();

    let body = login(&app, &verifier, "g-9", "alice@example.com").await;
    assert_eq!(body["user"]["id"], "user-1");
    assert_eq!(body["user"]["isNewUser"], false);

    let user = db.users().get_by_id("user-1").await.unwrap().unwrap();
    assert_eq!(user.google_id.as_deref(), Some("g-9"));
}

#[tokio::test]
async fn test_login_rejected_token() {
    let (app, _db, _verifier) = create_test_app().await;

    // Nothing registered with the stub, so any token is rejected.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"googleIdToken": "forged"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["message"], "Google authentication failed");
}

#[tokio::test]
async fn test_login_unverified_email() {
    let (app, _db, verifier) = create_test_app().await;

    let mut profile = StubVerifier::profile("g-1", "alice@example.com");
    profile.email_verified = false;
    verifier.allow("idtok-unverified", profile);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"googleIdToken": "idtok-unverified"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Email not verified");
}

#[tokio::test]
async fn test_login_empty_token() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"googleIdToken": ""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["message"], "Google ID token is required");
}

#[tokio::test]
async fn test_login_malformed_body() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn test_suspended_account_cannot_login() {
    let (app, db, verifier) = create_test_app().await;

    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    db.users()
        .set_status(
            &user_id,
            bookgate::db::UserStatus::Suspended,
            None,
            None,
            unix_now(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"googleIdToken": "idtok-g-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Account Restricted");
    assert_eq!(body["message"], "Account is suspended");
}

#[tokio::test]
async fn test_banned_account_cannot_login() {
    let (app, db, verifier) = create_test_app().await;

    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    db.users()
        .set_status(
            &user_id,
            bookgate::db::UserStatus::Banned,
            None,
            Some("abuse"),
            unix_now(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"googleIdToken": "idtok-g-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Account is banned");
}

#[tokio::test]
async fn test_lapsed_suspension_allows_login() {
    let (app, db, verifier) = create_test_app().await;

    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    // Suspension that ended an hour ago.
    db.users()
        .set_status(
            &user_id,
            bookgate::db::UserStatus::Suspended,
            Some(unix_now() - 3600),
            None,
            unix_now(),
        )
        .await
        .unwrap();

    let second = login(&app, &verifier, "g-1", "alice@example.com").await;
    assert_eq!(second["user"]["id"], user_id.as_str());
}

// =============================================================================
// Device Metadata Tests
// =============================================================================

#[tokio::test]
async fn test_login_records_device_from_user_agent() {
    let (app, db, verifier) = create_test_app().await;
    verifier.allow("idtok-g-1", StubVerifier::profile("g-1", "alice@example.com"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "203.0.113.7")
                .header(
                    "user-agent",
                    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
                )
                .body(Body::from(r#"{"googleIdToken": "idtok-g-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let user_id = body["user"]["id"].as_str().unwrap();

    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].device_type.as_deref(), Some("mobile"));
    assert_eq!(sessions[0].os.as_deref(), Some("iOS"));
    assert_eq!(sessions[0].browser.as_deref(), Some("Safari"));
    assert_eq!(sessions[0].ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_explicit_device_info_wins_over_user_agent() {
    let (app, db, verifier) = create_test_app().await;
    verifier.allow("idtok-g-1", StubVerifier::profile("g-1", "alice@example.com"));

    let body = json!({
        "googleIdToken": "idtok-g-1",
        "deviceInfo": { "type": "desktop", "os": "Windows", "browser": "Edge" }
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .header("user-agent", "Mozilla/5.0 (iPhone) Safari/604.1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let user_id = body["user"]["id"].as_str().unwrap();

    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions[0].device_type.as_deref(), Some("desktop"));
    assert_eq!(sessions[0].os.as_deref(), Some("Windows"));
    assert_eq!(sessions[0].browser.as_deref(), Some("Edge"));
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_issues_access_token_for_same_session() {
    let (app, _db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let refresh = body["refreshToken"].as_str().unwrap();
    let original_access = body["accessToken"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(
                    json!({ "refreshToken": refresh }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;
    assert_eq!(refreshed["tokenType"], "Bearer");
    assert_eq!(refreshed["expiresIn"], 900);

    // The new access token stays bound to the session opened at login.
    let tokens = token_service();
    let old = tokens.verify_access_token(original_access).unwrap();
    let new = tokens
        .verify_access_token(refreshed["accessToken"].as_str().unwrap())
        .unwrap();
    assert_eq!(old.session_id, new.session_id);
    assert_eq!(old.sub, new.sub);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (app, _db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let access = body["accessToken"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(json!({ "refreshToken": access }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid Token");
    assert_eq!(body["message"], "Token is invalid");
}

#[tokio::test]
async fn test_refresh_empty_token() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"refreshToken": ""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Refresh token is required");
}

#[tokio::test]
async fn test_refresh_garbage_token() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(r#"{"refreshToken": "not.a.jwt"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid Token");
}

#[tokio::test]
async fn test_refresh_after_logout_is_rejected() {
    let (app, _db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let access = body["accessToken"].as_str().unwrap();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    let response = post_json_with_token(&app, "/auth/logout", access, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The refresh token still verifies cryptographically, but the session
    // row is revoked.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(json!({ "refreshToken": refresh }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Session Expired");
    assert_eq!(body["message"], "Session has expired or been revoked");
}

#[tokio::test]
async fn test_refresh_after_session_expiry_sweep() {
    let (app, db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    // Sweep with a far-future clock so the session counts as expired.
    let far_future = unix_now() + REFRESH_TOKEN_DURATION_SECS as i64 + 10;
    let swept = db.sessions().deactivate_expired(far_future).await.unwrap();
    assert_eq!(swept, 1);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(json!({ "refreshToken": refresh }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Session Expired");
}

#[tokio::test]
async fn test_refresh_rejected_for_suspended_user() {
    let (app, db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let refresh = body["refreshToken"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    db.users()
        .set_status(
            &user_id,
            bookgate::db::UserStatus::Suspended,
            None,
            None,
            unix_now(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(json!({ "refreshToken": refresh }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Account Restricted");
}

// =============================================================================
// Logout Tests
// =============================================================================

#[tokio::test]
async fn test_logout_revokes_current_session() {
    let (app, db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let access = body["accessToken"].as_str().unwrap();
    let user_id = body["user"]["id"].as_str().unwrap();

    let response = post_json_with_token(&app, "/auth/logout", access, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let out = body_json(response).await;
    assert_eq!(out["message"], "Logged out successfully");

    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_logout_all_devices() {
    let (app, db, verifier) = create_test_app().await;
    let first = login(&app, &verifier, "g-1", "alice@example.com").await;
    let _second = login(&app, &verifier, "g-1", "alice@example.com").await;
    let access = first["accessToken"].as_str().unwrap();
    let user_id = first["user"]["id"].as_str().unwrap();

    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);

    let response =
        post_json_with_token(&app, "/auth/logout", access, json!({ "allDevices": true })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let out = body_json(response).await;
    assert_eq!(out["message"], "Logged out from all devices");

    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_logout_named_session() {
    let (app, db, verifier) = create_test_app().await;
    let first = login(&app, &verifier, "g-1", "alice@example.com").await;
    let second = login(&app, &verifier, "g-1", "alice@example.com").await;
    let user_id = first["user"]["id"].as_str().unwrap();

    // Revoke the second session while authenticated with the first.
    let tokens = token_service();
    let second_session = tokens
        .verify_access_token(second["accessToken"].as_str().unwrap())
        .unwrap()
        .session_id;

    let response = post_json_with_token(
        &app,
        "/auth/logout",
        first["accessToken"].as_str().unwrap(),
        json!({ "sessionId": second_session }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert_ne!(sessions[0].id, second_session);
}

#[tokio::test]
async fn test_logout_cannot_revoke_another_users_session() {
    let (app, db, verifier) = create_test_app().await;
    let alice = login(&app, &verifier, "g-1", "alice@example.com").await;
    let bob = login(&app, &verifier, "g-2", "bob@example.com").await;

    let tokens = token_service();
    let bob_session = tokens
        .verify_access_token(bob["accessToken"].as_str().unwrap())
        .unwrap()
        .session_id;

    let response = post_json_with_token(
        &app,
        "/auth/logout",
        alice["accessToken"].as_str().unwrap(),
        json!({ "sessionId": bob_session }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Cannot revoke another user's session");

    // Bob's session is untouched.
    let bob_id = bob["user"]["id"].as_str().unwrap();
    let sessions = db
        .sessions()
        .find_active_by_user(bob_id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_logout_unknown_session() {
    let (app, _db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;

    let response = post_json_with_token(
        &app,
        "/auth/logout",
        body["accessToken"].as_str().unwrap(),
        json!({ "sessionId": "00000000-0000-0000-0000-000000000000" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Session Not Found");
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_logout_with_no_resolvable_session() {
    let (app, db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let user_id = body["user"]["id"].as_str().unwrap();
    let email = body["user"]["email"].as_str().unwrap();

    // A token with an empty session id authenticates but names no session.
    let detached = token_service()
        .issue_access_token(user_id, email, "")
        .unwrap();
    let response = post_json_with_token(&app, "/auth/logout", &detached.token, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let out = body_json(response).await;
    assert_eq!(out["message"], "No session to log out");

    // The login session is still active.
    let sessions = db
        .sessions()
        .find_active_by_user(user_id, unix_now())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
}

// =============================================================================
// Session Listing Tests
// =============================================================================

#[tokio::test]
async fn test_sessions_lists_devices_with_current_flag() {
    let (app, _db, verifier) = create_test_app().await;
    let first = login(&app, &verifier, "g-1", "alice@example.com").await;

    // A second device logs in with explicit metadata.
    let body = json!({
        "googleIdToken": "idtok-g-1",
        "deviceInfo": { "type": "mobile", "os": "iOS", "browser": "Safari" }
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header("content-type", "application/json")
                .header("x-forwarded-for", fresh_ip())
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_token(
        &app,
        "/auth/sessions",
        first["accessToken"].as_str().unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let out = body_json(response).await;
    let sessions = out["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);

    // Exactly one entry is the caller's own session.
    let current: Vec<_> = sessions.iter().filter(|s| s["current"] == true).collect();
    assert_eq!(current.len(), 1);

    let other: Vec<_> = sessions.iter().filter(|s| s["current"] == false).collect();
    assert_eq!(other.len(), 1);
    assert_eq!(other[0]["deviceType"], "mobile");
    assert_eq!(other[0]["os"], "iOS");
    assert_eq!(other[0]["browser"], "Safari");

    for session in sessions {
        assert!(session["id"].as_str().is_some());
        assert!(session["lastActivityAt"].as_str().unwrap().ends_with('Z'));
        assert!(session["idleSeconds"].as_i64().unwrap() >= 0);
    }
}

#[tokio::test]
async fn test_sessions_requires_authentication() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = get_anonymous(&app, "/auth/sessions").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_shows_only_callers_sessions() {
    let (app, _db, verifier) = create_test_app().await;
    let alice = login(&app, &verifier, "g-1", "alice@example.com").await;
    let _bob = login(&app, &verifier, "g-2", "bob@example.com").await;

    let response = get_with_token(
        &app,
        "/auth/sessions",
        alice["accessToken"].as_str().unwrap(),
    )
    .await;
    let out = body_json(response).await;
    let sessions = out["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["current"], true);
}

#[tokio::test]
async fn test_sessions_feed_named_logout() {
    let (app, _db, verifier) = create_test_app().await;
    let first = login(&app, &verifier, "g-1", "alice@example.com").await;
    let _second = login(&app, &verifier, "g-1", "alice@example.com").await;
    let access = first["accessToken"].as_str().unwrap();

    // The listing is where a client finds the id of the device to revoke.
    let response = get_with_token(&app, "/auth/sessions", access).await;
    let out = body_json(response).await;
    let other_id = out["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["current"] == false)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response =
        post_json_with_token(&app, "/auth/logout", access, json!({ "sessionId": other_id })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_token(&app, "/auth/sessions", access).await;
    let out = body_json(response).await;
    let sessions = out["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["current"], true);
}

// =============================================================================
// Profile Tests
// =============================================================================

#[tokio::test]
async fn test_profile_returns_current_user() {
    let (app, _db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;

    let response =
        get_with_token(&app, "/auth/profile", body["accessToken"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["email"], "alice@example.com");
    assert_eq!(profile["isAdmin"], false);
    assert_eq!(profile["isSuperAdmin"], false);
    // isNewUser only appears on the login response.
    assert!(profile.get("isNewUser").is_none());
}

#[tokio::test]
async fn test_profile_requires_authentication() {
    let (app, _db, _verifier) = create_test_app().await;

    let response = get_anonymous(&app, "/auth/profile").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_for_deleted_user() {
    let (app, db, verifier) = create_test_app().await;
    let body = login(&app, &verifier, "g-1", "alice@example.com").await;
    let user_id = body["user"]["id"].as_str().unwrap();

    db.users().delete(user_id).await.unwrap();

    let response =
        get_with_token(&app, "/auth/profile", body["accessToken"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let out = body_json(response).await;
    assert_eq!(out["error"], "User Not Found");
}
