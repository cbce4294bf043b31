//! Per-request authentication gate.
//!
//! One middleware layer in front of the whole router. Each request is
//! classified by path, authenticated when the class demands it, checked
//! against the admin resolver for admin paths, and forwarded annotated with
//! identity headers. Every request ends in exactly one of: forward with
//! headers, 401, one of two 403 variants, or one of two redirects.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::errors::AuthDenial;
use super::extractors::bearer_or_cookie;
use super::paths::{RouteClass, classify};
use crate::AppState;
use crate::api::error::ApiError;
use crate::authz::AdminAccess;
use crate::jwt::Claims;

/// Identity headers set on forwarded requests. Handlers read these instead
/// of re-resolving authorization. Inbound copies are stripped on every
/// request, so their presence always means the gate vouched for them.
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-user-email");
pub const USER_PHONE_HEADER: HeaderName = HeaderName::from_static("x-user-phone");
pub const IS_ADMIN_HEADER: HeaderName = HeaderName::from_static("x-is-admin");
pub const IS_SUPERADMIN_HEADER: HeaderName = HeaderName::from_static("x-is-superadmin");

/// The authentication gate, applied to the router via
/// `middleware::from_fn_with_state`.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    // Never trust client-supplied identity headers.
    strip_identity_headers(request.headers_mut());

    let class = classify(&path);
    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let claims = match bearer_or_cookie(request.headers())
        .and_then(|token| state.tokens.verify_access_token(token).ok())
    {
        Some(claims) => claims,
        None => {
            return AuthDenial::Unauthenticated.into_response_for(&path);
        }
    };

    // User routes need nothing beyond a valid token. Admin routes consult
    // the resolver; the super-admin check only runs once the admin check
    // has passed.
    let mut access = AdminAccess::NONE;
    if matches!(class, RouteClass::Admin | RouteClass::SuperAdmin) {
        access = match state.resolver.resolve(&claims.email).await {
            Ok(access) => access,
            Err(e) => {
                return ApiError::db_error("Failed to resolve admin status", e).into_response();
            }
        };
        if !access.is_admin {
            warn!(path = %path, email = %claims.email, "admin route denied");
            return AuthDenial::NotAdmin.into_response_for(&path);
        }
        if class == RouteClass::SuperAdmin && !access.is_super_admin {
            warn!(path = %path, email = %claims.email, "super-admin route denied");
            return AuthDenial::NotSuperAdmin.into_response_for(&path);
        }
    }

    annotate_request(request.headers_mut(), &claims, access);
    next.run(request).await
}

fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in [
        &USER_ID_HEADER,
        &USER_EMAIL_HEADER,
        &USER_PHONE_HEADER,
        &IS_ADMIN_HEADER,
        &IS_SUPERADMIN_HEADER,
    ] {
        headers.remove(name);
    }
}

fn annotate_request(headers: &mut HeaderMap, claims: &Claims, access: AdminAccess) {
    headers.insert(USER_ID_HEADER, ascii_value(&claims.sub));
    headers.insert(USER_EMAIL_HEADER, ascii_value(&claims.email));
    // Token claims carry no phone number; the slot stays empty.
    headers.insert(USER_PHONE_HEADER, HeaderValue::from_static(""));
    headers.insert(IS_ADMIN_HEADER, bool_value(access.is_admin));
    headers.insert(IS_SUPERADMIN_HEADER, bool_value(access.is_super_admin));
}

fn ascii_value(s: &str) -> HeaderValue {
    HeaderValue::from_str(s).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn bool_value(b: bool) -> HeaderValue {
    HeaderValue::from_static(if b { "true" } else { "false" })
}
