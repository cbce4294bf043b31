//! Axum extractors for handlers that sit outside the gate.
//!
//! The `/auth/*` endpoints are excluded from path-based gating (they are the
//! re-authentication primitives themselves), so logout and profile carry
//! their own token check via `ApiAuth`.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use crate::AppState;
use crate::api::error::ApiError;
use crate::jwt::Claims;

/// Pull the access token from the `Authorization: Bearer` header, falling
/// back to the cookie set for page navigation.
pub fn bearer_or_cookie(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Some(token) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            return Some(token.trim());
        }
    }
    get_cookie(headers, ACCESS_COOKIE_NAME)
}

/// Extractor requiring a verified access token. Yields the token claims;
/// handlers that need the full user record load it themselves.
pub struct ApiAuth(pub Claims);

impl FromRequestParts<AppState> for ApiAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_or_cookie(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        let claims = state
            .tokens
            .verify_access_token(token)
            .map_err(|_| ApiError::unauthorized("Authentication required"))?;
        Ok(ApiAuth(claims))
    }
}
