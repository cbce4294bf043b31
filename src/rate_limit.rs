//! Per-IP rate limiting for the HTTP surface.
//!
//! Token buckets keyed by client IP: a strict budget for the authentication
//! endpoints and a general one for the rest of the API.

use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};

use crate::api::error::ApiError;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const AUTH_BURST: u32 = 5;
/// One auth token replenishes every 3 minutes, i.e. 5 per 15 minutes.
const AUTH_REPLENISH_SECS: u64 = 15 * 60 / AUTH_BURST as u64;
const API_PER_MINUTE: u32 = 30;

/// Rate limiting configuration, shared across requests.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Budget for login/refresh/logout/profile: 5 requests per 15 minutes.
    pub auth: Arc<IpLimiter>,
    /// General API budget: 30 requests per minute.
    pub api: Arc<IpLimiter>,
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self {
            auth: Arc::new(RateLimiter::keyed(
                Quota::with_period(Duration::from_secs(AUTH_REPLENISH_SECS))
                    .unwrap()
                    .allow_burst(NonZeroU32::new(AUTH_BURST).unwrap()),
            )),
            api: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(API_PER_MINUTE).unwrap(),
            ))),
        }
    }
}

/// Middleware applying the budget that matches the request path. Sits in
/// front of the auth gate so repeated attempts are shed before any token
/// verification happens.
pub async fn rate_limit(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let budget = {
        let path = request.uri().path();
        if path.starts_with("/auth") {
            Some((
                &config.auth,
                "Too many authentication attempts. Please wait before trying again.",
            ))
        } else if path.starts_with("/api/") {
            Some((&config.api, "Too many requests. Please try again later."))
        } else {
            None
        }
    };
    let Some((limiter, message)) = budget else {
        return next.run(request).await;
    };

    let ip = client_ip(&request);
    match limiter.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => ApiError::too_many_requests(message).into_response(),
    }
}

/// Rate-limit key. First x-forwarded-for entry when present (the production
/// deployment sits behind a proxy), else the socket address.
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
