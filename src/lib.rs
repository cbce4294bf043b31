pub mod api;
pub mod auth;
pub mod authz;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod google;
pub mod jwt;
pub mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api::create_api_router;
use auth::auth_gate;
use authz::AdminAuthorizationResolver;
use axum::{
    Router,
    http::{Method, header},
    middleware,
};
use db::Database;
use google::IdTokenVerifier;
use jwt::TokenService;
use rate_limit::{RateLimitConfig, rate_limit};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Verifier for Google ID tokens presented at login
    pub verifier: Arc<dyn IdTokenVerifier>,
    /// Secret for signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret for signing refresh tokens; must differ from the access secret
    pub refresh_secret: Vec<u8>,
}

/// Shared state for handlers, extractors, and the request gate.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub verifier: Arc<dyn IdTokenVerifier>,
    pub resolver: Arc<AdminAuthorizationResolver>,
}

/// Browsers may cache preflight answers for a day.
const CORS_MAX_AGE: Duration = Duration::from_secs(86400);

/// Create the application router with the given configuration.
///
/// Layer order, outermost first: CORS (answers preflights before any
/// budget is spent), rate limiting, then the authentication gate.
pub fn create_app(config: &ServerConfig) -> Router {
    let state = AppState {
        db: config.db.clone(),
        tokens: Arc::new(TokenService::new(
            &config.access_secret,
            &config.refresh_secret,
        )),
        verifier: config.verifier.clone(),
        resolver: Arc::new(AdminAuthorizationResolver::new(config.db.clone())),
    };

    let rate_limits = Arc::new(RateLimitConfig::new());

    create_api_router(state.clone())
        .layer(middleware::from_fn_with_state(state, auth_gate))
        .layer(middleware::from_fn_with_state(rate_limits, rate_limit))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
