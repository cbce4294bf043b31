//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;

use crate::authz::{Admin, AdminPermissions};
use crate::db::{Database, unix_now};
use crate::google::{GoogleIdTokenVerifier, IdTokenVerifier};
use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bookgate",
    about = "Authentication and admin gateway for the booking service"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "bookgate.db")]
    pub database: String,

    /// Google OAuth client ID; login tokens must name it as their audience
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: String,

    /// Path to a PEM file with Google's current token-signing public keys
    #[arg(long)]
    pub google_certs: String,

    /// Path to file containing the access-token signing secret.
    /// Prefer the ACCESS_TOKEN_SECRET environment variable
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh-token signing secret.
    /// Prefer the REFRESH_TOKEN_SECRET environment variable
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Grant admin rights to the user with this email, then continue startup
    #[arg(long, value_name = "EMAIL")]
    pub grant_admin: Option<String>,

    /// With --grant-admin, grant super-admin rights instead
    #[arg(long = "super", requires = "grant_admin")]
    pub super_admin: bool,

    /// With --grant-admin, a JSON object of permission overrides merged over
    /// the defaults, e.g. '{"settings": true}'
    #[arg(
        long,
        requires = "grant_admin",
        conflicts_with = "super_admin",
        value_name = "JSON"
    )]
    pub permissions: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load one signing secret from the given environment variable, falling back
/// to a secret file. Returns None after logging if no usable secret is found.
fn load_token_secret(env_var: &str, flag: &str, secret_file: Option<&str>) -> Option<Vec<u8>> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to avoid leaking it to child processes.
        // SAFETY: We're single-threaded at this point during startup, and no
        // other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the environment variable (recommended) or pass {}",
            env_var, flag
        );
        return None;
    };

    if secret.len() < MIN_TOKEN_SECRET_LENGTH {
        error!(
            "{} must be at least {} characters",
            env_var, MIN_TOKEN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret.into_bytes())
}

/// Load both signing secrets. The pair must differ, or a refresh token would
/// pass access-token verification up to the type claim.
pub fn load_token_secrets(args: &Args) -> Option<(Vec<u8>, Vec<u8>)> {
    let access = load_token_secret(
        "ACCESS_TOKEN_SECRET",
        "--access-secret-file",
        args.access_secret_file.as_deref(),
    )?;
    let refresh = load_token_secret(
        "REFRESH_TOKEN_SECRET",
        "--refresh-secret-file",
        args.refresh_secret_file.as_deref(),
    )?;
    if access == refresh {
        error!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        return None;
    }
    Some((access, refresh))
}

/// Build the Google ID token verifier from the configured certs file.
pub fn load_google_verifier(client_id: &str, certs_path: &str) -> Option<Arc<dyn IdTokenVerifier>> {
    let pem = match std::fs::read_to_string(certs_path) {
        Ok(pem) => pem,
        Err(e) => {
            error!(path = %certs_path, error = %e, "Failed to read Google certs file");
            return None;
        }
    };
    match GoogleIdTokenVerifier::new(client_id, &pem) {
        Ok(verifier) => Some(Arc::new(verifier)),
        Err(e) => {
            error!(error = %e, "Failed to load Google signing keys");
            None
        }
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

/// Parse the --permissions JSON into a flag set, merged over the defaults.
fn parse_permission_overrides(raw: Option<&str>) -> Option<AdminPermissions> {
    let Some(raw) = raw else {
        return Some(AdminPermissions::default());
    };
    let json: serde_json::Value = match serde_json::from_str(raw) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "--permissions is not valid JSON");
            return None;
        }
    };
    match AdminPermissions::from_json(&json) {
        Ok(flags) => Some(flags),
        Err(e) => {
            error!(error = %e, "--permissions rejected");
            None
        }
    }
}

/// Handle the --grant-admin flag: promote an existing user to admin.
/// Exits the process on failure so a typo never starts an unprotected server.
pub async fn handle_grant_admin(
    db: &Database,
    email: &str,
    super_admin: bool,
    permissions: Option<&str>,
) {
    let Some(flags) = parse_permission_overrides(permissions) else {
        std::process::exit(1);
    };

    let user = match db.users().get_by_email(email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            error!(email = %email, "No user with this email; they must log in once first");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Failed to look up user");
            std::process::exit(1);
        }
    };

    let now = unix_now();
    let admin = if super_admin {
        Admin::super_admin(Uuid::new_v4().to_string(), &user.id, now)
    } else {
        Admin::regular(Uuid::new_v4().to_string(), &user.id, flags, now)
    };
    match db
        .admins()
        .upsert(
            &admin.id,
            &admin.user_id,
            &admin.permissions(),
            admin.is_super_admin,
            now,
        )
        .await
    {
        Ok(()) => {
            let role = if super_admin { "super-admin" } else { "admin" };
            println!("Granted {} rights to {}", role, email);
        }
        Err(e) => {
            error!(error = %e, "Failed to grant admin rights");
            std::process::exit(1);
        }
    }
}
