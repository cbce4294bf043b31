use bookgate::cli::{
    Args, handle_grant_admin, init_logging, load_google_verifier, load_token_secrets,
    open_database,
};
use bookgate::{ServerConfig, init_cleanup, run_server};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some((access_secret, refresh_secret)) = load_token_secrets(&args) else {
        std::process::exit(1);
    };

    let Some(verifier) = load_google_verifier(&args.google_client_id, &args.google_certs) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(email) = args.grant_admin.as_deref() {
        handle_grant_admin(&db, email, args.super_admin, args.permissions.as_deref()).await;
    }

    init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to get local address");
        std::process::exit(1);
    });

    let config = ServerConfig {
        db,
        verifier,
        access_secret,
        refresh_secret,
    };

    info!(address = %local_addr, "Listening");

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
