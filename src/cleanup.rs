//! Scheduled cleanup tasks for session data.

use crate::db::{Database, unix_now};
use std::time::Duration;
use tracing::{error, info};

/// Revoked or expired sessions older than this are purged outright.
/// Everything younger is kept as an audit trail.
const SESSION_RETENTION_DAYS: i64 = 90;

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    let now = unix_now();

    // Flip expired sessions to inactive so active-session queries stay honest
    match db.sessions().deactivate_expired(now).await {
        Ok(count) if count > 0 => info!("Deactivated {} expired sessions", count),
        Ok(_) => {}
        Err(e) => error!("Failed to deactivate expired sessions: {}", e),
    }

    // Purge inactive sessions past the retention window
    let cutoff = now - SESSION_RETENTION_DAYS * 24 * 60 * 60;
    match db.sessions().purge_stale(cutoff).await {
        Ok(count) if count > 0 => info!("Purged {} stale sessions", count),
        Ok(_) => {}
        Err(e) => error!("Failed to purge stale sessions: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}
