//! Server-side session storage.
//!
//! Every login creates a session row; both tokens it issues carry the row's
//! id. Token signatures prove authenticity, but the row decides whether the
//! session is still good: refresh checks it, and revocation flips it off
//! without waiting for any token to expire.
//!
//! Tokens themselves are never stored, only SHA-256 hashes for audit.

use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;

/// A session record.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    pub expires_at: i64,
    pub last_activity_at: i64,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Fields for a new session row.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub access_token_hash: &'a str,
    pub refresh_token_hash: &'a str,
    pub expires_at: i64,
    pub device_type: Option<&'a str>,
    pub os: Option<&'a str>,
    pub browser: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    access_token_hash: String,
    refresh_token_hash: String,
    expires_at: i64,
    last_activity_at: i64,
    device_type: Option<String>,
    os: Option<String>,
    browser: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    is_active: i32,
    created_at: i64,
}

impl Session {
    /// Seconds since the session was last used.
    pub fn idle_seconds(&self, now: i64) -> i64 {
        (now - self.last_activity_at).max(0)
    }
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            access_token_hash: row.access_token_hash,
            refresh_token_hash: row.refresh_token_hash,
            expires_at: row.expires_at,
            last_activity_at: row.last_activity_at,
            device_type: row.device_type,
            os: row.os,
            browser: row.browser,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            is_active: row.is_active != 0,
            created_at: row.created_at,
        }
    }
}

/// Store for managing sessions.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new active session row.
    pub async fn create(&self, session: &NewSession<'_>, now: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, access_token_hash, refresh_token_hash, expires_at, last_activity_at, device_type, os, browser, ip_address, user_agent, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.access_token_hash)
        .bind(session.refresh_token_hash)
        .bind(session.expires_at)
        .bind(now)
        .bind(session.device_type)
        .bind(session.os)
        .bind(session.browser)
        .bind(session.ip_address)
        .bind(session.user_agent)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a session by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, access_token_hash, refresh_token_hash, expires_at, last_activity_at, device_type, os, browser, ip_address, user_agent, is_active, created_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    /// List a user's live sessions, most recently used first.
    pub async fn find_active_by_user(
        &self,
        user_id: &str,
        now: i64,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, access_token_hash, refresh_token_hash, expires_at, last_activity_at, device_type, os, browser, ip_address, user_agent, is_active, created_at FROM sessions WHERE user_id = ? AND is_active = 1 AND expires_at > ? ORDER BY last_activity_at DESC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    /// Record a refresh: store the new access token hash and bump activity.
    ///
    /// The guard clauses make the row authoritative: a missing, revoked, or
    /// expired session leaves zero rows affected no matter what token the
    /// caller presented.
    pub async fn rotate(
        &self,
        id: &str,
        access_token_hash: &str,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET access_token_hash = ?, last_activity_at = ? WHERE id = ? AND is_active = 1 AND expires_at > ?",
        )
        .bind(access_token_hash)
        .bind(now)
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke a session. The row is kept, only deactivated. Returns whether
    /// the call changed anything; revoking twice is harmless.
    pub async fn revoke(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sessions SET is_active = 0 WHERE id = ? AND is_active = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active session of a user. Returns the number revoked.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET is_active = 0 WHERE user_id = ? AND is_active = 1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Deactivate sessions past their expiry. Returns the number deactivated.
    pub async fn deactivate_expired(&self, now: i64) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET is_active = 0 WHERE is_active = 1 AND expires_at <= ?")
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Delete inactive sessions whose last activity predates the cutoff.
    /// Active sessions are never deleted here.
    pub async fn purge_stale(&self, cutoff: i64) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE is_active = 0 AND last_activity_at < ?")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

/// SHA-256 hex digest of a token, as stored on session rows.
pub fn token_hash(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
