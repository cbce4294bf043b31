use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Legacy role column. The admins table is the authority for admin access;
/// this field only backs the fallback for accounts created before that table
/// existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            "super_admin" => UserRole::SuperAdmin,
            _ => UserRole::User,
        }
    }
}

/// Account standing. Suspended and banned accounts cannot log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "suspended" => UserStatus::Suspended,
            "banned" => UserStatus::Banned,
            _ => UserStatus::Active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub google_id: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub suspended_until: Option<i64>,
    pub banned_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Whether a suspension is in force at the given time.
    /// A suspension without an end time never lapses on its own.
    pub fn is_suspended(&self, now: i64) -> bool {
        self.status == UserStatus::Suspended
            && self.suspended_until.is_none_or(|until| until > now)
    }

    /// Whether the account may start a new session at the given time.
    pub fn can_login(&self, now: i64) -> bool {
        match self.status {
            UserStatus::Active => true,
            UserStatus::Suspended => !self.is_suspended(now),
            UserStatus::Banned => false,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    phone: Option<String>,
    google_id: Option<String>,
    role: String,
    status: String,
    suspended_until: Option<i64>,
    banned_reason: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            google_id: row.google_id,
            role: UserRole::from_str(&row.role),
            status: UserStatus::from_str(&row.status),
            suspended_until: row.suspended_until,
            banned_reason: row.banned_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user without a linked Google account.
    pub async fn create(
        &self,
        id: &str,
        email: &str,
        name: &str,
        now: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, email, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Create a user from a verified Google profile.
    pub async fn create_from_google(
        &self,
        id: &str,
        email: &str,
        name: &str,
        google_id: &str,
        now: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, email, name, google_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(google_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, name, phone, google_id, role, status, suspended_until, banned_reason, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by email. The email column collates NOCASE, so lookups are
    /// case-insensitive.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, name, phone, google_id, role, status, suspended_until, banned_reason, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Attach a Google account id to an existing user.
    pub async fn link_google_id(
        &self,
        id: &str,
        google_id: &str,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET google_id = ?, updated_at = ? WHERE id = ?")
            .bind(google_id)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the legacy role for a user.
    pub async fn set_role(
        &self,
        id: &str,
        role: UserRole,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change account standing. Clearing a suspension resets both moderation
    /// columns.
    pub async fn set_status(
        &self,
        id: &str,
        status: UserStatus,
        suspended_until: Option<i64>,
        banned_reason: Option<&str>,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET status = ?, suspended_until = ?, banned_reason = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(suspended_until)
        .bind(banned_reason)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user by ID.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
