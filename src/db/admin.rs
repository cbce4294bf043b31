use sqlx::sqlite::SqlitePool;

use crate::authz::AdminPermissions;

/// An admin grant row. Presence of a row makes the user an admin; the flags
/// say which areas a regular admin can touch. Super admins ignore the flags.
#[derive(Debug, Clone)]
pub struct AdminRecord {
    pub id: String,
    pub user_id: String,
    pub permissions: AdminPermissions,
    pub is_super_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: String,
    user_id: String,
    perm_reservations: i32,
    perm_users: i32,
    perm_devices: i32,
    perm_cms: i32,
    perm_settings: i32,
    is_super_admin: i32,
    created_at: i64,
    updated_at: i64,
}

impl From<AdminRow> for AdminRecord {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            permissions: AdminPermissions {
                reservations: row.perm_reservations != 0,
                users: row.perm_users != 0,
                devices: row.perm_devices != 0,
                cms: row.perm_cms != 0,
                settings: row.perm_settings != 0,
            },
            is_super_admin: row.is_super_admin != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct AdminStore {
    pool: SqlitePool,
}

impl AdminStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the admin grant for a user, if any.
    pub async fn get_by_user_id(&self, user_id: &str) -> Result<Option<AdminRecord>, sqlx::Error> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, user_id, perm_reservations, perm_users, perm_devices, perm_cms, perm_settings, is_super_admin, created_at, updated_at FROM admins WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AdminRecord::from))
    }

    /// Create or replace a user's admin grant.
    pub async fn upsert(
        &self,
        id: &str,
        user_id: &str,
        permissions: &AdminPermissions,
        is_super_admin: bool,
        now: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO admins (id, user_id, perm_reservations, perm_users, perm_devices, perm_cms, perm_settings, is_super_admin, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                perm_reservations = excluded.perm_reservations,
                perm_users = excluded.perm_users,
                perm_devices = excluded.perm_devices,
                perm_cms = excluded.perm_cms,
                perm_settings = excluded.perm_settings,
                is_super_admin = excluded.is_super_admin,
                updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(permissions.reservations as i32)
        .bind(permissions.users as i32)
        .bind(permissions.devices as i32)
        .bind(permissions.cms as i32)
        .bind(permissions.settings as i32)
        .bind(is_super_admin as i32)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the permission flags on an existing grant.
    pub async fn set_permissions(
        &self,
        user_id: &str,
        permissions: &AdminPermissions,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE admins SET perm_reservations = ?, perm_users = ?, perm_devices = ?, perm_cms = ?, perm_settings = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(permissions.reservations as i32)
        .bind(permissions.users as i32)
        .bind(permissions.devices as i32)
        .bind(permissions.cms as i32)
        .bind(permissions.settings as i32)
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the super admin bit on an existing grant.
    pub async fn set_super_admin(
        &self,
        user_id: &str,
        is_super_admin: bool,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE admins SET is_super_admin = ?, updated_at = ? WHERE user_id = ?")
                .bind(is_super_admin as i32)
                .bind(now)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a user's admin grant entirely.
    pub async fn delete_by_user_id(&self, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
