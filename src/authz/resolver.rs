//! Admin access resolution.
//!
//! The admins table is the authority on who is an admin. The users table's
//! legacy role column is consulted only when no admin row exists, and can
//! never grant super admin. Results are cached briefly so the gate in front
//! of every admin route does not hammer the database.

use std::time::Duration;

use super::cache::{Cache, TtlCache};
use crate::db::{Database, UserRole};

/// How long a resolved admin status may be served from cache. Revoking an
/// admin can take this long to bite on routes that only check the cache.
pub const ADMIN_CACHE_TTL: Duration = Duration::from_secs(60);

/// Resolved admin standing for one email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAccess {
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl AdminAccess {
    pub const NONE: AdminAccess = AdminAccess {
        is_admin: false,
        is_super_admin: false,
    };
}

/// Resolves an email to its admin standing, with caching.
pub struct AdminAuthorizationResolver<C = TtlCache<String, AdminAccess>> {
    db: Database,
    cache: C,
}

impl AdminAuthorizationResolver {
    pub fn new(db: Database) -> Self {
        Self::with_ttl(db, ADMIN_CACHE_TTL)
    }

    /// Resolver with a custom cache TTL. A zero TTL disables caching.
    pub fn with_ttl(db: Database, ttl: Duration) -> Self {
        Self {
            db,
            cache: TtlCache::new(ttl),
        }
    }
}

impl<C: Cache<String, AdminAccess>> AdminAuthorizationResolver<C> {
    pub fn with_cache(db: Database, cache: C) -> Self {
        Self { db, cache }
    }

    /// Resolve an email's admin standing.
    ///
    /// Negative results are cached like positive ones, so probing unknown
    /// emails does not bypass the cache.
    pub async fn resolve(&self, email: &str) -> Result<AdminAccess, sqlx::Error> {
        // Email lookups are case-insensitive; the cache key must be too.
        let key = email.to_ascii_lowercase();

        if let Some(access) = self.cache.get(&key) {
            return Ok(access);
        }

        let access = self.lookup(email).await?;
        self.cache.put(key, access);
        Ok(access)
    }

    async fn lookup(&self, email: &str) -> Result<AdminAccess, sqlx::Error> {
        let Some(user) = self.db.users().get_by_email(email).await? else {
            return Ok(AdminAccess::NONE);
        };

        if let Some(record) = self.db.admins().get_by_user_id(&user.id).await? {
            return Ok(AdminAccess {
                is_admin: true,
                is_super_admin: record.is_super_admin,
            });
        }

        // Legacy fallback for accounts predating the admins table.
        Ok(match user.role {
            UserRole::User => AdminAccess::NONE,
            UserRole::Admin => AdminAccess {
                is_admin: true,
                is_super_admin: false,
            },
            UserRole::SuperAdmin => AdminAccess {
                is_admin: true,
                is_super_admin: true,
            },
        })
    }

    /// Drop one email from the cache.
    pub fn invalidate(&self, email: &str) {
        self.cache.invalidate(&email.to_ascii_lowercase());
    }

    /// Drop everything from the cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
