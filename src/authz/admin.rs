//! Admin entity and the rules between admins.
//!
//! A super admin holds every permission and manages other admins. A regular
//! admin holds only its granted flags and manages no one. All transforms are
//! copy-on-write; no-op transforms hand back the value unchanged.

use super::permissions::{AdminPermissions, PermissionKey};
use crate::db::AdminRecord;

#[derive(Debug, Clone)]
pub struct Admin {
    pub id: String,
    pub user_id: String,
    permissions: AdminPermissions,
    pub is_super_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Admin {
    /// Create a regular admin with the given flags.
    pub fn regular(
        id: impl Into<String>,
        user_id: impl Into<String>,
        permissions: AdminPermissions,
        now: i64,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            permissions,
            is_super_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a super admin. The stored flags are the full set.
    pub fn super_admin(id: impl Into<String>, user_id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            permissions: AdminPermissions::full_access(),
            is_super_admin: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The effective permission set. Super admins get everything, whatever
    /// their stored flags say.
    pub fn permissions(&self) -> AdminPermissions {
        if self.is_super_admin {
            AdminPermissions::full_access()
        } else {
            self.permissions
        }
    }

    pub fn can_manage(&self, key: PermissionKey) -> bool {
        self.permissions().has(key)
    }

    /// Only super admins manage other admins.
    pub fn can_manage_admins(&self) -> bool {
        self.is_super_admin
    }

    /// Replace the permission flags. Super admin permissions are fixed, so
    /// this hands a super admin back unchanged.
    pub fn update_permissions(self, permissions: AdminPermissions, now: i64) -> Self {
        if self.is_super_admin {
            return self;
        }
        Self {
            permissions,
            updated_at: now,
            ..self
        }
    }

    pub fn grant_permission(self, key: PermissionKey, now: i64) -> Self {
        if self.is_super_admin {
            return self;
        }
        let granted = self.permissions.grant(key);
        self.update_permissions(granted, now)
    }

    pub fn revoke_permission(self, key: PermissionKey, now: i64) -> Self {
        if self.is_super_admin {
            return self;
        }
        let revoked = self.permissions.revoke(key);
        self.update_permissions(revoked, now)
    }

    /// Promote to super admin. Already-super admins come back unchanged.
    pub fn promote_to_super_admin(self, now: i64) -> Self {
        if self.is_super_admin {
            return self;
        }
        Self {
            permissions: AdminPermissions::full_access(),
            is_super_admin: true,
            updated_at: now,
            ..self
        }
    }

    /// Demote to a regular admin with the default flags. Regular admins come
    /// back unchanged.
    pub fn demote_from_super_admin(self, now: i64) -> Self {
        if !self.is_super_admin {
            return self;
        }
        Self {
            permissions: AdminPermissions::default(),
            is_super_admin: false,
            updated_at: now,
            ..self
        }
    }

    /// Super admins may modify any admin, themselves included. Regular
    /// admins modify no one.
    pub fn can_modify(&self, _other: &Admin) -> bool {
        self.is_super_admin
    }

    /// Super admins may delete regular admins only: never themselves and
    /// never another super admin.
    pub fn can_delete(&self, other: &Admin) -> bool {
        self.is_super_admin && !other.is_super_admin && self.id != other.id
    }
}

impl From<AdminRecord> for Admin {
    fn from(record: AdminRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            permissions: record.permissions,
            is_super_admin: record.is_super_admin,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
