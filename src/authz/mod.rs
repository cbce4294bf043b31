//! Admin authorization: permissions, the admin entity, and cached resolution.

mod admin;
mod cache;
mod permissions;
mod resolver;

pub use admin::Admin;
pub use cache::{Cache, TtlCache};
pub use permissions::{AdminPermissions, PermissionError, PermissionKey};
pub use resolver::{ADMIN_CACHE_TTL, AdminAccess, AdminAuthorizationResolver};
