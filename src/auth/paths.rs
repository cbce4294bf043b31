//! Request path classification for the authentication gate.
//!
//! Every incoming path falls into exactly one protection class. The excluded
//! list is checked before the protected prefixes, so a path that matches both
//! (e.g. the monitoring probe under `/api/admin/health`) stays public.

/// Protection class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// No authentication required.
    Public,
    /// Any authenticated user.
    User,
    /// Admin rights required.
    Admin,
    /// Super-admin rights required (implies the admin check).
    SuperAdmin,
}

/// Paths that are always public, matched exactly.
const EXCLUDED_EXACT: &[&str] = &["/", "/login", "/favicon.ico", "/robots.txt"];

/// Path prefixes that are always public. `/api/admin/health` sits under the
/// admin tree but must stay reachable for monitoring.
const EXCLUDED_PREFIXES: &[&str] = &[
    "/auth",
    "/api/auth",
    "/api/health",
    "/api/public",
    "/api/admin/health",
];

/// Super-admin-only prefixes. Narrower than the admin prefixes and checked
/// before them.
const SUPER_ADMIN_PREFIXES: &[&str] = &["/admin/admins", "/api/admin/admins"];

/// Admin-only prefixes.
const ADMIN_PREFIXES: &[&str] = &["/admin", "/api/admin"];

/// Prefixes that require any authenticated user.
const USER_PREFIXES: &[&str] = &["/mypage", "/reservations", "/api/user"];

/// Classify a request path into its protection class.
pub fn classify(path: &str) -> RouteClass {
    if EXCLUDED_EXACT.contains(&path) || matches_prefix(path, EXCLUDED_PREFIXES) {
        return RouteClass::Public;
    }
    if matches_prefix(path, SUPER_ADMIN_PREFIXES) {
        return RouteClass::SuperAdmin;
    }
    if matches_prefix(path, ADMIN_PREFIXES) {
        return RouteClass::Admin;
    }
    if matches_prefix(path, USER_PREFIXES) {
        return RouteClass::User;
    }
    RouteClass::Public
}

/// API paths get JSON error responses; everything else is a page and gets
/// redirects.
pub fn is_api(path: &str) -> bool {
    path.starts_with("/api/")
}

fn matches_prefix(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}
