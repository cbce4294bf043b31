//! Request authentication and path-based access control.
//!
//! A single gate in front of the router classifies every path (public,
//! user, admin, super-admin), verifies the access token where required,
//! resolves admin status for admin paths, and forwards accepted requests
//! annotated with identity headers. The `/auth/*` endpoints themselves are
//! excluded from the gate and authenticate via the `ApiAuth` extractor.

mod cookie;
mod errors;
mod extractors;
mod middleware;
mod paths;

pub use cookie::{ACCESS_COOKIE_NAME, get_cookie};
pub use errors::AuthDenial;
pub use extractors::{ApiAuth, bearer_or_cookie};
pub use middleware::{
    IS_ADMIN_HEADER, IS_SUPERADMIN_HEADER, USER_EMAIL_HEADER, USER_ID_HEADER, USER_PHONE_HEADER,
    auth_gate,
};
pub use paths::{RouteClass, classify, is_api};
