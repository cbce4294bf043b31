//! Rejection responses produced by the authentication gate.

use axum::response::{IntoResponse, Redirect, Response};

use super::paths::is_api;
use crate::api::error::ApiError;

/// Why the gate refused to forward a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDenial {
    /// No identity, or the presented access token failed verification.
    Unauthenticated,
    /// Authenticated, but not an admin.
    NotAdmin,
    /// A legitimate admin, but not a super-admin.
    NotSuperAdmin,
}

impl AuthDenial {
    /// Render the denial for the path that triggered it. API paths get the
    /// uniform JSON error body; page paths get a redirect.
    pub fn into_response_for(self, path: &str) -> Response {
        if is_api(path) {
            return match self {
                AuthDenial::Unauthenticated => ApiError::unauthorized("Authentication required"),
                AuthDenial::NotAdmin => ApiError::forbidden("Admin access required"),
                AuthDenial::NotSuperAdmin => {
                    ApiError::forbidden_super_admin("Super admin access required")
                }
            }
            .into_response();
        }
        match self {
            AuthDenial::Unauthenticated => {
                Redirect::temporary(&login_redirect(path)).into_response()
            }
            AuthDenial::NotAdmin => Redirect::temporary("/").into_response(),
            // A real admin without super rights still belongs in the admin area.
            AuthDenial::NotSuperAdmin => Redirect::temporary("/admin").into_response(),
        }
    }
}

/// Build the login redirect target with the original path in the `from`
/// query parameter so the client can come back after authenticating.
fn login_redirect(path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("from", path)
        .finish();
    format!("/login?{}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn test_login_redirect_encodes_path() {
        assert_eq!(login_redirect("/mypage"), "/login?from=%2Fmypage");
        assert_eq!(
            login_redirect("/reservations/new"),
            "/login?from=%2Freservations%2Fnew"
        );
    }

    #[test]
    fn test_api_denials_are_json_statuses() {
        let resp = AuthDenial::Unauthenticated.into_response_for("/api/user/me");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = AuthDenial::NotAdmin.into_response_for("/api/admin/users");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = AuthDenial::NotSuperAdmin.into_response_for("/api/admin/admins");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_page_denials_redirect() {
        let resp = AuthDenial::Unauthenticated.into_response_for("/mypage");
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/login?from=%2Fmypage"
        );

        let resp = AuthDenial::NotAdmin.into_response_for("/admin/users");
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

        let resp = AuthDenial::NotSuperAdmin.into_response_for("/admin/admins");
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/admin");
    }
}
