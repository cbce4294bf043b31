//! Cookie parsing for the authentication gate.

use axum::http::{HeaderMap, header};

/// Cookie carrying the access token for page navigation. API clients send
/// the token in the `Authorization` header instead.
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim() == name {
            Some(value.trim())
        } else {
            None
        }
    })
}
