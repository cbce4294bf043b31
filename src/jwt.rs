//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token (15 minutes) - proves identity per request
    Access,
    /// Long-lived refresh token (7 days) - only mints new access tokens
    Refresh,
}

/// JWT claims carried by both token types.
/// The session id binds the token to a revocable server-side session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// User email
    pub email: String,
    /// Session id the token is bound to
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Token type
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;

/// Refresh token duration: 7 days (matches the session lifetime)
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Signed token plus issuance metadata.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Token service holding both signing keys.
///
/// Access and refresh tokens are signed with independent secrets so that a
/// leaked access secret cannot be used to mint refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenService {
    /// Create a new token service from the two secrets.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Issue an access token bound to the given session.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        email: &str,
        session_id: &str,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(
            user_id,
            email,
            session_id,
            TokenType::Access,
            ACCESS_TOKEN_DURATION_SECS,
            &self.access_encoding,
        )
    }

    /// Issue a refresh token bound to the given session.
    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        session_id: &str,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(
            user_id,
            email,
            session_id,
            TokenType::Refresh,
            REFRESH_TOKEN_DURATION_SECS,
            &self.refresh_encoding,
        )
    }

    fn issue(
        &self,
        user_id: &str,
        email: &str,
        session_id: &str,
        token_type: TokenType,
        duration: u64,
        key: &EncodingKey,
    ) -> Result<IssuedToken, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::TimeError)?
            .as_secs();

        let exp = now + duration;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            session_id: session_id.to_string(),
            token_type,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
            duration,
        })
    }

    /// Validate and decode an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(token, TokenType::Access, &self.access_decoding)
    }

    /// Validate and decode a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(token, TokenType::Refresh, &self.refresh_decoding)
    }

    fn verify(
        token: &str,
        expected: TokenType,
        key: &DecodingKey,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        if token_data.claims.token_type != expected {
            return Err(TokenError::WrongType);
        }

        Ok(token_data.claims)
    }
}

/// Errors that can occur during token operations.
#[derive(Debug)]
pub enum TokenError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Signature mismatch, malformed structure, or unparseable claims
    Invalid,
    /// The token's exp has passed
    Expired,
    /// Wrong token type (e.g., a refresh token presented as an access token)
    WrongType,
    /// System time error
    TimeError,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::WrongType => write!(f, "Wrong token type"),
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
