//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed with the configured secret. The login handler
//! issues them for the configured admin account, whose password is kept as an
//! Argon2id PHC hash; [`require_bearer`] guards every other `/api/v1` route.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AuthConfig;
use crate::error::{EngineError, EngineResult};

use super::response::ApiErrorResponse;
use super::state::AppState;

/// Role carried by admin tokens.
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims carried by API tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated subject (admin email).
    pub sub: String,
    /// Role name.
    pub role: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Signs a token for `subject` valid for the configured lifetime.
///
/// Returns the token and its lifetime in seconds.
pub fn issue_token(auth: &AuthConfig, subject: &str) -> EngineResult<(String, i64)> {
    let issued_at = Utc::now();
    let ttl = Duration::try_hours(auth.token_ttl_hours)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| EngineError::auth("failed to sign token", "token lifetime out of range"))?;
    let claims = Claims {
        sub: subject.to_string(),
        role: ADMIN_ROLE.to_string(),
        iat: issued_at.timestamp(),
        exp: issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| EngineError::auth("failed to sign token", "token expiry out of range"))?
            .timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|error| EngineError::auth("failed to sign token", error))?;

    Ok((token, ttl.num_seconds()))
}

/// Verifies signature and expiry, returning the claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

fn hasher() -> Argon2<'static> {
    let params = Params::new(19_456, 2, 1, None).unwrap_or_else(|_| Params::default());
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hashes `password` into a PHC string suitable for `auth.admin_password_hash`.
pub fn hash_password(password: &str) -> EngineResult<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| EngineError::auth("failed to hash password", error))
}

/// Checks `password` against a PHC hash.
///
/// A mismatch is `Ok(false)`; a malformed hash is an error.
pub fn verify_password(password: &str, password_hash: &str) -> EngineResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|error| EngineError::auth("invalid password hash", error))?;

    match hasher().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(error) => Err(EngineError::auth("failed to verify password", error)),
    }
}

/// Returns true when the credentials match the configured admin account.
pub fn check_credentials(auth: &AuthConfig, email: &str, password: &str) -> EngineResult<bool> {
    if !email.trim().eq_ignore_ascii_case(&auth.admin_email) {
        return Ok(false);
    }
    verify_password(password, &auth.admin_password_hash)
}

/// Middleware rejecting requests without a valid bearer token.
///
/// On success the decoded [`Claims`] are stored in the request extensions.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiErrorResponse> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiErrorResponse::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiErrorResponse::unauthorized("Invalid Authorization header encoding"))?;

    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiErrorResponse::unauthorized("Authorization header must start with Bearer")
    })?;

    let claims = verify_token(token.trim(), &state.auth().jwt_secret).map_err(|error| {
        warn!(error = %error, path = %request.uri().path(), "Rejected bearer token");
        ApiErrorResponse::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let auth = AuthConfig::default();
        let (token, expires_in) = issue_token(&auth, "admin@example.com").unwrap();

        let claims = verify_token(&token, &auth.jwt_secret).unwrap();
        assert_eq!(claims.sub, "admin@example.com");
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(expires_in, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let auth = AuthConfig::default();
        let (token, _) = issue_token(&auth, "admin@example.com").unwrap();
        assert!(verify_token(&token, "another-secret").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = AuthConfig::default();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: "admin@example.com".to_string(),
            role: ADMIN_ROLE.to_string(),
            iat: (past - Duration::hours(1)).timestamp(),
            exp: past.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&token, &auth.jwt_secret).is_err());
    }

    #[test]
    fn test_unsignable_lifetime_is_an_auth_error() {
        for hours in [i64::MAX, 24 * 365 * 1_000_000, 0] {
            let auth = AuthConfig {
                token_ttl_hours: hours,
                ..AuthConfig::default()
            };
            match issue_token(&auth, "admin@example.com") {
                Err(EngineError::Auth { message }) => {
                    assert!(message.starts_with("failed to sign token"));
                }
                other => panic!("Expected Auth error for {hours}h, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_check_credentials() {
        let auth = AuthConfig::default();
        assert!(check_credentials(&auth, " Admin@Example.com ", "Admin@123").unwrap());
        assert!(!check_credentials(&auth, "admin@example.com", "wrong").unwrap());
        assert!(!check_credentials(&auth, "someone@example.com", "Admin@123").unwrap());
    }

    #[test]
    fn test_hash_password_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("s3cret-pass"));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("other", &hash).unwrap());
    }

    #[test]
    fn test_plaintext_stored_password_is_an_auth_error() {
        let auth = AuthConfig {
            admin_password_hash: "Admin@123".to_string(),
            ..AuthConfig::default()
        };
        match check_credentials(&auth, "admin@example.com", "Admin@123") {
            Err(EngineError::Auth { message }) => {
                assert!(message.starts_with("invalid password hash"));
            }
            other => panic!("Expected Auth error, got {:?}", other),
        }
    }
}
