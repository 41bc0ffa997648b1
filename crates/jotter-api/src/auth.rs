use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::HeaderMap;
use jotter_core::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Caller identity attached to requests that passed `require_auth`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
    jti: Option<String>,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user_id: UserId, email: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Some(uuid::Uuid::now_v7().to_string()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|error| AppError::internal(format!("Token signing failed: {error}")))
    }

    /// Verify signature and expiry; any failure is an invalid token.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let decoded = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|error| {
            tracing::debug!("Token validation failed: {}", sanitize(&error));
            AppError::invalid_token("Invalid or expired token")
        })?;

        let user_id = decoded
            .claims
            .sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| AppError::invalid_token("Invalid or expired token"))?;

        Ok(AuthenticatedUser { user_id })
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| AppError::unauthorized("Access token required"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::unauthorized("Authorization header must be `Bearer <token>`"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::unauthorized(
            "Authorization scheme must be `Bearer`",
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::unauthorized("Access token required"));
    }

    Ok(token)
}

/// Argon2id PHC string with a fresh random salt. Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::internal(format!("Failed to hash password: {error}")))
    })
    .await
    .map_err(|error| AppError::internal(format!("Password hashing task failed: {error}")))?
}

/// Check a password against a stored PHC string. Runs on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|error| AppError::internal(format!("Invalid password hash: {error}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|error| AppError::internal(format!("Password verification task failed: {error}")))?
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &str = "test-secret-0123456789";

    #[test]
    fn bearer_token_extractor_accepts_standard_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );

        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn bearer_token_extractor_rejects_missing_or_wrong_scheme() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AppError::Unauthorized(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn issued_token_round_trips_user_id() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        let token = issuer.issue(UserId::new(42), "a@x.com").unwrap();

        let user = issuer.verify(&token).unwrap();
        assert_eq!(user.user_id, UserId::new(42));

        let second = issuer.issue(UserId::new(42), "a@x.com").unwrap();
        assert_ne!(token, second);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        let other = TokenIssuer::new("another-secret-0123456789", Duration::from_secs(60));
        let token = other.issue(UserId::new(1), "a@x.com").unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(AppError::InvalidToken(_))
        ));
        assert!(matches!(
            issuer.verify("not-a-jwt"),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_invalid() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            email: "a@x.com".to_string(),
            iat: now - 120,
            exp: now - 60,
            jti: None,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &issuer.encoding).unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("secret1".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("secret2".to_string(), hash).await.unwrap());
    }
}
