//! Registration and credential checks.

use std::sync::Arc;

use jotter_core::db::{Database, LibSqlUserRepository};
use jotter_core::models::validate_registration;
use jotter_core::util::fingerprint;
use jotter_core::UserId;

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::error::AppError;

#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(db: Arc<Database>, tokens: Arc<TokenIssuer>) -> Self {
        Self { db, tokens }
    }

    /// Create an account and return its id.
    ///
    /// The email is stored trimmed but otherwise as given.
    pub async fn register(&self, email: &str, password: &str) -> Result<UserId, AppError> {
        validate_registration(email, password)?;
        let email = email.trim();

        let users = LibSqlUserRepository::new(self.db.connection());
        if users.find_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password.to_string()).await?;
        // A concurrent registration can still win the race; the UNIQUE
        // constraint reports it as a conflict.
        let user = users.create(email, &password_hash).await?;
        tracing::info!(user = fingerprint(&user.id.to_string()), "Registered user");
        Ok(user.id)
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// Empty fields are not special: an empty email matches no user and an
    /// empty password fails verification.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = email.trim();
        let users = LibSqlUserRepository::new(self.db.connection());
        let user = users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let valid = verify_password(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            tracing::info!(user = fingerprint(&user.id.to_string()), "Rejected login");
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let token = self.tokens.issue(user.id, &user.email)?;
        tracing::info!(user = fingerprint(&user.id.to_string()), "Issued session token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn service() -> (AuthService, Arc<TokenIssuer>) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let tokens = Arc::new(TokenIssuer::new(
            "test-secret-0123456789",
            Duration::from_secs(60),
        ));
        (AuthService::new(db, tokens.clone()), tokens)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn register_then_login_issues_token_for_user() {
        let (auth, tokens) = service().await;
        let user_id = auth.register("a@x.com", "secret1").await.unwrap();

        let token = auth.login("a@x.com", "secret1").await.unwrap();
        assert_eq!(tokens.verify(&token).unwrap().user_id, user_id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_registration_conflicts() {
        let (auth, _) = service().await;
        auth.register("a@x.com", "secret1").await.unwrap();

        let err = auth.register("a@x.com", "secret2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn short_password_rejected() {
        let (auth, _) = service().await;
        let err = auth.register("a@x.com", "12345").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn login_distinguishes_unknown_email_and_bad_password() {
        let (auth, _) = service().await;
        auth.register("a@x.com", "secret1").await.unwrap();

        let err = auth.login("b@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = auth.login("a@x.com", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn login_with_empty_fields_reports_credential_errors() {
        let (auth, _) = service().await;
        auth.register("a@x.com", "secret1").await.unwrap();

        let err = auth.login("", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = auth.login("a@x.com", "").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
