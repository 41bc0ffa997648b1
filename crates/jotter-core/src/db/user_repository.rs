//! Credential store

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{User, UserId};

/// libSQL-backed user store
pub struct LibSqlUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlUserRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_user(row: &Row) -> Result<User> {
        Ok(User {
            id: UserId::new(row.get::<i64>(0)?),
            email: row.get::<String>(1)?,
            password_hash: row.get::<String>(2)?,
            created_at: row.get::<i64>(3)?,
        })
    }

    /// Insert a user. Duplicate emails surface as [`Error::Conflict`].
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let now = chrono::Utc::now().timestamp_millis();
        let result = self
            .conn
            .query(
                "INSERT INTO users (email, password_hash, created_at)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, email, password_hash, created_at",
                params![email, password_hash, now],
            )
            .await;

        let mut rows = match result {
            Ok(rows) => rows,
            Err(error) => return Err(map_unique_violation(error.into())),
        };
        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Err(Error::Database("INSERT returned no row".to_string())),
            Err(error) => return Err(map_unique_violation(error.into())),
        };
        Self::parse_user(&row)
    }

    /// Exact (case-sensitive) email lookup
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?1",
                params![email],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_user(&row)?)),
            None => Ok(None),
        }
    }
}

fn map_unique_violation(error: Error) -> Error {
    if error.is_unique_violation() {
        Error::Conflict("Email already registered".to_string())
    } else {
        error
    }
}
