//! CLI session persistence.
//!
//! The bearer token from `jotter login` is kept in a JSON file under the
//! user config directory. Sessions are treated as expired 30 days after
//! login, matching the server's token lifetime.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use jotter_core::util::unix_millis_now;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const SESSION_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub email: String,
    /// Unix ms
    pub logged_in_at: i64,
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StoredSession")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .field("logged_in_at", &self.logged_in_at)
            .finish()
    }
}

impl StoredSession {
    pub fn new(token: String, email: String) -> Self {
        Self {
            token,
            email,
            logged_in_at: unix_millis_now(),
        }
    }

    pub const fn expires_at(&self) -> i64 {
        self.logged_in_at.saturating_add(SESSION_TTL_MS)
    }

    pub const fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_millis_now())
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/jotter/session.json`
    pub fn default_location() -> Result<Self, CliError> {
        let dir = dirs::config_dir().ok_or_else(|| {
            CliError::Config("Failed to resolve the user config directory".to_string())
        })?;
        Ok(Self::new(dir.join("jotter").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StoredSession>, CliError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Load the session, clearing it when it has expired.
    pub fn load_active(&self) -> Result<StoredSession, CliError> {
        let session = self.load()?.ok_or(CliError::NotSignedIn)?;
        if session.is_expired() {
            self.clear()?;
            return Err(CliError::SessionExpired);
        }
        Ok(session)
    }

    pub fn save(&self, session: &StoredSession) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        let mut file = open_private(&self.path)?;
        file.write_all(raw.as_bytes())?;
        Ok(())
    }

    /// Returns whether a session file was removed.
    pub fn clear(&self) -> Result<bool, CliError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        (dir, store)
    }

    #[test]
    fn save_load_clear_round_trip() {
        let (_dir, store) = store();
        assert_eq!(store.load().unwrap(), None);

        let session = StoredSession::new("token-value".to_string(), "a@x.com".to_string());
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session.clone()));
        assert_eq!(store.load_active().unwrap(), session);

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert!(matches!(store.load_active(), Err(CliError::NotSignedIn)));
    }

    #[test]
    fn expired_session_is_cleared() {
        let (_dir, store) = store();
        let mut session = StoredSession::new("t".to_string(), "a@x.com".to_string());
        session.logged_in_at -= SESSION_TTL_MS + 1;
        store.save(&session).unwrap();

        assert!(matches!(store.load_active(), Err(CliError::SessionExpired)));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn expiry_is_thirty_days_after_login() {
        let session = StoredSession {
            token: "t".to_string(),
            email: "a@x.com".to_string(),
            logged_in_at: 0,
        };
        assert!(!session.is_expired_at(SESSION_TTL_MS - 1));
        assert!(session.is_expired_at(SESSION_TTL_MS));
    }

    #[test]
    fn debug_redacts_token() {
        let session = StoredSession::new("secret-token".to_string(), "a@x.com".to_string());
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
