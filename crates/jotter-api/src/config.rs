use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub auth_rate_limit_window: Duration,
    pub auth_rate_limit_per_window: u32,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("auth_rate_limit_window", &self.auth_rate_limit_window)
            .field(
                "auth_rate_limit_per_window",
                &self.auth_rate_limit_per_window,
            )
            .finish()
    }
}

impl AppConfig {
    /// Tokens are valid for 30 days.
    pub const TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind_addr = optional_trimmed(&lookup, "JOTTER_API_BIND_ADDR").unwrap_or_else(|| {
            optional_trimmed(&lookup, "PORT")
                .map_or_else(|| "127.0.0.1:3000".to_string(), |port| format!("0.0.0.0:{port}"))
        });

        let database_path = value_or_default(&lookup, "JOTTER_DATABASE_PATH", "jotter.db");

        let jwt_secret = required_trimmed(&lookup, "JWT_SECRET")?;
        if jwt_secret.chars().count() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters"
            )));
        }

        let window_secs = value_or_default(&lookup, "AUTH_RATE_LIMIT_WINDOW_SECS", "60")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "AUTH_RATE_LIMIT_WINDOW_SECS must be an integer in [10, 3600]".to_string(),
                )
            })?;
        if !(10..=3_600).contains(&window_secs) {
            return Err(ConfigError::Invalid(
                "AUTH_RATE_LIMIT_WINDOW_SECS must be in [10, 3600]".to_string(),
            ));
        }

        let auth_rate_limit_per_window =
            value_or_default(&lookup, "AUTH_RATE_LIMIT_PER_WINDOW", "20")
                .parse::<u32>()
                .map_err(|_| {
                    ConfigError::Invalid(
                        "AUTH_RATE_LIMIT_PER_WINDOW must be an integer in [1, 1000]".to_string(),
                    )
                })?;
        if !(1..=1_000).contains(&auth_rate_limit_per_window) {
            return Err(ConfigError::Invalid(
                "AUTH_RATE_LIMIT_PER_WINDOW must be in [1, 1000]".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            database_path,
            jwt_secret,
            token_ttl: Self::TOKEN_TTL,
            auth_rate_limit_window: Duration::from_secs(window_secs),
            auth_rate_limit_per_window,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    jotter_core::util::normalize_text_option(lookup(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&'static str, &'static str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_requires_jwt_secret() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn config_rejects_short_secret() {
        let err = config_from(&[("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 16"));
    }

    #[test]
    fn config_defaults() {
        let config = config_from(&[("JWT_SECRET", "0123456789abcdef")]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.database_path, "jotter.db");
        assert_eq!(config.token_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.auth_rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.auth_rate_limit_per_window, 20);
    }

    #[test]
    fn config_honours_port_when_bind_addr_unset() {
        let config = config_from(&[("JWT_SECRET", "0123456789abcdef"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        let config = config_from(&[
            ("JWT_SECRET", "0123456789abcdef"),
            ("PORT", "8080"),
            ("JOTTER_API_BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn config_validates_rate_limit_ranges() {
        let err = config_from(&[
            ("JWT_SECRET", "0123456789abcdef"),
            ("AUTH_RATE_LIMIT_WINDOW_SECS", "5"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("AUTH_RATE_LIMIT_WINDOW_SECS"));

        let err = config_from(&[
            ("JWT_SECRET", "0123456789abcdef"),
            ("AUTH_RATE_LIMIT_PER_WINDOW", "zero"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("AUTH_RATE_LIMIT_PER_WINDOW"));
    }

    #[test]
    fn config_redacts_jwt_secret() {
        let config = config_from(&[("JWT_SECRET", "sensitive-signing-secret")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-signing-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
