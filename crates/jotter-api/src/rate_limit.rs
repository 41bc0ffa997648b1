use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jotter_core::util::fingerprint;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::AppError;

/// Fixed-window attempt counter for the credential endpoints, keyed by email.
///
/// Keying by the submitted email (fingerprinted, never stored raw) caps
/// guessing against any one account, which is what these endpoints expose.
/// Spraying many emails from one client is left to the fronting proxy.
#[derive(Clone)]
pub struct AuthRateLimiter {
    state: Arc<Mutex<HashMap<String, RateWindow>>>,
    window: Duration,
    limit: u32,
    metrics: Arc<RateLimitMetrics>,
}

#[derive(Clone, Copy)]
pub enum AuthEndpoint {
    Register,
    Login,
}

#[derive(Default)]
struct RateLimitMetrics {
    register_allowed: AtomicU64,
    register_limited: AtomicU64,
    login_allowed: AtomicU64,
    login_limited: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RateLimitMetricsSnapshot {
    pub register_allowed: u64,
    pub register_limited: u64,
    pub login_allowed: u64,
    pub login_limited: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    started_at: Instant,
    count: u32,
}

impl AuthRateLimiter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.auth_rate_limit_window,
            config.auth_rate_limit_per_window,
        )
    }

    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            window,
            limit,
            metrics: Arc::new(RateLimitMetrics::default()),
        }
    }

    pub async fn check(&self, endpoint: AuthEndpoint, email: &str) -> Result<(), AppError> {
        let key = format!("{}:{:016x}", endpoint.label(), fingerprint(email.trim()));
        let now = Instant::now();
        let mut guard = self.state.lock().await;

        // Drop windows that have fully elapsed so the map stays bounded.
        guard.retain(|_, entry| now.duration_since(entry.started_at) < self.window);

        let entry = guard.entry(key).or_insert(RateWindow {
            started_at: now,
            count: 0,
        });

        if entry.count >= self.limit {
            let retry_after_secs = self
                .window
                .saturating_sub(now.duration_since(entry.started_at))
                .as_secs();
            self.mark_limited(endpoint);
            tracing::warn!(
                endpoint = endpoint.label(),
                account = fingerprint(email.trim()),
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Err(AppError::too_many_requests(
                "Too many attempts, try again later",
                retry_after_secs,
            ));
        }

        entry.count += 1;
        self.mark_allowed(endpoint);
        Ok(())
    }

    pub fn metrics_snapshot(&self) -> RateLimitMetricsSnapshot {
        RateLimitMetricsSnapshot {
            register_allowed: self.metrics.register_allowed.load(Ordering::Relaxed),
            register_limited: self.metrics.register_limited.load(Ordering::Relaxed),
            login_allowed: self.metrics.login_allowed.load(Ordering::Relaxed),
            login_limited: self.metrics.login_limited.load(Ordering::Relaxed),
        }
    }

    fn mark_allowed(&self, endpoint: AuthEndpoint) {
        match endpoint {
            AuthEndpoint::Register => {
                self.metrics.register_allowed.fetch_add(1, Ordering::Relaxed);
            }
            AuthEndpoint::Login => {
                self.metrics.login_allowed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn mark_limited(&self, endpoint: AuthEndpoint) {
        match endpoint {
            AuthEndpoint::Register => {
                self.metrics.register_limited.fetch_add(1, Ordering::Relaxed);
            }
            AuthEndpoint::Login => {
                self.metrics.login_limited.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl AuthEndpoint {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limiter_blocks_after_limit() {
        let limiter = AuthRateLimiter::new(Duration::from_secs(60), 2);

        limiter.check(AuthEndpoint::Login, "a@x.com").await.unwrap();
        limiter.check(AuthEndpoint::Login, "a@x.com").await.unwrap();

        let err = limiter
            .check(AuthEndpoint::Login, "a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TooManyRequests(_, _)));

        let metrics = limiter.metrics_snapshot();
        assert_eq!(metrics.login_allowed, 2);
        assert_eq!(metrics.login_limited, 1);
    }

    #[tokio::test]
    async fn rate_limiter_keys_by_endpoint_and_email() {
        let limiter = AuthRateLimiter::new(Duration::from_secs(60), 1);

        limiter.check(AuthEndpoint::Login, "a@x.com").await.unwrap();
        limiter.check(AuthEndpoint::Login, "b@x.com").await.unwrap();
        limiter
            .check(AuthEndpoint::Register, "a@x.com")
            .await
            .unwrap();
        assert!(limiter.check(AuthEndpoint::Login, "a@x.com").await.is_err());
    }

    #[tokio::test]
    async fn rate_limiter_does_not_keep_raw_emails() {
        let limiter = AuthRateLimiter::new(Duration::from_secs(60), 5);
        limiter.check(AuthEndpoint::Login, " a@x.com ").await.unwrap();
        limiter.check(AuthEndpoint::Login, "a@x.com").await.unwrap();

        let state = limiter.state.lock().await;
        assert_eq!(state.len(), 1);
        assert!(state.keys().all(|key| !key.contains("a@x.com")));
    }
}
