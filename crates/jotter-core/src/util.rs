//! Small helpers shared by the server and clients.

use std::hash::{Hash, Hasher};

/// Trim optional text and drop it when nothing is left.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Validate an API base URL and strip trailing slashes.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.trim_end_matches('/').to_string())
    } else {
        None
    }
}

/// Stable, non-reversible tag for log lines that must not carry identities.
pub fn fingerprint(value: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" a@x.com ".to_string())),
            Some("a@x.com".to_string())
        );
    }

    #[test]
    fn normalize_base_url_requires_scheme() {
        assert_eq!(
            normalize_base_url(" http://localhost:3000/ "),
            Some("http://localhost:3000".to_string())
        );
        assert_eq!(normalize_base_url("localhost:3000"), None);
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint("user-1"), fingerprint("user-1"));
        assert_ne!(fingerprint("user-1"), fingerprint("user-2"));
    }
}
