//! Note model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::UserId;
use crate::error::{Error, Result};

/// Maximum title length, counted in UTF-16 code units like the web clients do.
pub const MAX_TITLE_LEN: usize = 255;

/// Server-assigned note identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A note owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Owner; never changes after creation
    pub user_id: UserId,
    /// Short title, at most [`MAX_TITLE_LEN`] code units
    pub title: String,
    /// Rich-text HTML fragment
    pub content: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Plain-text rendering of the content, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        let text = html_to_plain_text(&self.content);
        if text.chars().count() <= max_len {
            return text;
        }
        let mut truncated = text
            .chars()
            .take(max_len.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Title and content as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Reject empty fields and over-long titles.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Title and content are required".to_string(),
            ));
        }
        if self.title.encode_utf16().count() > MAX_TITLE_LEN {
            return Err(Error::InvalidInput(format!(
                "Title too long (max {MAX_TITLE_LEN} characters)"
            )));
        }
        Ok(())
    }
}

/// Strip markup from a rich-text fragment and collapse whitespace.
///
/// ```
/// use jotter_core::models::html_to_plain_text;
///
/// assert_eq!(html_to_plain_text("<p>Hello <b>world</b></p><p>again</p>"), "Hello world again");
/// ```
#[must_use]
pub fn html_to_plain_text(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

    let stripped = tag.replace_all(html, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(content: &str) -> Note {
        Note {
            id: NoteId::new(1),
            user_id: UserId::new(7),
            title: "T".to_string(),
            content: content.to_string(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn test_note_id_parse() {
        let parsed: NoteId = " 42 ".parse().unwrap();
        assert_eq!(parsed, NoteId::new(42));
        assert!("abc".parse::<NoteId>().is_err());
    }

    #[test]
    fn test_note_id_serializes_as_number() {
        let json = serde_json::to_string(&NoteId::new(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn test_draft_requires_title_and_content() {
        assert!(NoteDraft::new("", "<p>x</p>").validate().is_err());
        assert!(NoteDraft::new("T", "").validate().is_err());
        assert!(NoteDraft::new("   ", "<p>x</p>").validate().is_err());
        assert!(NoteDraft::new("T", "<p>x</p>").validate().is_ok());
    }

    #[test]
    fn test_draft_title_length_limit() {
        let at_limit = "a".repeat(MAX_TITLE_LEN);
        assert!(NoteDraft::new(at_limit, "c").validate().is_ok());

        let over = "a".repeat(MAX_TITLE_LEN + 1);
        let err = NoteDraft::new(over, "c").validate().unwrap_err();
        assert!(err.to_string().contains("Title too long"));
    }

    #[test]
    fn test_draft_title_counts_utf16_units() {
        // Each emoji is two UTF-16 code units.
        let title = "\u{1F600}".repeat(128);
        assert!(NoteDraft::new(title, "c").validate().is_err());
    }

    #[test]
    fn test_html_to_plain_text() {
        assert_eq!(html_to_plain_text("<p><br></p>"), "");
        assert_eq!(
            html_to_plain_text("<h1>Title</h1><p>a &amp; b&nbsp;c</p>"),
            "Title a & b c"
        );
    }

    #[test]
    fn test_preview_truncates() {
        let note = note("<p>Hello wonderful world</p>");
        assert_eq!(note.preview(50), "Hello wonderful world");
        assert_eq!(note.preview(8), "Hello...");
    }
}
