//! Data models for Jotter

mod note;
mod user;

pub use note::{html_to_plain_text, Note, NoteDraft, NoteId, MAX_TITLE_LEN};
pub use user::{validate_registration, User, UserId, MIN_PASSWORD_LEN};
