//! jotter-core - Core library for Jotter
//!
//! This crate contains the shared models, database layer, HTTP API client and
//! the note sync engine used by the Jotter server and clients.

pub mod client;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Note, NoteId, User, UserId};
