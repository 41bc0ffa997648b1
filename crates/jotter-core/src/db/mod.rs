//! Database layer for Jotter

mod connection;
mod migrations;
mod repository;
mod user_repository;

pub use connection::{Database, IN_MEMORY_PATH};
pub use repository::LibSqlNoteRepository;
pub use user_repository::LibSqlUserRepository;
