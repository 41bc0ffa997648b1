//! Note CRUD scoped to the authenticated owner.

use std::sync::Arc;

use jotter_core::db::{Database, LibSqlNoteRepository};
use jotter_core::models::NoteDraft;
use jotter_core::{Note, NoteId, UserId};

use crate::error::AppError;

const NOT_FOUND: &str = "Note not found";
const FORBIDDEN: &str = "Not authorized to modify this note";

#[derive(Clone)]
pub struct NotesService {
    db: Arc<Database>,
}

impl NotesService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn repo(&self) -> LibSqlNoteRepository<'_> {
        LibSqlNoteRepository::new(self.db.connection())
    }

    /// Caller's notes, most recently updated first
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Note>, AppError> {
        Ok(self.repo().list_for_user(user_id).await?)
    }

    /// Another user's note is reported as missing.
    pub async fn get(&self, user_id: UserId, id: NoteId) -> Result<Note, AppError> {
        self.repo()
            .get_for_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn create(&self, user_id: UserId, draft: &NoteDraft) -> Result<Note, AppError> {
        draft.validate()?;
        let note = self.repo().create(user_id, draft).await?;
        tracing::debug!(note_id = %note.id, "Created note");
        Ok(note)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<Note, AppError> {
        draft.validate()?;
        self.check_owner(user_id, id).await?;
        self.repo()
            .update(id, user_id, draft)
            .await?
            // Deleted between the ownership check and the write
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn delete(&self, user_id: UserId, id: NoteId) -> Result<(), AppError> {
        self.check_owner(user_id, id).await?;
        if self.repo().delete(id, user_id).await? {
            tracing::debug!(note_id = %id, "Deleted note");
            Ok(())
        } else {
            Err(AppError::not_found(NOT_FOUND))
        }
    }

    /// 404 when the note is absent, 403 when someone else owns it
    async fn check_owner(&self, user_id: UserId, id: NoteId) -> Result<(), AppError> {
        match self.repo().owner_of(id).await? {
            None => Err(AppError::not_found(NOT_FOUND)),
            Some(owner) if owner != user_id => Err(AppError::forbidden(FORBIDDEN)),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use jotter_core::db::LibSqlUserRepository;

    use super::*;

    async fn setup() -> (NotesService, UserId, UserId) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let users = LibSqlUserRepository::new(db.connection());
        let alice = users.create("a@x.com", "hash").await.unwrap().id;
        let bob = users.create("b@x.com", "hash").await.unwrap().id;
        (NotesService::new(db), alice, bob)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_get_update_round_trip() {
        let (notes, alice, _) = setup().await;
        let created = notes
            .create(alice, &NoteDraft::new("T", "<p>hi</p>"))
            .await
            .unwrap();
        assert_eq!(notes.get(alice, created.id).await.unwrap(), created);

        let updated = notes
            .update(alice, created.id, &NoteDraft::new("T2", "<p>bye</p>"))
            .await
            .unwrap();
        assert_eq!(updated.title, "T2");
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn foreign_notes_are_hidden_or_forbidden() {
        let (notes, alice, bob) = setup().await;
        let note = notes
            .create(alice, &NoteDraft::new("T", "<p>hi</p>"))
            .await
            .unwrap();

        assert!(notes.list(bob).await.unwrap().is_empty());
        assert!(matches!(
            notes.get(bob, note.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            notes
                .update(bob, note.id, &NoteDraft::new("X", "<p>x</p>"))
                .await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            notes.delete(bob, note.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(notes.get(alice, note.id).await.unwrap().title, "T");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_drafts_rejected() {
        let (notes, alice, _) = setup().await;
        let err = notes
            .create(alice, &NoteDraft::new("", "<p>hi</p>"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let long_title = "x".repeat(256);
        let err = notes
            .create(alice, &NoteDraft::new(long_title, "<p>hi</p>"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deleting_twice_is_not_found() {
        let (notes, alice, _) = setup().await;
        let note = notes
            .create(alice, &NoteDraft::new("T", "<p>hi</p>"))
            .await
            .unwrap();

        notes.delete(alice, note.id).await.unwrap();
        assert!(matches!(
            notes.delete(alice, note.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            notes.delete(alice, NoteId::new(999)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
