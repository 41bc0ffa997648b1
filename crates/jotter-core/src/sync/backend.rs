//! Server operations the sync engine depends on

use std::future::Future;

use crate::client::{ClientResult, NotesApiClient};
use crate::models::{Note, NoteDraft, NoteId};

/// Remote note store used by [`super::SyncEngine`].
///
/// Implemented by [`NotesApiClient`]; tests substitute an in-memory fake.
pub trait NotesBackend: Clone + Send + Sync + 'static {
    fn create_note(&self, draft: NoteDraft) -> impl Future<Output = ClientResult<Note>> + Send;

    fn update_note(
        &self,
        id: NoteId,
        draft: NoteDraft,
    ) -> impl Future<Output = ClientResult<Note>> + Send;

    fn fetch_note(&self, id: NoteId) -> impl Future<Output = ClientResult<Note>> + Send;
}

impl NotesBackend for NotesApiClient {
    fn create_note(&self, draft: NoteDraft) -> impl Future<Output = ClientResult<Note>> + Send {
        let client = self.clone();
        async move { Self::create_note(&client, &draft).await }
    }

    fn update_note(
        &self,
        id: NoteId,
        draft: NoteDraft,
    ) -> impl Future<Output = ClientResult<Note>> + Send {
        let client = self.clone();
        async move { Self::update_note(&client, id, &draft).await }
    }

    fn fetch_note(&self, id: NoteId) -> impl Future<Output = ClientResult<Note>> + Send {
        let client = self.clone();
        async move { client.get_note(id).await }
    }
}
