//! Note repository implementation

use libsql::{params, Connection, Row};

use crate::error::Result;
use crate::models::{Note, NoteDraft, NoteId, UserId};

const NOTE_COLUMNS: &str = "id, user_id, title, content, created_at, updated_at";

/// libSQL-backed note store
///
/// Every statement that reads or mutates a single note is scoped by owner
/// except [`LibSqlNoteRepository::owner_of`], which exists so callers can tell
/// "missing" apart from "owned by someone else".
pub struct LibSqlNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from a database row
    fn parse_note(row: &Row) -> Result<Note> {
        Ok(Note {
            id: NoteId::new(row.get::<i64>(0)?),
            user_id: UserId::new(row.get::<i64>(1)?),
            title: row.get::<String>(2)?,
            content: row.get::<String>(3)?,
            created_at: row.get::<i64>(4)?,
            updated_at: row.get::<i64>(5)?,
        })
    }

    /// All notes owned by `user_id`, most recently updated first
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Note>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE user_id = ?1
                     ORDER BY updated_at DESC, id DESC"
                ),
                params![user_id.get()],
            )
            .await?;

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(Self::parse_note(&row)?);
        }
        Ok(notes)
    }

    /// Fetch a note only if it belongs to `user_id`
    pub async fn get_for_user(&self, id: NoteId, user_id: UserId) -> Result<Option<Note>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2"),
                params![id.get(), user_id.get()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_note(&row)?)),
            None => Ok(None),
        }
    }

    /// Owner of a note, or `None` when the note does not exist
    pub async fn owner_of(&self, id: NoteId) -> Result<Option<UserId>> {
        let mut rows = self
            .conn
            .query("SELECT user_id FROM notes WHERE id = ?1", params![id.get()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(UserId::new(row.get::<i64>(0)?))),
            None => Ok(None),
        }
    }

    /// Insert a note; the caller validates the draft first
    pub async fn create(&self, user_id: UserId, draft: &NoteDraft) -> Result<Note> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut rows = self
            .conn
            .query(
                &format!(
                    "INSERT INTO notes (user_id, title, content, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     RETURNING {NOTE_COLUMNS}"
                ),
                params![
                    user_id.get(),
                    draft.title.as_str(),
                    draft.content.as_str(),
                    now
                ],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| crate::Error::Database("INSERT returned no row".to_string()))?;
        Self::parse_note(&row)
    }

    /// Overwrite title and content of an owned note
    ///
    /// `updated_at` always moves forward, even when two writes land in the
    /// same millisecond. Returns `None` when no owned note matched.
    pub async fn update(
        &self,
        id: NoteId,
        user_id: UserId,
        draft: &NoteDraft,
    ) -> Result<Option<Note>> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut rows = self
            .conn
            .query(
                &format!(
                    "UPDATE notes
                     SET title = ?1, content = ?2, updated_at = MAX(?3, updated_at + 1)
                     WHERE id = ?4 AND user_id = ?5
                     RETURNING {NOTE_COLUMNS}"
                ),
                params![
                    draft.title.as_str(),
                    draft.content.as_str(),
                    now,
                    id.get(),
                    user_id.get()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_note(&row)?)),
            None => Ok(None),
        }
    }

    /// Hard delete an owned note. Returns whether a row was removed.
    pub async fn delete(&self, id: NoteId, user_id: UserId) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
                params![id.get(), user_id.get()],
            )
            .await?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, LibSqlUserRepository};
    use pretty_assertions::assert_eq;

    async fn setup() -> (Database, UserId, UserId) {
        let db = Database::open_in_memory().await.unwrap();
        let users = LibSqlUserRepository::new(db.connection());
        let alice = users.create("alice@x.com", "hash").await.unwrap().id;
        let bob = users.create("bob@x.com", "hash").await.unwrap().id;
        (db, alice, bob)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_get() {
        let (db, alice, _) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = repo
            .create(alice, &NoteDraft::new("T", "<p>hi</p>"))
            .await
            .unwrap();
        assert_eq!(note.title, "T");
        assert_eq!(note.created_at, note.updated_at);

        let fetched = repo.get_for_user(note.id, alice).await.unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reads_are_scoped_by_owner() {
        let (db, alice, bob) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = repo
            .create(alice, &NoteDraft::new("mine", "<p>x</p>"))
            .await
            .unwrap();

        assert!(repo.get_for_user(note.id, bob).await.unwrap().is_none());
        assert!(repo.list_for_user(bob).await.unwrap().is_empty());
        assert_eq!(repo.list_for_user(alice).await.unwrap().len(), 1);
        assert_eq!(repo.owner_of(note.id).await.unwrap(), Some(alice));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_moves_updated_at_forward() {
        let (db, alice, _) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = repo
            .create(alice, &NoteDraft::new("T", "<p>a</p>"))
            .await
            .unwrap();
        let updated = repo
            .update(note.id, alice, &NoteDraft::new("T2", "<p>b</p>"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "T2");
        assert_eq!(updated.content, "<p>b</p>");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at > note.updated_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_and_delete_ignore_foreign_notes() {
        let (db, alice, bob) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = repo
            .create(alice, &NoteDraft::new("T", "<p>a</p>"))
            .await
            .unwrap();

        let hijack = repo
            .update(note.id, bob, &NoteDraft::new("X", "<p>x</p>"))
            .await
            .unwrap();
        assert!(hijack.is_none());
        assert!(!repo.delete(note.id, bob).await.unwrap());

        let untouched = repo.get_for_user(note.id, alice).await.unwrap().unwrap();
        assert_eq!(untouched.title, "T");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete() {
        let (db, alice, _) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = repo
            .create(alice, &NoteDraft::new("T", "<p>a</p>"))
            .await
            .unwrap();
        assert!(repo.delete(note.id, alice).await.unwrap());
        assert!(!repo.delete(note.id, alice).await.unwrap());
        assert!(repo.owner_of(note.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_newest_first() {
        let (db, alice, _) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let first = repo
            .create(alice, &NoteDraft::new("first", "<p>1</p>"))
            .await
            .unwrap();
        repo.create(alice, &NoteDraft::new("second", "<p>2</p>"))
            .await
            .unwrap();
        repo.update(first.id, alice, &NoteDraft::new("first", "<p>1b</p>"))
            .await
            .unwrap();

        let notes = repo.list_for_user(alice).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].updated_at >= notes[1].updated_at);
    }
}
