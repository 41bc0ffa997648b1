//! Per-editor sync state.
//!
//! [`EditorSession`] holds everything one open editor knows about its note:
//! the local title/content, the last content known to be on the server, and
//! the edit sequence used to recognise stale save responses. It performs no
//! I/O; [`super::SyncEngine`] drives it.

use crate::models::{Note, NoteDraft, NoteId};

/// Observable state of an editor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local view matches the last saved or fetched server copy
    Clean,
    /// Local edits have not been sent yet
    Dirty,
    /// A save request is in flight and nothing newer is pending
    Saving,
    /// A server fetch is in flight
    SyncCheck,
    /// Editor closed; all further events are ignored
    Closed,
}

/// Which request a save turns into
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveTarget {
    Create,
    Update(NoteId),
}

/// Snapshot of the editor handed to the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    /// Edit sequence number the snapshot was taken at
    pub seq: u64,
    pub target: SaveTarget,
    pub draft: NoteDraft,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved and nothing changed locally since the snapshot
    Saved(Note),
    /// Saved, but newer local edits are still pending
    Superseded(Note),
    /// The request failed; the edits stay pending
    Failed,
    /// Response for a save this session no longer tracks
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Server copy replaced the local view
    Applied(Note),
    /// Server content equals the baseline
    Unchanged,
    /// A local edit is pending; the server copy was dropped
    Discarded,
    /// Response for a check this session no longer tracks
    Ignored,
}

#[derive(Clone, Debug)]
pub struct EditorSession {
    note_id: Option<NoteId>,
    title: String,
    content: String,
    fallback_title: String,
    baseline: Option<String>,
    edit_seq: u64,
    pending_edit: bool,
    in_flight_save: Option<u64>,
    in_flight_check: Option<u64>,
    closed: bool,
}

impl EditorSession {
    /// Editor for a note that already exists on the server
    pub fn open(note: &Note, fallback_title: impl Into<String>) -> Self {
        Self {
            note_id: Some(note.id),
            title: note.title.clone(),
            content: note.content.clone(),
            fallback_title: fallback_title.into(),
            baseline: Some(note.content.clone()),
            edit_seq: 0,
            pending_edit: false,
            in_flight_save: None,
            in_flight_check: None,
            closed: false,
        }
    }

    /// Editor for a note that is created on its first save
    pub fn new_draft(
        title: impl Into<String>,
        content: impl Into<String>,
        fallback_title: impl Into<String>,
    ) -> Self {
        Self {
            note_id: None,
            title: title.into(),
            content: content.into(),
            fallback_title: fallback_title.into(),
            baseline: None,
            edit_seq: 0,
            pending_edit: false,
            in_flight_save: None,
            in_flight_check: None,
            closed: false,
        }
    }

    pub const fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content last confirmed to be on the server
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    pub const fn edit_seq(&self) -> u64 {
        self.edit_seq
    }

    pub const fn has_pending_edit(&self) -> bool {
        self.pending_edit
    }

    pub const fn is_saving(&self) -> bool {
        self.in_flight_save.is_some()
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub const fn status(&self) -> SyncStatus {
        if self.closed {
            SyncStatus::Closed
        } else if self.pending_edit {
            SyncStatus::Dirty
        } else if self.in_flight_save.is_some() {
            SyncStatus::Saving
        } else if self.in_flight_check.is_some() {
            SyncStatus::SyncCheck
        } else {
            SyncStatus::Clean
        }
    }

    pub fn edit_title(&mut self, title: impl Into<String>) -> u64 {
        self.title = title.into();
        self.record_edit()
    }

    pub fn edit_content(&mut self, content: impl Into<String>) -> u64 {
        self.content = content.into();
        self.record_edit()
    }

    fn record_edit(&mut self) -> u64 {
        if self.closed {
            return self.edit_seq;
        }
        self.edit_seq += 1;
        self.pending_edit = true;
        self.edit_seq
    }

    /// Snapshot pending edits for a save.
    ///
    /// Returns `None` when nothing is pending, the editor is closed, or a save
    /// is already in flight (only one save runs at a time so a first save
    /// cannot create the note twice).
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        if self.closed || !self.pending_edit || self.in_flight_save.is_some() {
            return None;
        }

        let title = if self.title.trim().is_empty() {
            self.fallback_title.clone()
        } else {
            self.title.clone()
        };
        let target = self
            .note_id
            .map_or(SaveTarget::Create, SaveTarget::Update);

        self.pending_edit = false;
        self.in_flight_save = Some(self.edit_seq);
        Some(SaveRequest {
            seq: self.edit_seq,
            target,
            draft: NoteDraft::new(title, self.content.clone()),
        })
    }

    /// Apply a successful save response.
    pub fn complete_save(&mut self, seq: u64, note: Note) -> SaveOutcome {
        if self.in_flight_save != Some(seq) {
            return SaveOutcome::Ignored;
        }
        self.in_flight_save = None;

        // Keep the id even when superseded so the next save updates
        // instead of creating a second note.
        self.note_id = Some(note.id);
        self.baseline = Some(note.content.clone());

        if seq == self.edit_seq && !self.pending_edit {
            SaveOutcome::Saved(note)
        } else {
            SaveOutcome::Superseded(note)
        }
    }

    /// Record a failed save; its edits become pending again.
    pub fn fail_save(&mut self, seq: u64) -> SaveOutcome {
        if self.in_flight_save != Some(seq) {
            return SaveOutcome::Ignored;
        }
        self.in_flight_save = None;
        if !self.closed {
            self.pending_edit = true;
        }
        SaveOutcome::Failed
    }

    /// Start a server fetch; returns the note to fetch and a check token.
    pub fn begin_sync_check(&mut self) -> Option<(u64, NoteId)> {
        if self.closed || self.in_flight_check.is_some() {
            return None;
        }
        let id = self.note_id?;
        self.in_flight_check = Some(self.edit_seq);
        Some((self.edit_seq, id))
    }

    /// Reconcile a fetched server copy with the local view.
    ///
    /// The server wins unless the user has typed since the last save or
    /// since the fetch started.
    pub fn apply_remote(&mut self, token: u64, remote: Note) -> RemoteOutcome {
        if self.in_flight_check != Some(token) {
            return RemoteOutcome::Ignored;
        }
        self.in_flight_check = None;

        if self.closed || Some(remote.id) != self.note_id {
            return RemoteOutcome::Ignored;
        }
        if self.pending_edit || self.in_flight_save.is_some() || self.edit_seq != token {
            return RemoteOutcome::Discarded;
        }
        if self.baseline.as_deref() == Some(remote.content.as_str()) {
            return RemoteOutcome::Unchanged;
        }

        self.title = remote.title.clone();
        self.content = remote.content.clone();
        self.baseline = Some(remote.content.clone());
        RemoteOutcome::Applied(remote)
    }

    /// Forget an in-flight check whose request failed.
    pub fn abandon_sync_check(&mut self, token: u64) {
        if self.in_flight_check == Some(token) {
            self.in_flight_check = None;
        }
    }

    /// Close the editor. Returns whether unsaved edits were dropped.
    pub fn close(&mut self) -> bool {
        self.closed = true;
        self.pending_edit
    }
}
