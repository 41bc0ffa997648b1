//! Async driver for one editor surface.

use std::future::{pending, Future};

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

use super::backend::NotesBackend;
use super::policy::SyncPolicy;
use super::session::{
    EditorSession, RemoteOutcome, SaveOutcome, SaveTarget, SyncStatus,
};
use crate::client::{ClientError, ClientResult};
use crate::models::{Note, NoteId};

/// Input from the editor UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    TitleChanged(String),
    ContentChanged(String),
    /// Window or app regained focus
    Focus,
    /// Explicit request to check the server now
    SyncNow,
    /// Skip the debounce and save pending edits
    SaveNow,
    Close,
}

/// Notifications back to the editor UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    Status(SyncStatus),
    Saved(Note),
    SaveFailed(String),
    /// Server copy adopted; `edit_seq` is the local edit count it replaced.
    /// A UI that has sent more edits than that keeps its own text.
    RemoteApplied { note: Note, edit_seq: u64 },
    RemoteDiscarded,
    /// The note is gone on the server; the local copy is kept
    RemoteMissing(NoteId),
    Closed { unsaved: bool },
}

type SaveResult = (u64, ClientResult<Note>);
type CheckResult = (u64, ClientResult<Note>);

/// Debounced auto-save and background refresh for a single editor.
///
/// One engine per surface; engines do not share state, so two windows on the
/// same note reconcile only through the server.
pub struct SyncEngine<B> {
    backend: B,
    policy: SyncPolicy,
    session: EditorSession,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    saves: JoinSet<SaveResult>,
    checks: JoinSet<CheckResult>,
    debounce: Option<Instant>,
    save_deferred: bool,
    last_status: SyncStatus,
}

impl<B: NotesBackend> SyncEngine<B> {
    pub fn new(
        backend: B,
        policy: SyncPolicy,
        session: EditorSession,
        updates: mpsc::UnboundedSender<SessionUpdate>,
    ) -> Self {
        let last_status = session.status();
        Self {
            backend,
            policy,
            session,
            updates,
            saves: JoinSet::new(),
            checks: JoinSet::new(),
            debounce: None,
            save_deferred: false,
            last_status,
        }
    }

    /// Process editor events until `Close` or the sender is dropped.
    ///
    /// Returns the final session. Pending debounced edits are not flushed on
    /// close; a save already in flight (or requested with `SaveNow`) is
    /// allowed to finish.
    pub async fn run(mut self, mut events: mpsc::Receiver<EditorEvent>) -> EditorSession {
        let mut poll = self.policy.poll_interval.map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(EditorEvent::Close) | None => break,
                    Some(event) => self.handle_event(event),
                },
                () = wait_until(self.debounce) => {
                    self.debounce = None;
                    self.start_save();
                }
                () = tick(poll.as_mut()) => self.start_sync_check(),
                Some(joined) = self.saves.join_next() => self.finish_save(joined),
                Some(joined) = self.checks.join_next() => self.finish_sync_check(joined),
            }
            self.publish_status();
        }

        self.shutdown().await
    }

    fn handle_event(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::TitleChanged(title) => {
                self.session.edit_title(title);
                self.schedule_save();
            }
            EditorEvent::ContentChanged(content) => {
                self.session.edit_content(content);
                self.schedule_save();
            }
            EditorEvent::Focus => {
                if self.policy.sync_on_focus {
                    self.start_sync_check();
                }
            }
            EditorEvent::SyncNow => self.start_sync_check(),
            EditorEvent::SaveNow => {
                self.debounce = None;
                self.start_save();
            }
            EditorEvent::Close => {}
        }
    }

    fn schedule_save(&mut self) {
        self.debounce = Some(Instant::now() + self.policy.debounce);
    }

    fn start_save(&mut self) {
        if self.session.is_saving() {
            self.save_deferred = self.session.has_pending_edit();
            return;
        }
        self.save_deferred = false;

        let Some(request) = self.session.begin_save() else {
            return;
        };
        tracing::debug!(seq = request.seq, "Saving note");

        let backend = self.backend.clone();
        self.saves.spawn(async move {
            let result = match request.target {
                SaveTarget::Create => backend.create_note(request.draft).await,
                SaveTarget::Update(id) => backend.update_note(id, request.draft).await,
            };
            (request.seq, result)
        });
    }

    fn finish_save(&mut self, joined: Result<SaveResult, JoinError>) {
        let (seq, result) = match joined {
            Ok(output) => output,
            Err(error) => {
                tracing::error!("Save task failed: {error}");
                return;
            }
        };

        let outcome = match result {
            Ok(note) => self.session.complete_save(seq, note),
            Err(error) => {
                tracing::warn!(seq, "Auto-save failed: {error}");
                let outcome = self.session.fail_save(seq);
                if outcome == SaveOutcome::Failed {
                    self.send(SessionUpdate::SaveFailed(error.to_string()));
                }
                outcome
            }
        };

        match outcome {
            SaveOutcome::Saved(note) => self.send(SessionUpdate::Saved(note)),
            SaveOutcome::Superseded(note) => {
                tracing::debug!(seq, note_id = %note.id, "Save superseded by newer edits");
            }
            SaveOutcome::Failed | SaveOutcome::Ignored => {}
        }

        if self.save_deferred {
            self.start_save();
        }
    }

    fn start_sync_check(&mut self) {
        let Some((token, id)) = self.session.begin_sync_check() else {
            return;
        };
        let backend = self.backend.clone();
        self.checks
            .spawn(async move { (token, backend.fetch_note(id).await) });
    }

    fn finish_sync_check(&mut self, joined: Result<CheckResult, JoinError>) {
        let (token, result) = match joined {
            Ok(output) => output,
            Err(error) => {
                tracing::error!("Sync check task failed: {error}");
                return;
            }
        };

        match result {
            Ok(remote) => match self.session.apply_remote(token, remote) {
                RemoteOutcome::Applied(note) => self.send(SessionUpdate::RemoteApplied {
                    note,
                    edit_seq: self.session.edit_seq(),
                }),
                RemoteOutcome::Discarded => {
                    tracing::debug!("Remote copy discarded; local edit pending");
                    self.send(SessionUpdate::RemoteDiscarded);
                }
                RemoteOutcome::Unchanged | RemoteOutcome::Ignored => {}
            },
            Err(error) => {
                self.session.abandon_sync_check(token);
                self.report_check_error(&error);
            }
        }
    }

    fn report_check_error(&self, error: &ClientError) {
        if error.is_not_found() {
            if let Some(id) = self.session.note_id() {
                tracing::warn!(note_id = %id, "Note no longer exists on the server");
                self.send(SessionUpdate::RemoteMissing(id));
            }
        } else {
            tracing::warn!("Sync check failed: {error}");
        }
    }

    async fn shutdown(mut self) -> EditorSession {
        self.debounce = None;
        self.checks.abort_all();

        while let Some(joined) = self.saves.join_next().await {
            self.finish_save(joined);
        }

        let unsaved = self.session.close();
        if unsaved {
            tracing::info!("Editor closed with unsaved edits");
        }
        self.publish_status();
        self.send(SessionUpdate::Closed { unsaved });
        self.session
    }

    fn publish_status(&mut self) {
        let status = self.session.status();
        if status != self.last_status {
            self.last_status = status;
            self.send(SessionUpdate::Status(status));
        }
    }

    fn send(&self, update: SessionUpdate) {
        // Nobody listening is fine; the engine keeps saving.
        let _ = self.updates.send(update);
    }
}

fn wait_until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => pending().await,
        }
    }
}

async fn tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
