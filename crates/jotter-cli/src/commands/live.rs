//! `jotter live`: a line-oriented editor driven by the sync engine.

use jotter_core::models::html_to_plain_text;
use jotter_core::Note;
use jotter_core::sync::{
    EditorEvent, EditorSession, SessionUpdate, Surface, SyncEngine, SyncStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::commands::common::{
    authenticated_client, escape_html, fetch_note, format_note_detail, parse_note_id,
};
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveCommand {
    Append(String),
    Title(String),
    Sync,
    Save,
    Show,
    Quit,
    SaveAndQuit,
    Help,
    Unknown(String),
}

const HELP: &str = "\
Type text to append a paragraph. Commands:
  :title <text>  rename the note
  :sync          check the server for changes
  :save          save now
  :show          print the note
  :wq            save and quit
  :q             quit (unsaved edits are dropped)";

pub fn parse_live_command(line: &str) -> LiveCommand {
    let trimmed = line.trim_end();
    let Some(command) = trimmed.strip_prefix(':') else {
        return LiveCommand::Append(trimmed.to_string());
    };

    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "title" | "t" => LiveCommand::Title(argument.to_string()),
        "sync" => LiveCommand::Sync,
        "save" | "w" => LiveCommand::Save,
        "show" | "p" => LiveCommand::Show,
        "q" | "quit" => LiveCommand::Quit,
        "wq" | "x" => LiveCommand::SaveAndQuit,
        "help" | "h" | "?" => LiveCommand::Help,
        // `::text` appends a line that starts with a colon
        other if other.starts_with(':') => LiveCommand::Append(command.to_string()),
        other => LiveCommand::Unknown(other.to_string()),
    }
}

pub fn append_paragraph(content: &str, text: &str) -> String {
    format!("{content}<p>{}</p>", escape_html(text))
}

/// Local copy of the note body plus the number of edits handed to the engine.
///
/// A server copy is only adopted when the engine applied it after seeing
/// every edit sent so far; otherwise the queued edit wins inside the engine
/// and the local text must win here too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveBuffer {
    content: String,
    edits_sent: u64,
}

impl LiveBuffer {
    pub fn new(content: impl Into<String>, edit_seq: u64) -> Self {
        Self {
            content: content.into(),
            edits_sent: edit_seq,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Append a paragraph and return the new content to send.
    pub fn append(&mut self, text: &str) -> String {
        self.content = append_paragraph(&self.content, text);
        self.edits_sent += 1;
        self.content.clone()
    }

    pub const fn record_title_edit(&mut self) {
        self.edits_sent += 1;
    }

    pub fn adopt_remote(&mut self, note: &Note, edit_seq: u64) -> bool {
        if edit_seq != self.edits_sent {
            return false;
        }
        self.content.clone_from(&note.content);
        true
    }
}

/// Human-readable line for an engine update, if it is worth showing.
pub fn describe_update(update: &SessionUpdate) -> Option<String> {
    match update {
        SessionUpdate::Status(status) => match status {
            SyncStatus::Saving => Some("[saving]".to_string()),
            SyncStatus::SyncCheck => Some("[checking server]".to_string()),
            SyncStatus::Clean | SyncStatus::Dirty | SyncStatus::Closed => None,
        },
        SessionUpdate::Saved(note) => Some(format!("[saved note {}]", note.id)),
        SessionUpdate::SaveFailed(message) => Some(format!(
            "[save failed: {message}; edits kept, :save to retry]"
        )),
        SessionUpdate::RemoteApplied { note, .. } => Some(format!(
            "[updated from server]\n{}",
            html_to_plain_text(&note.content)
        )),
        SessionUpdate::RemoteDiscarded => {
            Some("[server copy skipped: local edits pending]".to_string())
        }
        SessionUpdate::RemoteMissing(id) => Some(format!(
            "[note {id} no longer exists on the server; local copy kept]"
        )),
        SessionUpdate::Closed { unsaved } => unsaved.then(|| "[closed with unsaved edits]".to_string()),
    }
}

pub async fn run_live(api_url: &str, id: Option<&str>, surface: Surface) -> Result<(), CliError> {
    let (client, _) = authenticated_client(api_url)?;

    let session = match id {
        Some(raw) => {
            let note = fetch_note(&client, parse_note_id(raw)?).await?;
            println!("{}", format_note_detail(&note));
            EditorSession::open(&note, surface.fallback_title())
        }
        None => EditorSession::new_draft("", "", surface.fallback_title()),
    };
    eprintln!("Live editing ({surface} surface). Type :help for commands.");

    let mut buffer = LiveBuffer::new(session.content(), session.edit_seq());
    let (events, events_rx) = mpsc::channel(64);
    let (updates_tx, mut updates) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(client, surface.policy(), session, updates_tx);
    let engine_task = tokio::spawn(engine.run(events_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // EOF on piped input: keep what was typed.
                    send(&events, EditorEvent::SaveNow).await?;
                    break;
                };
                match parse_live_command(&line) {
                    LiveCommand::Append(text) => {
                        if text.trim().is_empty() {
                            continue;
                        }
                        let content = buffer.append(&text);
                        send(&events, EditorEvent::ContentChanged(content)).await?;
                    }
                    LiveCommand::Title(title) => {
                        buffer.record_title_edit();
                        send(&events, EditorEvent::TitleChanged(title)).await?;
                    }
                    LiveCommand::Sync => send(&events, EditorEvent::SyncNow).await?,
                    LiveCommand::Save => send(&events, EditorEvent::SaveNow).await?,
                    LiveCommand::Show => println!("{}", html_to_plain_text(buffer.content())),
                    LiveCommand::Quit => break,
                    LiveCommand::SaveAndQuit => {
                        send(&events, EditorEvent::SaveNow).await?;
                        break;
                    }
                    LiveCommand::Help => eprintln!("{HELP}"),
                    LiveCommand::Unknown(name) => eprintln!("Unknown command :{name} (try :help)"),
                }
            }
            Some(update) = updates.recv() => {
                if let SessionUpdate::RemoteApplied { note, edit_seq } = &update {
                    if !buffer.adopt_remote(note, *edit_seq) {
                        eprintln!("[server copy skipped: local edits pending]");
                        continue;
                    }
                }
                if let Some(line) = describe_update(&update) {
                    eprintln!("{line}");
                }
            }
        }
    }

    send(&events, EditorEvent::Close).await?;
    let session = engine_task
        .await
        .map_err(|error| CliError::Live(format!("sync engine task failed: {error}")))?;

    while let Ok(update) = updates.try_recv() {
        if let Some(line) = describe_update(&update) {
            eprintln!("{line}");
        }
    }
    if let Some(id) = session.note_id() {
        println!("{id}");
    }
    Ok(())
}

async fn send(events: &mpsc::Sender<EditorEvent>, event: EditorEvent) -> Result<(), CliError> {
    events
        .send(event)
        .await
        .map_err(|_| CliError::Live("sync engine stopped".to_string()))
}

#[cfg(test)]
mod tests {
    use jotter_core::{NoteId, UserId};

    use super::*;

    #[test]
    fn plain_lines_append() {
        assert_eq!(
            parse_live_command("hello world"),
            LiveCommand::Append("hello world".to_string())
        );
        assert_eq!(
            parse_live_command("::not a command"),
            LiveCommand::Append(":not a command".to_string())
        );
    }

    #[test]
    fn colon_commands_parse() {
        assert_eq!(
            parse_live_command(":title  Weekly plan "),
            LiveCommand::Title("Weekly plan".to_string())
        );
        assert_eq!(parse_live_command(":sync"), LiveCommand::Sync);
        assert_eq!(parse_live_command(":save"), LiveCommand::Save);
        assert_eq!(parse_live_command(":q"), LiveCommand::Quit);
        assert_eq!(parse_live_command(":wq"), LiveCommand::SaveAndQuit);
        assert_eq!(
            parse_live_command(":frobnicate"),
            LiveCommand::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn append_escapes_markup() {
        assert_eq!(
            append_paragraph("<p>a</p>", "1 < 2 & 3"),
            "<p>a</p><p>1 &lt; 2 &amp; 3</p>"
        );
    }

    fn remote_note(content: &str) -> Note {
        Note {
            id: NoteId::new(4),
            user_id: UserId::new(1),
            title: "T".to_string(),
            content: content.to_string(),
            created_at: 1,
            updated_at: 2,
        }
    }

    #[test]
    fn remote_copy_adopted_when_engine_saw_every_edit() {
        let mut buffer = LiveBuffer::new("<p>a</p>", 0);
        buffer.append("b");
        assert!(buffer.adopt_remote(&remote_note("<p>server</p>"), 1));
        assert_eq!(buffer.content(), "<p>server</p>");

        assert_eq!(buffer.append("c"), "<p>server</p><p>c</p>");
    }

    #[test]
    fn remote_copy_skipped_when_edit_sent_after_apply() {
        // The engine applied the server copy at edit 0, but a typed line was
        // already on its way; that line must survive.
        let mut buffer = LiveBuffer::new("<p>a</p>", 0);
        let sent = buffer.append("typed");
        assert!(!buffer.adopt_remote(&remote_note("<p>server</p>"), 0));
        assert_eq!(buffer.content(), sent);

        assert_eq!(buffer.append("more"), "<p>a</p><p>typed</p><p>more</p>");
    }

    #[test]
    fn title_edits_count_toward_the_sequence() {
        let mut buffer = LiveBuffer::new("<p>a</p>", 3);
        buffer.record_title_edit();
        assert!(!buffer.adopt_remote(&remote_note("<p>server</p>"), 3));
        assert!(buffer.adopt_remote(&remote_note("<p>server</p>"), 4));
    }

    #[test]
    fn updates_render_for_humans() {
        let note = remote_note("<p>remote</p>");
        assert_eq!(
            describe_update(&SessionUpdate::Saved(note.clone())),
            Some("[saved note 4]".to_string())
        );
        assert_eq!(
            describe_update(&SessionUpdate::RemoteApplied { note, edit_seq: 0 }),
            Some("[updated from server]\nremote".to_string())
        );
        assert_eq!(
            describe_update(&SessionUpdate::Status(SyncStatus::Dirty)),
            None
        );
        assert_eq!(
            describe_update(&SessionUpdate::Closed { unsaved: false }),
            None
        );
    }
}
