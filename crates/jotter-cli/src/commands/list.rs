use crate::commands::common::{
    authenticated_client, client_error, format_note_lines, note_to_list_item, NoteListItem,
};
use crate::error::CliError;

pub async fn run_list(api_url: &str, limit: usize, as_json: bool) -> Result<(), CliError> {
    let (client, _) = authenticated_client(api_url)?;
    let mut notes = client.list_notes().await.map_err(client_error)?;
    notes.truncate(limit);

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes yet. Create one with `jotter add`.");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
