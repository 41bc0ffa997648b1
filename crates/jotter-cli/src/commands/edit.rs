use jotter_core::models::NoteDraft;

use crate::commands::common::{
    authenticated_client, capture_editor_input_with_initial, client_error, fetch_note,
    parse_note_id,
};
use crate::error::CliError;

pub async fn run_edit(api_url: &str, id: &str, title: Option<&str>) -> Result<(), CliError> {
    let id = parse_note_id(id)?;
    let (client, _) = authenticated_client(api_url)?;
    let note = fetch_note(&client, id).await?;

    let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
        return Err(CliError::EmptyEditedContent);
    };

    let new_title = title.map_or_else(|| note.title.clone(), |title| title.trim().to_string());
    if edited_content == note.content && new_title == note.title {
        println!("{}", note.id);
        return Ok(());
    }

    let draft = NoteDraft::new(new_title, edited_content);
    draft.validate()?;
    let updated = client
        .update_note(note.id, &draft)
        .await
        .map_err(client_error)?;
    println!("{}", updated.id);
    Ok(())
}
