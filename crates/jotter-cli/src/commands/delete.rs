use crate::commands::common::{authenticated_client, client_error, parse_note_id};
use crate::error::CliError;

pub async fn run_delete(api_url: &str, id: &str) -> Result<(), CliError> {
    let id = parse_note_id(id)?;
    let (client, _) = authenticated_client(api_url)?;

    match client.delete_note(id).await {
        Ok(message) => {
            tracing::debug!("{message}");
            println!("{id}");
            Ok(())
        }
        Err(error) if error.is_not_found() => {
            println!("Note {id} was already deleted");
            Ok(())
        }
        Err(error) => Err(client_error(error)),
    }
}
