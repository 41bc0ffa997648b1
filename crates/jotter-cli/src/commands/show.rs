use crate::commands::common::{authenticated_client, fetch_note, format_note_detail, parse_note_id};
use crate::error::CliError;

pub async fn run_show(api_url: &str, id: &str, as_json: bool) -> Result<(), CliError> {
    let id = parse_note_id(id)?;
    let (client, _) = authenticated_client(api_url)?;
    let note = fetch_note(&client, id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{}", format_note_detail(&note));
    }
    Ok(())
}
