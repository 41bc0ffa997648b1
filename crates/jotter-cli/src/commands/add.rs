use jotter_core::models::NoteDraft;

use crate::commands::common::{
    authenticated_client, client_error, resolve_note_content, text_to_html,
};
use crate::error::CliError;

pub async fn run_add(
    api_url: &str,
    title: Option<&str>,
    content_parts: &[String],
) -> Result<(), CliError> {
    let (client, _) = authenticated_client(api_url)?;
    let content = resolve_note_content(content_parts)?;

    let title = title
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map_or_else(|| default_title(&content), str::to_string);
    let draft = NoteDraft::new(title, text_to_html(&content));
    draft.validate()?;

    let note = client.create_note(&draft).await.map_err(client_error)?;
    println!("{}", note.id);
    Ok(())
}

/// First line of the content, or "Untitled"
fn default_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        "Untitled".to_string()
    } else {
        first_line.chars().take(60).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_title_uses_first_line() {
        assert_eq!(default_title("Groceries\nmilk\neggs"), "Groceries");
        assert_eq!(default_title(""), "Untitled");
    }
}
