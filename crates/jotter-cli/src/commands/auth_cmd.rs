use chrono::Utc;

use crate::auth::{SessionStore, StoredSession};
use crate::commands::common::{api_client, format_timestamp};
use crate::error::CliError;

pub async fn run_register(api_url: &str, email: &str, password: &str) -> Result<(), CliError> {
    let client = api_client(api_url)?;
    let user_id = client.register(email, password).await?;
    println!("Registered {email} (user {user_id}). Run `jotter login` to sign in.");
    Ok(())
}

pub async fn run_login(api_url: &str, email: &str, password: &str) -> Result<(), CliError> {
    let client = api_client(api_url)?;
    let token = client.login(email, password).await?;

    let store = SessionStore::default_location()?;
    let session = StoredSession::new(token, email.trim().to_string());
    store.save(&session)?;
    tracing::debug!(path = %store.path().display(), "Stored session");

    println!("Signed in as {}", session.email);
    Ok(())
}

pub fn run_logout() -> Result<(), CliError> {
    if SessionStore::default_location()?.clear()? {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

pub fn run_status(api_url: &str) -> Result<(), CliError> {
    let store = SessionStore::default_location()?;
    let Some(session) = store.load()? else {
        println!("Not signed in ({api_url})");
        return Ok(());
    };

    if session.is_expired_at(Utc::now().timestamp_millis()) {
        println!(
            "Session for {} expired at {}",
            session.email,
            format_timestamp(session.expires_at())
        );
    } else {
        println!(
            "Signed in as {} on {api_url} (expires {})",
            session.email,
            format_timestamp(session.expires_at())
        );
    }
    Ok(())
}
