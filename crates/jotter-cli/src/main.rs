//! Jotter CLI - notes from the terminal

mod auth;
mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use error::CliError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("jotter=info".parse().expect("valid directive"))
                .add_directive("jotter_core=warn".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let api_url = cli.api_url.as_str();

    match cli.command {
        Some(Commands::Register { email, password }) => {
            commands::auth_cmd::run_register(api_url, &email, &password).await
        }
        Some(Commands::Login { email, password }) => {
            commands::auth_cmd::run_login(api_url, &email, &password).await
        }
        Some(Commands::Logout) => commands::auth_cmd::run_logout(),
        Some(Commands::Status) => commands::auth_cmd::run_status(api_url),
        Some(Commands::List { limit, json }) => commands::list::run_list(api_url, limit, json).await,
        Some(Commands::Show { id, json }) => commands::show::run_show(api_url, &id, json).await,
        Some(Commands::Add { title, content }) => {
            commands::add::run_add(api_url, title.as_deref(), &content).await
        }
        Some(Commands::Edit { id, title }) => {
            commands::edit::run_edit(api_url, &id, title.as_deref()).await
        }
        Some(Commands::Delete { id }) => commands::delete::run_delete(api_url, &id).await,
        Some(Commands::Live { id, surface }) => {
            commands::live::run_live(api_url, id.as_deref(), surface.into()).await
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
