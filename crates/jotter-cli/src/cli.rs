use clap::{Parser, Subcommand, ValueEnum};
use jotter_core::sync::Surface;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "jotter")]
#[command(about = "Write and sync notes from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Jotter API base URL
    #[arg(
        long,
        global = true,
        env = "JOTTER_API_URL",
        default_value = DEFAULT_API_URL,
        value_name = "URL"
    )]
    pub api_url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign in and store the session token
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// List notes, most recently updated first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a single note
    Show {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        #[arg(short, long)]
        title: Option<String>,
        /// Note content (falls back to piped stdin, then $EDITOR)
        content: Vec<String>,
    },
    /// Edit a note's content in $EDITOR
    Edit {
        /// Note ID
        id: String,
        /// Replace the title as well
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: String,
    },
    /// Interactive editing session with auto-save
    Live {
        /// Note ID (omit to start a new note)
        id: Option<String>,
        /// Editor surface whose timing to use
        #[arg(long, value_enum, default_value_t = SurfaceArg::Main)]
        surface: SurfaceArg,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SurfaceArg {
    Main,
    Floating,
    Mobile,
}

impl From<SurfaceArg> for Surface {
    fn from(value: SurfaceArg) -> Self {
        match value {
            SurfaceArg::Main => Self::MainWindow,
            SurfaceArg::Floating => Self::FloatingWindow,
            SurfaceArg::Mobile => Self::Mobile,
        }
    }
}
