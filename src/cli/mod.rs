//! CLI module for ToolScout.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// ToolScout - AI tool discovery
///
/// Finds videos that demonstrate individual AI tools for what you want to do,
/// picks the best ones, and lets you chat about them.
#[derive(Parser, Debug)]
#[command(name = "toolscout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find AI tools for a task
    Discover {
        /// What you want to do, in any language
        query: String,

        /// Translate titles and summaries into this language
        #[arg(short, long)]
        language: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Discover tools, then chat about them interactively
    Chat {
        /// Initial query (prompted for if omitted)
        query: Option<String>,

        /// Translate titles and summaries into this language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check API keys and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
