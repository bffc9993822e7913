//! Command-line interface for trivia_arena.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trivia Arena - live multiplayer trivia server with an MCP interface
#[derive(Parser, Debug)]
#[command(name = "trivia_arena")]
#[command(about = "Live multiplayer trivia server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults are used when missing)
    #[arg(short, long, global = true, default_value = "trivia_arena.toml")]
    pub config: PathBuf,

    /// Directory holding question set JSON files
    #[arg(long, global = true)]
    pub question_dir: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the MCP trivia server (stdio mode)
    Server,

    /// Run the HTTP trivia server
    Http {
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },
}
