use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chess-rules", version, about = "Chess rules engine driven over stdin")]
pub struct Cli {
    /// Starting position, overrides the config file
    #[arg(long)]
    pub fen: Option<String>,

    /// YAML config file (falls back to $CHESS_RULES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read commands from stdin (default)
    Play,
    /// Check that a FEN string describes a playable position
    Validate { fen: String },
    /// List the legal destinations of the piece on SQUARE
    Moves { fen: String, square: String },
}
