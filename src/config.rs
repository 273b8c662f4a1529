use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::fen;

/// Front-end settings, read from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Position the game starts from.
    pub start_fen: String,
    /// Print the board after every accepted move.
    pub show_board: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_fen: fen::STARTING_FEN.to_string(),
            show_board: false,
        }
    }
}

impl Config {
    /// Loads the file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("in config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("failed to parse config")?;
        fen::parse(&config.start_fen)
            .with_context(|| format!("start_fen '{}' is not a playable position", config.start_fen))?;
        Ok(config)
    }
}
