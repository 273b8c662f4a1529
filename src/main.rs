mod cli;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use chess_rules::config::Config;
use chess_rules::fen;
use chess_rules::game::Game;
use chess_rules::protocol::CommandHandler;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // stdout carries the protocol, so only warnings are logged by default.
    let env = Env::default().filter_or("CHESS_RULES_LOG", "warn");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var_os("CHESS_RULES_CONFIG").map(PathBuf::from));
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(fen) = cli.fen {
        config.start_fen = fen;
    }

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => {
            let game = Game::from_fen(&config.start_fen)
                .with_context(|| format!("invalid starting position '{}'", config.start_fen))?;
            info!("starting from {}", config.start_fen);
            CommandHandler::new(game, config.show_board).run()
        }
        Commands::Validate { fen } => {
            if let Err(e) = fen::parse(&fen) {
                bail!("invalid: {}", e);
            }
            if !fen::is_valid_fen(&fen) {
                bail!("invalid: expected 6 fields");
            }
            println!("valid");
            Ok(())
        }
        Commands::Moves { fen, square } => {
            let game = Game::from_fen(&fen).context("invalid position")?;
            let mut handler = CommandHandler::new(game, false);
            print!("{}", handler.handle_command(&format!("moves {}", square))?);
            Ok(())
        }
    }
}
