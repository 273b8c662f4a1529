use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};

use crate::fen;
use crate::game::{Game, GameStatus, MoveOutcome, MoveResult};
use crate::moves::AppliedMove;
use crate::piece::{Color, PieceKind, PromotionChoice};
use crate::square::Square;

/// Line-oriented command loop around a [`Game`].
pub struct CommandHandler {
    game: Game,
    show_board: bool,
}

impl CommandHandler {
    pub fn new(game: Game, show_board: bool) -> Self {
        CommandHandler { game, show_board }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line.context("failed to read command")?;
            let command = line.trim();
            if command == "quit" {
                break;
            }
            match self.handle_command(command) {
                Ok(response) => write!(stdout, "{}", response)?,
                Err(e) => writeln!(stdout, "error: {:#}", e)?,
            }
            stdout.flush()?;
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "position" => self.handle_position(&parts[1..]),
            "fen" => Ok(format!("{}\n", self.game.export_position())),
            "board" => Ok(format!("{}\n", self.game.board())),
            "turn" => Ok(format!("{}\n", self.game.side_to_move())),
            "moves" => self.handle_moves(&parts[1..]),
            "move" => self.handle_move(&parts[1..]),
            "promote" => self.handle_promote(&parts[1..]),
            "abort" => Ok(if self.game.abort_promotion() {
                "promotion aborted\n".to_string()
            } else {
                "nothing to abort\n".to_string()
            }),
            "check" => Ok(format!(
                "Light {} Dark {}\n",
                self.game.king_in_check(Color::Light),
                self.game.king_in_check(Color::Dark)
            )),
            "status" => Ok(format!("{}\n", describe_status(self.game.status()))),
            other => bail!("unknown command '{}'", other),
        }
    }

    fn handle_position(&mut self, parts: &[&str]) -> Result<String> {
        match parts.first() {
            Some(&"startpos") => self.game.load_position(fen::STARTING_FEN)?,
            Some(&"fen") if parts.len() > 1 => self.game.load_position(&parts[1..].join(" "))?,
            _ => bail!("usage: position startpos | position fen <FEN>"),
        }
        Ok(String::new())
    }

    fn handle_moves(&self, parts: &[&str]) -> Result<String> {
        let square = parse_square(parts.first().copied())?;
        let piece = self
            .game
            .piece_at(square)
            .ok_or_else(|| anyhow!("no piece on {}", square))?;
        let destinations: Vec<String> = self
            .game
            .legal_destinations(piece.id)
            .iter()
            .map(|s| s.to_string())
            .collect();
        if destinations.is_empty() {
            Ok("(none)\n".to_string())
        } else {
            Ok(format!("{}\n", destinations.join(" ")))
        }
    }

    fn handle_move(&mut self, parts: &[&str]) -> Result<String> {
        let (from, to, promotion) = parse_move(parts)?;
        let piece = self
            .game
            .piece_at(from)
            .ok_or_else(|| anyhow!("no piece on {}", from))?;
        let promotes = piece.kind == PieceKind::Pawn && to.row() == piece.color.promotion_row();
        if promotion.is_some() && !promotes {
            bail!("{}{} is not a promotion", from, to);
        }
        let piece = piece.id;

        let outcome = match self.game.attempt_move(piece, to) {
            Ok(MoveOutcome::PromotionPending(_)) => match promotion {
                Some(choice) => self.game.choose_promotion(choice),
                None => return Ok("promote to? q r b n\n".to_string()),
            },
            other => other,
        };
        Ok(self.describe_outcome(outcome))
    }

    fn handle_promote(&mut self, parts: &[&str]) -> Result<String> {
        let choice: PromotionChoice = parts
            .first()
            .ok_or_else(|| anyhow!("usage: promote q|r|b|n"))?
            .parse()?;
        let outcome = self.game.choose_promotion(choice);
        Ok(self.describe_outcome(outcome))
    }

    fn describe_outcome(&self, outcome: MoveResult) -> String {
        match outcome {
            Ok(MoveOutcome::Applied(applied)) => {
                let mut response = format!("ok {}\n", format_move(&applied));
                if self.show_board {
                    response.push_str(&format!("{}\n", self.game.board()));
                }
                response
            }
            Ok(MoveOutcome::PromotionPending(_)) => "promote to? q r b n\n".to_string(),
            Err(reason) => format!("rejected: {}\n", reason),
        }
    }
}

fn parse_square(text: Option<&str>) -> Result<Square> {
    let text = text.ok_or_else(|| anyhow!("missing square"))?;
    text.parse()
        .with_context(|| format!("'{}' is not a square", text))
}

/// Accepts `e2e4`, `e7e8q`, `e2 e4` and `e7 e8 q`.
fn parse_move(parts: &[&str]) -> Result<(Square, Square, Option<PromotionChoice>)> {
    let joined = parts.concat();
    if !(joined.len() == 4 || joined.len() == 5) || !joined.is_ascii() {
        bail!("usage: move <from><to>[q|r|b|n]");
    }
    let from = parse_square(Some(&joined[0..2]))?;
    let to = parse_square(Some(&joined[2..4]))?;
    let promotion = match joined.get(4..) {
        Some(letter) if !letter.is_empty() => {
            Some(letter.parse::<PromotionChoice>()?)
        }
        _ => None,
    };
    Ok((from, to, promotion))
}

fn format_move(applied: &AppliedMove) -> String {
    let mut result = format!("{}{}", applied.from, applied.to);
    if let Some(kind) = applied.promotion {
        result.push(kind.letter());
    }
    result
}

fn describe_status(status: GameStatus) -> String {
    match status {
        GameStatus::Ongoing => "ongoing".to_string(),
        GameStatus::Checkmate { winner } => format!("checkmate, {} wins", winner),
        GameStatus::Stalemate => "stalemate".to_string(),
        GameStatus::FiftyMoveRule => "draw by the fifty-move rule".to_string(),
        GameStatus::InsufficientMaterial => "draw by insufficient material".to_string(),
    }
}
