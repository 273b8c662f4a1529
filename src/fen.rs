//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use thiserror::Error;

use crate::board::{Board, CastlingRights};
use crate::piece::{Color, PieceKind};
use crate::square::Square;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("expected at most 6 fields, got {0}")]
    TooManyFields(usize),
    #[error("expected 8 ranks, got {0}")]
    WrongRankCount(usize),
    #[error("cannot skip '{0}' squares")]
    InvalidSkipCount(char),
    #[error("unknown piece letter '{0}'")]
    UnknownPiece(char),
    #[error("rank '{rank}' covers {squares} squares instead of 8")]
    MalformedRank { rank: String, squares: usize },
    #[error("invalid active color '{0}'")]
    InvalidActiveColor(String),
    #[error("invalid castling rights '{0}'")]
    InvalidCastlingRights(String),
    #[error("invalid en passant square '{0}'")]
    InvalidEnPassant(String),
    #[error("invalid halfmove clock '{0}'")]
    InvalidHalfmoveClock(String),
    #[error("invalid fullmove number '{0}'")]
    InvalidFullmoveNumber(String),
    #[error("{0} has no king")]
    MissingKing(Color),
    #[error("{0} has more than one king")]
    TooManyKings(Color),
    #[error("the side not to move is in check")]
    OpponentInCheck,
}

/// Parses a FEN string into a board.
///
/// Placement and active color are required. Castling rights, en passant,
/// halfmove clock and fullmove number default to `-`, `-`, `0` and `1`.
pub fn parse(fen: &str) -> Result<Board, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() > 6 {
        return Err(FenError::TooManyFields(fields.len()));
    }
    let placement = *fields.first().ok_or(FenError::MissingField("placement"))?;
    let active = *fields.get(1).ok_or(FenError::MissingField("active color"))?;
    let castling = fields.get(2).copied().unwrap_or("-");
    let en_passant = fields.get(3).copied().unwrap_or("-");
    let halfmove = fields.get(4).copied().unwrap_or("0");
    let fullmove = fields.get(5).copied().unwrap_or("1");

    let mut board = Board::empty();
    parse_placement(&mut board, placement)?;
    check_kings(&board)?;

    let side = match active {
        "w" => Color::Light,
        "b" => Color::Dark,
        other => return Err(FenError::InvalidActiveColor(other.to_string())),
    };
    board.set_side_to_move(side);

    let (light, dark) = parse_castling(castling)?;
    board.set_castling_grant(Color::Light, light);
    board.set_castling_grant(Color::Dark, dark);

    board.set_en_passant(parse_en_passant(en_passant)?);

    let clock = halfmove
        .parse::<u32>()
        .map_err(|_| FenError::InvalidHalfmoveClock(halfmove.to_string()))?;
    board.set_halfmove_clock(clock);

    // The ply count has to fit in a u32 as well as the fullmove number.
    let dark = if side == Color::Dark { 1 } else { 0 };
    let ply = fullmove
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|n| n.checked_mul(2))
        .and_then(|n| n.checked_add(dark))
        .ok_or_else(|| FenError::InvalidFullmoveNumber(fullmove.to_string()))?;
    board.set_ply(ply);

    board.rebuild_piece_index();
    if board.is_in_check(side.opposite()) {
        return Err(FenError::OpponentInCheck);
    }
    Ok(board)
}

fn parse_placement(board: &mut Board, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount(ranks.len()));
    }

    for (row, rank) in ranks.iter().enumerate() {
        let row = row as u8;
        let mut file = 0usize;
        for ch in rank.chars() {
            if let Some(skip) = ch.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(FenError::InvalidSkipCount(ch));
                }
                file += skip as usize;
                continue;
            }
            let kind = PieceKind::from_letter(ch).ok_or(FenError::UnknownPiece(ch))?;
            let color = if ch.is_ascii_uppercase() {
                Color::Light
            } else {
                Color::Dark
            };
            let square = Square::from_file_row(file as u8, row).ok_or_else(|| {
                FenError::MalformedRank {
                    rank: rank.to_string(),
                    squares: file + 1,
                }
            })?;
            board.add_piece(kind, color, square, starts_moved(kind, color, square));
            file += 1;
        }
        if file != 8 {
            return Err(FenError::MalformedRank {
                rank: rank.to_string(),
                squares: file,
            });
        }
    }
    Ok(())
}

/// Pawns off their home row cannot double step; a king off e1/e8 cannot
/// castle.
fn starts_moved(kind: PieceKind, color: Color, square: Square) -> bool {
    match kind {
        PieceKind::Pawn => square.row() != color.pawn_row(),
        PieceKind::King => square.row() != color.back_row() || square.file() != 4,
        _ => false,
    }
}

fn check_kings(board: &Board) -> Result<(), FenError> {
    for color in [Color::Light, Color::Dark] {
        match board.pieces_matching(PieceKind::King, color).len() {
            0 => return Err(FenError::MissingKing(color)),
            1 => {}
            _ => return Err(FenError::TooManyKings(color)),
        }
    }
    Ok(())
}

fn parse_castling(field: &str) -> Result<(CastlingRights, CastlingRights), FenError> {
    let mut light = CastlingRights::default();
    let mut dark = CastlingRights::default();
    if field == "-" {
        return Ok((light, dark));
    }
    for ch in field.chars() {
        match ch {
            'K' => light.kingside = true,
            'Q' => light.queenside = true,
            'k' => dark.kingside = true,
            'q' => dark.queenside = true,
            _ => return Err(FenError::InvalidCastlingRights(field.to_string())),
        }
    }
    Ok((light, dark))
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let invalid = || FenError::InvalidEnPassant(field.to_string());
    let square: Square = field.parse().map_err(|_| invalid())?;
    match square.coordinates().1 {
        '3' | '6' => Ok(Some(square)),
        _ => Err(invalid()),
    }
}

/// Writes the board as a six-field FEN string.
pub fn serialize(board: &Board) -> String {
    let mut ranks = Vec::with_capacity(8);
    for row in board.squares().chunks(8) {
        let mut rank = String::new();
        let mut empty = 0;
        for &square in row {
            match board.piece_at(square) {
                Some(piece) => {
                    if empty > 0 {
                        rank.push_str(&empty.to_string());
                        empty = 0;
                    }
                    rank.push(piece.fen_letter());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            rank.push_str(&empty.to_string());
        }
        ranks.push(rank);
    }

    let active = match board.side_to_move() {
        Color::Light => "w",
        Color::Dark => "b",
    };

    let mut castling = String::new();
    for (color, kingside, queenside) in [(Color::Light, 'K', 'Q'), (Color::Dark, 'k', 'q')] {
        let rights = board.castling_rights(color);
        if rights.kingside {
            castling.push(kingside);
        }
        if rights.queenside {
            castling.push(queenside);
        }
    }
    if castling.is_empty() {
        castling.push('-');
    }

    let en_passant = board
        .en_passant()
        .map_or_else(|| "-".to_string(), |sq| sq.to_string());

    format!(
        "{} {} {} {} {} {}",
        ranks.join("/"),
        active,
        castling,
        en_passant,
        board.halfmove_clock(),
        board.fullmove_number()
    )
}

/// True when `fen` has all six fields and describes a playable position.
pub fn is_valid_fen(fen: &str) -> bool {
    fen.split_whitespace().count() == 6 && parse(fen).is_ok()
}
