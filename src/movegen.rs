//! Per-piece move generation.
//!
//! Every generator answers "where could this piece go", ignoring whether the
//! move would leave its own king in check. King safety is layered on top by
//! [`crate::moves::Move`].

use log::trace;

use crate::board::Board;
use crate::piece::{Color, Piece, PieceKind};
use crate::square::{Direction, Square, SquareSet};

const FORWARD: i8 = Direction::Forward.white_delta();
const RIGHT: i8 = Direction::Right.white_delta();

const DIAGONALS: [(i8, i8); 4] = [
    (FORWARD, RIGHT),
    (FORWARD, -RIGHT),
    (-FORWARD, RIGHT),
    (-FORWARD, -RIGHT),
];

const ORTHOGONALS: [(i8, i8); 4] = [(FORWARD, 0), (-FORWARD, 0), (0, RIGHT), (0, -RIGHT)];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2 * FORWARD, RIGHT),
    (2 * FORWARD, -RIGHT),
    (-2 * FORWARD, RIGHT),
    (-2 * FORWARD, -RIGHT),
    (FORWARD, 2 * RIGHT),
    (FORWARD, -2 * RIGHT),
    (-FORWARD, 2 * RIGHT),
    (-FORWARD, -2 * RIGHT),
];

/// Movement pattern of one kind of piece.
pub trait MoveRules {
    /// Destinations reachable by `piece`, own king safety not considered.
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet;

    /// Squares on which `piece` could capture an enemy king.
    fn attacked_squares(&self, piece: &Piece, board: &Board) -> SquareSet {
        self.possible_moves(piece, board)
    }
}

pub struct PawnRules;
pub struct KnightRules;
pub struct BishopRules;
pub struct RookRules;
pub struct QueenRules;
pub struct KingRules;

pub fn rules_for(kind: PieceKind) -> &'static dyn MoveRules {
    match kind {
        PieceKind::Pawn => &PawnRules,
        PieceKind::Knight => &KnightRules,
        PieceKind::Bishop => &BishopRules,
        PieceKind::Rook => &RookRules,
        PieceKind::Queen => &QueenRules,
        PieceKind::King => &KingRules,
    }
}

pub fn possible_moves(piece: &Piece, board: &Board) -> SquareSet {
    let moves = rules_for(piece.kind).possible_moves(piece, board);
    trace!("{} has {} possible moves", piece, moves.len());
    moves
}

fn is_enemy(board: &Board, square: Square, color: Color) -> bool {
    board.piece_at(square).map_or(false, |p| p.color != color)
}

fn is_empty(board: &Board, square: Square) -> bool {
    board.piece_at(square).is_none()
}

/// Single steps: each target is kept if it is empty or holds an enemy.
fn step_targets(piece: &Piece, board: &Board, offsets: &[(i8, i8)]) -> SquareSet {
    offsets
        .iter()
        .filter_map(|&(vertical, horizontal)| piece.square.step(vertical, horizontal))
        .filter(|&target| is_empty(board, target) || is_enemy(board, target, piece.color))
        .collect()
}

/// Walks one direction until the edge, an own piece (excluded) or an enemy
/// piece (included).
pub fn ray(piece: &Piece, board: &Board, vertical: i8, horizontal: i8) -> SquareSet {
    let mut squares = SquareSet::EMPTY;
    let mut current = piece.square;
    while let Some(next) = current.step(vertical, horizontal) {
        match board.piece_at(next) {
            None => squares.insert(next),
            Some(other) => {
                if other.color != piece.color {
                    squares.insert(next);
                }
                break;
            }
        }
        current = next;
    }
    squares
}

pub fn bishop_rays(piece: &Piece, board: &Board) -> SquareSet {
    DIAGONALS
        .iter()
        .fold(SquareSet::EMPTY, |acc, &(v, h)| acc | ray(piece, board, v, h))
}

pub fn rook_rays(piece: &Piece, board: &Board) -> SquareSet {
    ORTHOGONALS
        .iter()
        .fold(SquareSet::EMPTY, |acc, &(v, h)| acc | ray(piece, board, v, h))
}

impl PawnRules {
    fn capture_squares(piece: &Piece) -> impl Iterator<Item = Square> {
        let forward = Direction::Forward.delta(piece.color);
        let square = piece.square;
        [RIGHT, -RIGHT]
            .into_iter()
            .filter_map(move |side| square.step(forward, side))
    }
}

impl MoveRules for PawnRules {
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet {
        let mut squares = SquareSet::EMPTY;
        let forward = Direction::Forward.delta(piece.color);

        if let Some(one) = piece.square.step(forward, 0).filter(|&s| is_empty(board, s)) {
            squares.insert(one);
            if !piece.has_moved {
                if let Some(two) = one.step(forward, 0).filter(|&s| is_empty(board, s)) {
                    squares.insert(two);
                }
            }
        }

        for target in Self::capture_squares(piece) {
            if is_enemy(board, target, piece.color) {
                squares.insert(target);
            }
        }
        squares
    }

    fn attacked_squares(&self, piece: &Piece, _board: &Board) -> SquareSet {
        Self::capture_squares(piece).collect()
    }
}

impl MoveRules for KnightRules {
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet {
        step_targets(piece, board, &KNIGHT_OFFSETS)
    }
}

impl MoveRules for BishopRules {
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet {
        bishop_rays(piece, board)
    }
}

impl MoveRules for RookRules {
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet {
        rook_rays(piece, board)
    }
}

impl MoveRules for QueenRules {
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet {
        bishop_rays(piece, board) | rook_rays(piece, board)
    }
}

impl KingRules {
    fn single_steps(piece: &Piece, board: &Board) -> SquareSet {
        step_targets(piece, board, &DIAGONALS) | step_targets(piece, board, &ORTHOGONALS)
    }

    /// Two-square king moves toward an unmoved rook. The king may not castle
    /// out of check or across an attacked square; landing in check is left to
    /// the move validator.
    fn castling_squares(piece: &Piece, board: &Board) -> SquareSet {
        let mut squares = SquareSet::EMPTY;
        if piece.has_moved {
            return squares;
        }
        let grant = board.castling_grant(piece.color);

        // (granted, rook distance in files, direction toward that rook)
        let sides = [(grant.kingside, 3i8, RIGHT), (grant.queenside, -4i8, -RIGHT)];
        let mut candidates = Vec::with_capacity(2);
        for (granted, rook_files, toward) in sides {
            if !granted || board.castling_rook(piece, rook_files).is_none() {
                continue;
            }
            let between = (1..rook_files.abs()).map(|n| piece.square.step(0, toward * n));
            let clear = between
                .into_iter()
                .all(|s| s.map_or(false, |s| is_empty(board, s)));
            if !clear {
                continue;
            }
            if let (Some(passed), Some(target)) = (
                piece.square.step(0, toward),
                piece.square.step(0, 2 * toward),
            ) {
                candidates.push((passed, target));
            }
        }

        if candidates.is_empty() {
            return squares;
        }
        let attacked = board.attacked_by(piece.color.opposite());
        if attacked.contains(piece.square) {
            return squares;
        }
        for (passed, target) in candidates {
            if !attacked.contains(passed) {
                squares.insert(target);
            }
        }
        squares
    }
}

impl MoveRules for KingRules {
    fn possible_moves(&self, piece: &Piece, board: &Board) -> SquareSet {
        Self::single_steps(piece, board) | Self::castling_squares(piece, board)
    }

    fn attacked_squares(&self, piece: &Piece, board: &Board) -> SquareSet {
        Self::single_steps(piece, board)
    }
}
