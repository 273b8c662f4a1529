//! Move validation and execution.

use log::trace;
use thiserror::Error;

use crate::board::Board;
use crate::movegen::possible_moves;
use crate::piece::{Color, PieceId, PieceKind, PromotionChoice};
use crate::square::{Square, SquareSet};

/// Why a move attempt was refused. None of these change the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("it is not this piece's turn")]
    WrongTurn,
    #[error("the destination holds a piece of the same color")]
    BlockedBySameColor,
    #[error("the piece cannot reach that square")]
    UnreachableSquare,
    #[error("the move would leave the king in check")]
    MoveExposesKing,
    #[error("no piece {0} is in play")]
    UnknownPiece(PieceId),
    #[error("the move needs a promotion choice")]
    PromotionRequired,
    #[error("a promotion choice is pending")]
    PromotionPending,
    #[error("no promotion is pending")]
    NoPendingPromotion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// Record of a move that was applied to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub piece: PieceId,
    pub kind: PieceKind,
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub captured: Option<PieceKind>,
    pub castling: Option<CastleSide>,
    pub promotion: Option<PieceKind>,
}

/// A single move attempt: `moving` goes to `to`, taking `occupying` if set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub to: Square,
    pub moving: PieceId,
    pub occupying: Option<PieceId>,
}

impl Move {
    pub fn new(board: &Board, moving: PieceId, to: Square) -> Self {
        Self {
            to,
            moving,
            occupying: board.piece_at(to).map(|p| p.id),
        }
    }

    /// Runs the turn, same-color, reachability and king-safety checks in
    /// that order and reports the first failure.
    pub fn validate(&self, board: &Board) -> Result<(), MoveError> {
        let piece = board
            .piece(self.moving)
            .ok_or(MoveError::UnknownPiece(self.moving))?;

        if piece.color != board.side_to_move() {
            return Err(MoveError::WrongTurn);
        }

        if let Some(occupant) = self.occupying.and_then(|id| board.piece(id)) {
            if occupant.color == piece.color {
                return Err(MoveError::BlockedBySameColor);
            }
        }

        if !possible_moves(piece, board).contains(self.to) {
            return Err(MoveError::UnreachableSquare);
        }

        if !self.keeps_king_safe(board) {
            return Err(MoveError::MoveExposesKing);
        }
        Ok(())
    }

    /// Plays the move on a copy of the board and checks the mover's king.
    pub fn keeps_king_safe(&self, board: &Board) -> bool {
        let Some(color) = board.piece(self.moving).map(|p| p.color) else {
            return false;
        };
        let mut scratch = board.clone();
        self.apply(&mut scratch, None);
        let safe = !scratch.is_in_check(color);
        trace!("{:?} keeps the {} king safe: {}", self, color, safe);
        safe
    }

    /// True when a pawn lands on its last row with this move.
    pub fn needs_promotion(&self, board: &Board) -> bool {
        board.piece(self.moving).map_or(false, |p| {
            p.kind == PieceKind::Pawn && self.to.row() == p.color.promotion_row()
        })
    }

    /// Validates and then applies the move.
    pub fn execute(
        &self,
        board: &mut Board,
        promotion: Option<PromotionChoice>,
    ) -> Result<AppliedMove, MoveError> {
        self.validate(board)?;
        if promotion.is_none() && self.needs_promotion(board) {
            return Err(MoveError::PromotionRequired);
        }
        Ok(self.apply(board, promotion))
    }

    /// Applies the move without any checks. A promoting pawn without a
    /// choice stays a pawn, which is enough for king-safety simulation.
    fn apply(&self, board: &mut Board, promotion: Option<PromotionChoice>) -> AppliedMove {
        let piece = board
            .piece(self.moving)
            .cloned()
            .expect("move applied to a piece that is not in play");
        let from = piece.square;

        let captured = self
            .occupying
            .filter(|&id| id != piece.id)
            .and_then(|id| board.remove_piece(id))
            .map(|p| p.kind);

        let mut castling = None;
        if piece.kind == PieceKind::King {
            let files = self.to.file() as i8 - from.file() as i8;
            castling = match files {
                2 => Some(CastleSide::Kingside),
                -2 => Some(CastleSide::Queenside),
                _ => None,
            };
            if let Some(side) = castling {
                Self::move_castling_rook(board, from, side);
            }
        }

        let mut promoted = None;
        let mut moved_id = piece.id;
        if let Some(choice) = promotion.filter(|_| self.needs_promotion(board)) {
            board.remove_piece(piece.id);
            moved_id = board.add_piece(choice.kind(), piece.color, from, true);
            promoted = Some(choice.kind());
        }

        if let Some(moved) = board.piece_mut(moved_id) {
            if moved.kind.is_first_move_piece() {
                moved.has_moved = true;
            }
            moved.square = self.to;
        }

        board.advance_turn();
        board.increment_halfmove();
        if piece.kind == PieceKind::Pawn || captured.is_some() {
            board.set_halfmove_clock(0);
        } else {
            board.set_halfmove_clock(board.halfmove_clock().saturating_add(1));
        }
        board.set_en_passant(None);
        board.rebuild_piece_index();

        AppliedMove {
            piece: piece.id,
            kind: piece.kind,
            color: piece.color,
            from,
            to: self.to,
            captured,
            castling,
            promotion: promoted,
        }
    }

    /// The rook 3 files right (kingside) or 4 files left (queenside) of the
    /// king lands next to the king's new square, on the side it came from.
    fn move_castling_rook(board: &mut Board, king_from: Square, side: CastleSide) {
        let (rook_files, landing_files) = match side {
            CastleSide::Kingside => (3, 1),
            CastleSide::Queenside => (-4, -1),
        };
        let rook = king_from
            .step(0, rook_files)
            .and_then(|square| board.piece_at(square))
            .map(|p| p.id);
        let landing = king_from.step(0, landing_files);
        if let (Some(rook), Some(landing)) = (rook, landing) {
            if let Some(rook) = board.piece_mut(rook) {
                rook.square = landing;
                rook.has_moved = true;
            }
        }
    }
}

/// Destinations of `piece` that pass every check except whose turn it is.
pub fn legal_destinations(board: &Board, piece: PieceId) -> SquareSet {
    let Some(p) = board.piece(piece) else {
        return SquareSet::EMPTY;
    };
    possible_moves(p, board)
        .into_iter()
        .filter(|&to| Move::new(board, piece, to).keeps_king_safe(board))
        .collect()
}

pub fn has_legal_move(board: &Board, color: Color) -> bool {
    board
        .pieces()
        .iter()
        .filter(|p| p.color == color)
        .any(|p| !legal_destinations(board, p.id).is_empty())
}
