use std::collections::HashMap;
use std::fmt;

use crate::fen;
use crate::movegen::rules_for;
use crate::piece::{Color, Piece, PieceId, PieceKind};
use crate::square::{Square, SquareSet};

/// Castling sides granted to one king by the position it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

#[derive(Debug, Clone)]
pub struct Board {
    squares: Vec<Square>,
    pieces: Vec<Piece>,
    piece_index: HashMap<Square, PieceId>,
    move_turn: Color,
    ply: u32,
    halfmove_clock: u32,
    castling: [CastlingRights; 2],
    en_passant: Option<Square>,
    kings: [Option<PieceId>; 2],
    next_id: u32,
}

fn slot(color: Color) -> usize {
    match color {
        Color::Light => 0,
        Color::Dark => 1,
    }
}

impl Board {
    /// The standard starting position.
    pub fn new() -> Self {
        fen::parse(fen::STARTING_FEN).expect("starting position is valid FEN")
    }

    /// A board with 64 squares and nothing on them. Not a playable position
    /// until both kings have been added.
    pub(crate) fn empty() -> Self {
        Self {
            squares: Square::all().collect(),
            pieces: Vec::with_capacity(32),
            piece_index: HashMap::with_capacity(32),
            move_turn: Color::Light,
            ply: 0,
            halfmove_clock: 0,
            castling: [CastlingRights::default(); 2],
            en_passant: None,
            kings: [None, None],
            next_id: 0,
        }
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.piece_index.get(&square).and_then(|&id| self.piece(id))
    }

    pub fn pieces_matching(&self, kind: PieceKind, color: Color) -> Vec<&Piece> {
        self.pieces
            .iter()
            .filter(|p| p.kind == kind && p.color == color)
            .collect()
    }

    /// Every playable board holds exactly one king per color.
    pub fn king(&self, color: Color) -> &Piece {
        self.kings[slot(color)]
            .and_then(|id| self.piece(id))
            .expect("board invariant: one live king per color")
    }

    pub fn side_to_move(&self) -> Color {
        self.move_turn
    }

    /// Number of half-moves played since the start of the game.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn fullmove_number(&self) -> u32 {
        self.ply / 2 + 1
    }

    /// Half-moves since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn castling_grant(&self, color: Color) -> CastlingRights {
        self.castling[slot(color)]
    }

    /// Castling rights that are still usable: the king and the relevant rook
    /// are unmoved and in place.
    pub fn castling_rights(&self, color: Color) -> CastlingRights {
        let grant = self.castling_grant(color);
        let king = self.king(color);
        if king.has_moved {
            return CastlingRights::default();
        }
        CastlingRights {
            kingside: grant.kingside && self.castling_rook(king, 3).is_some(),
            queenside: grant.queenside && self.castling_rook(king, -4).is_some(),
        }
    }

    /// The unmoved rook of the king's color exactly `files` files away.
    pub(crate) fn castling_rook(&self, king: &Piece, files: i8) -> Option<&Piece> {
        let square = king.square.step(0, files)?;
        self.piece_at(square).filter(|p| {
            p.kind == PieceKind::Rook && p.color == king.color && !p.has_moved
        })
    }

    /// Union of the squares attacked by all pieces of `color`.
    pub fn attacked_by(&self, color: Color) -> SquareSet {
        self.pieces
            .iter()
            .filter(|p| p.color == color)
            .fold(SquareSet::EMPTY, |acc, p| {
                acc | rules_for(p.kind).attacked_squares(p, self)
            })
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        self.attacked_by(color.opposite())
            .contains(self.king(color).square)
    }

    pub fn rebuild_piece_index(&mut self) {
        self.piece_index.clear();
        for piece in &self.pieces {
            let previous = self.piece_index.insert(piece.square, piece.id);
            debug_assert!(
                previous.is_none(),
                "board invariant: two pieces on {}",
                piece.square
            );
        }
    }

    pub fn advance_turn(&mut self) {
        self.move_turn = self.move_turn.opposite();
    }

    pub fn increment_halfmove(&mut self) {
        self.ply = self.ply.saturating_add(1);
    }

    pub(crate) fn add_piece(
        &mut self,
        kind: PieceKind,
        color: Color,
        square: Square,
        has_moved: bool,
    ) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        if kind == PieceKind::King {
            self.kings[slot(color)] = Some(id);
        }
        self.pieces.push(Piece {
            id,
            kind,
            color,
            square,
            has_moved,
        });
        id
    }

    pub(crate) fn remove_piece(&mut self, id: PieceId) -> Option<Piece> {
        let position = self.pieces.iter().position(|p| p.id == id)?;
        Some(self.pieces.remove(position))
    }

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        self.move_turn = color;
    }

    pub(crate) fn set_ply(&mut self, ply: u32) {
        self.ply = ply;
    }

    pub(crate) fn set_halfmove_clock(&mut self, clock: u32) {
        self.halfmove_clock = clock;
    }

    pub(crate) fn set_castling_grant(&mut self, color: Color, rights: CastlingRights) {
        self.castling[slot(color)] = rights;
    }

    pub(crate) fn set_en_passant(&mut self, square: Option<Square>) {
        self.en_passant = square;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.squares.chunks(8) {
            let (_, rank) = row[0].coordinates();
            write!(f, "{} ", rank)?;
            for (file, &square) in row.iter().enumerate() {
                let symbol = self.piece_at(square).map_or('.', Piece::fen_letter);
                write!(f, "{}", symbol)?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}
