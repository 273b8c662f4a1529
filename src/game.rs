//! The engine boundary used by front ends.
//!
//! A [`Game`] owns one [`Board`] and turns front-end intents ("move this
//! piece there", "load this FEN") into validated board changes. Promotion
//! is a two-step exchange: [`Game::attempt_move`] reports
//! [`MoveOutcome::PromotionPending`] and the board stays as it was until
//! [`Game::choose_promotion`] or [`Game::abort_promotion`] is called.

use std::fmt;

use log::{debug, info};

use crate::board::Board;
use crate::fen::{self, FenError};
use crate::moves::{self, AppliedMove, Move, MoveError};
use crate::piece::{Color, Piece, PieceId, PieceKind, PromotionChoice};
use crate::square::{Square, SquareSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied(AppliedMove),
    PromotionPending(PendingPromotion),
}

pub type MoveResult = Result<MoveOutcome, MoveError>;

/// A validated pawn move waiting for the piece it promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    PositionLoaded { fen: String },
    MoveApplied(AppliedMove),
    MoveRejected { piece: PieceId, to: Square, reason: MoveError },
    PromotionPending(PendingPromotion),
    PromotionAborted(PendingPromotion),
}

type Listener = Box<dyn FnMut(&GameEvent)>;

pub struct Game {
    board: Board,
    pending: Option<PendingPromotion>,
    listeners: Vec<Listener>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_board(Board::new())
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        fen::parse(fen).map(Self::with_board)
    }

    fn with_board(board: Board) -> Self {
        Self {
            board,
            pending: None,
            listeners: Vec::new(),
        }
    }

    /// Registers a callback that sees every event from now on.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: GameEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Replaces the position. On error the current game is kept as it was.
    pub fn load_position(&mut self, fen: &str) -> Result<(), FenError> {
        let board = fen::parse(fen)?;
        info!("loaded position {}", fen);
        self.board = board;
        self.pending = None;
        let fen = self.export_position();
        self.emit(GameEvent::PositionLoaded { fen });
        Ok(())
    }

    pub fn export_position(&self) -> String {
        fen::serialize(&self.board)
    }

    pub fn attempt_move(&mut self, piece: PieceId, to: Square) -> MoveResult {
        if self.pending.is_some() {
            return Err(MoveError::PromotionPending);
        }
        let mv = Move::new(&self.board, piece, to);
        if let Err(reason) = mv.validate(&self.board) {
            return Err(self.reject(piece, to, reason));
        }

        if mv.needs_promotion(&self.board) {
            let pending = PendingPromotion {
                piece,
                from: self.board.piece(piece).map_or(to, |p| p.square),
                to,
            };
            debug!("promotion pending for {} on {}", piece, to);
            self.pending = Some(pending);
            self.emit(GameEvent::PromotionPending(pending));
            return Ok(MoveOutcome::PromotionPending(pending));
        }

        self.finish(mv, None)
    }

    pub fn choose_promotion(&mut self, choice: PromotionChoice) -> MoveResult {
        let pending = self.pending.take().ok_or(MoveError::NoPendingPromotion)?;
        let mv = Move::new(&self.board, pending.piece, pending.to);
        self.finish(mv, Some(choice))
    }

    /// Drops a pending promotion. Returns false if none was pending.
    pub fn abort_promotion(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                debug!("promotion on {} aborted", pending.to);
                self.emit(GameEvent::PromotionAborted(pending));
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, mv: Move, promotion: Option<PromotionChoice>) -> MoveResult {
        match mv.execute(&mut self.board, promotion) {
            Ok(applied) => {
                debug!("{} {} -> {}", applied.kind, applied.from, applied.to);
                self.emit(GameEvent::MoveApplied(applied.clone()));
                Ok(MoveOutcome::Applied(applied))
            }
            Err(reason) => Err(self.reject(mv.moving, mv.to, reason)),
        }
    }

    fn reject(&mut self, piece: PieceId, to: Square, reason: MoveError) -> MoveError {
        debug!("rejected {} -> {}: {}", piece, to, reason);
        self.emit(GameEvent::MoveRejected { piece, to, reason });
        reason
    }

    /// Squares `piece` can move to without leaving its king in check.
    pub fn legal_destinations(&self, piece: PieceId) -> SquareSet {
        moves::legal_destinations(&self.board, piece)
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.board.piece_at(square)
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn king_in_check(&self, color: Color) -> bool {
        self.board.is_in_check(color)
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        let side = self.side_to_move();
        if !moves::has_legal_move(&self.board, side) {
            return if self.king_in_check(side) {
                GameStatus::Checkmate {
                    winner: side.opposite(),
                }
            } else {
                GameStatus::Stalemate
            };
        }
        if self.board.halfmove_clock() >= 100 {
            return GameStatus::FiftyMoveRule;
        }
        if self.is_insufficient_material() {
            return GameStatus::InsufficientMaterial;
        }
        GameStatus::Ongoing
    }

    /// Bare kings, kings plus a single knight, or kings plus bishops that
    /// all stand on squares of one color.
    fn is_insufficient_material(&self) -> bool {
        let others: Vec<&Piece> = self
            .board
            .pieces()
            .iter()
            .filter(|p| p.kind != PieceKind::King)
            .collect();
        match others.as_slice() {
            [] => true,
            [only] if only.kind == PieceKind::Knight => true,
            [first, ..] => others.iter().all(|p| {
                p.kind == PieceKind::Bishop && p.square.color() == first.square.color()
            }),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Game")
            .field("board", &self.board)
            .field("pending", &self.pending)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn id_at(game: &Game, s: &str) -> PieceId {
        game.piece_at(sq(s)).unwrap().id
    }

    #[test]
    fn failed_load_keeps_the_old_position() {
        let mut game = Game::new();
        game.attempt_move(id_at(&game, "e2"), sq("e4")).unwrap();
        let before = game.export_position();
        assert!(game.load_position("not/a/fen w").is_err());
        assert_eq!(game.export_position(), before);
    }

    #[test]
    fn pending_promotion_blocks_other_moves() {
        let mut game = Game::from_fen("7k/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let pawn = id_at(&game, "a7");
        let outcome = game.attempt_move(pawn, sq("a8")).unwrap();
        assert!(matches!(outcome, MoveOutcome::PromotionPending(_)));
        assert_eq!(
            game.attempt_move(id_at(&game, "e1"), sq("e2")),
            Err(MoveError::PromotionPending)
        );

        assert!(game.abort_promotion());
        assert!(!game.abort_promotion());
        assert_eq!(game.export_position(), "7k/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            game.choose_promotion(PromotionChoice::Queen),
            Err(MoveError::NoPendingPromotion)
        );
    }

    #[test]
    fn loading_clears_a_pending_promotion() {
        let mut game = Game::from_fen("7k/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        game.attempt_move(id_at(&game, "a7"), sq("a8")).unwrap();
        game.load_position(fen::STARTING_FEN).unwrap();
        assert!(game.pending_promotion().is_none());
    }

    #[test]
    fn listeners_hear_moves_and_rejections() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut game = Game::new();
        game.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let knight = id_at(&game, "g1");
        let _ = game.attempt_move(knight, sq("g3"));
        game.attempt_move(knight, sq("f3")).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            GameEvent::MoveRejected { reason: MoveError::UnreachableSquare, .. }
        ));
        assert!(matches!(&events[1], GameEvent::MoveApplied(applied) if applied.to == sq("f3")));
    }

    #[test]
    fn status_reports_mate_and_stalemate() {
        let mut game = Game::new();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            game.attempt_move(id_at(&game, from), sq(to)).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::Dark });

        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Stalemate);
    }

    #[test]
    fn status_reports_draws() {
        let game = Game::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::InsufficientMaterial);

        // Bishops on b8 and c1 both stand on dark squares.
        let game = Game::from_fen("1b2k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::InsufficientMaterial);
        let game = Game::from_fen("2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Ongoing);
        let game = Game::from_fen("1n2k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Ongoing);

        let game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        assert_eq!(game.status(), GameStatus::FiftyMoveRule);

        assert_eq!(Game::new().status(), GameStatus::Ongoing);
    }
}
