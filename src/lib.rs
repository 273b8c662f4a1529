//! A chess rules engine: move generation, move validation, turn handling
//! and FEN import/export, with a [`game::Game`] facade for front ends.

pub mod board;
pub mod config;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod piece;
pub mod protocol;
pub mod square;

pub use board::Board;
pub use game::{Game, GameStatus, MoveOutcome, MoveResult};
pub use moves::MoveError;
pub use piece::{Color, PieceId, PieceKind, PromotionChoice, PromotionError};
pub use square::{Square, SquareSet};

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn id_at(game: &Game, s: &str) -> PieceId {
        game.piece_at(sq(s)).unwrap().id
    }

    #[test]
    fn test_starting_position_round_trip() {
        let game = Game::from_fen(fen::STARTING_FEN).unwrap();
        assert_eq!(game.export_position(), fen::STARTING_FEN);
    }

    #[test]
    fn test_initial_position_has_twenty_moves() {
        let game = Game::new();
        let total: usize = game
            .board()
            .pieces()
            .iter()
            .filter(|p| p.color == Color::Light)
            .map(|p| game.legal_destinations(p.id).len())
            .sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_pawn_double_push() {
        let mut game = Game::new();
        let pawn = id_at(&game, "e2");
        assert!(game.legal_destinations(pawn).contains(sq("e4")));

        let outcome = game.attempt_move(pawn, sq("e4")).unwrap();
        assert!(matches!(outcome, MoveOutcome::Applied(_)));
        assert!(game.piece_at(sq("e2")).is_none());

        let moved = game.piece_at(sq("e4")).unwrap();
        assert_eq!(moved.id, pawn);
        assert_eq!((moved.kind, moved.color), (PieceKind::Pawn, Color::Light));
        assert!(moved.has_moved);
        assert_eq!(game.side_to_move(), Color::Dark);
    }

    #[test]
    fn test_kingside_castling() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let king = id_at(&game, "e1");
        assert!(game.legal_destinations(king).contains(sq("g1")));

        game.attempt_move(king, sq("g1")).unwrap();
        assert_eq!(game.piece_at(sq("g1")).map(|p| p.kind), Some(PieceKind::King));
        assert_eq!(game.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert!(game.piece_at(sq("h1")).is_none());
        assert!(game.piece_at(sq("e1")).is_none());
        assert_eq!(game.export_position(), "4k3/8/8/8/8/8/8/5RK1 b - - 1 1");
    }

    #[test]
    fn test_promotion_waits_for_a_choice() {
        let fen = "7k/P7/8/8/8/8/8/4K3 w - - 0 1";
        let mut game = Game::from_fen(fen).unwrap();
        let pawn = id_at(&game, "a7");

        let outcome = game.attempt_move(pawn, sq("a8")).unwrap();
        match outcome {
            MoveOutcome::PromotionPending(pending) => {
                assert_eq!(pending.from, sq("a7"));
                assert_eq!(pending.to, sq("a8"));
            }
            other => panic!("expected a pending promotion, got {:?}", other),
        }
        assert_eq!(game.export_position(), fen);
        assert_eq!(game.side_to_move(), Color::Light);

        game.choose_promotion(PromotionChoice::Queen).unwrap();
        let queen = game.piece_at(sq("a8")).unwrap();
        assert_eq!((queen.kind, queen.color), (PieceKind::Queen, Color::Light));
        assert!(game.piece_at(sq("a7")).is_none());
        assert_eq!(game.side_to_move(), Color::Dark);
        assert!(game.king_in_check(Color::Dark));
    }

    #[test]
    fn test_dark_promotes_on_rank_one() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/7p/K7 b - - 0 1").unwrap();
        let pawn = id_at(&game, "h2");
        let outcome = game.attempt_move(pawn, sq("h1")).unwrap();
        assert!(matches!(outcome, MoveOutcome::PromotionPending(_)));
        game.choose_promotion(PromotionChoice::Knight).unwrap();
        assert_eq!(game.export_position(), "4k3/8/8/8/8/8/8/K6n w - - 0 2");
    }

    #[test]
    fn test_wrong_turn() {
        let mut game = Game::new();
        let before = game.export_position();
        let pawn = id_at(&game, "e7");
        assert_eq!(game.attempt_move(pawn, sq("e5")), Err(MoveError::WrongTurn));
        assert_eq!(game.export_position(), before);
        assert_eq!(game.side_to_move(), Color::Light);
    }

    #[test]
    fn test_move_validation() {
        // The knight on d2 shields the king from the bishop on b4.
        let mut game = Game::from_fen("4k3/8/8/8/1b6/8/3N4/4K3 w - - 0 1").unwrap();
        let knight = id_at(&game, "d2");
        assert_eq!(
            game.attempt_move(knight, sq("f3")),
            Err(MoveError::MoveExposesKing)
        );
        assert!(game.legal_destinations(knight).is_empty());
    }

    #[test]
    fn test_check() {
        let game = Game::from_fen("4k3/8/8/8/8/8/8/2Q1K3 b - - 0 1").unwrap();
        assert!(!game.king_in_check(Color::Dark));
        let game = Game::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert!(!game.king_in_check(Color::Dark));
        let game = Game::from_fen("4k3/8/8/8/Q7/8/8/4K3 b - - 0 1").unwrap();
        assert!(game.king_in_check(Color::Dark));
    }

    #[test]
    fn test_checkmate() {
        let game = Game::from_fen("k7/1Q6/2K5/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(game.king_in_check(Color::Dark));
        assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::Light });
    }

    #[test]
    fn test_stalemate() {
        let game = Game::from_fen("8/8/8/8/8/1q6/2k5/K7 w - - 0 1").unwrap();
        assert!(!game.king_in_check(Color::Light));
        assert_eq!(game.status(), GameStatus::Stalemate);
    }

    #[test]
    fn test_castling_rights_lost_after_rook_moves() {
        let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let rook = id_at(&game, "h1");
        game.attempt_move(rook, sq("h2")).unwrap();
        let rook = id_at(&game, "a8");
        game.attempt_move(rook, sq("a7")).unwrap();
        assert_eq!(
            game.export_position(),
            "4k2r/r7/8/8/8/8/7R/R3K3 w Qk - 2 2"
        );
        let rook = id_at(&game, "h2");
        game.attempt_move(rook, sq("h1")).unwrap();
        assert!(game.export_position().contains(" b Qk "));
        let king = id_at(&game, "e8");
        assert!(!game.legal_destinations(king).contains(sq("c8")));
    }
}
