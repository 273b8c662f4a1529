use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use chess_rules::fen;
use chess_rules::{Game, GameStatus, MoveOutcome, PieceId, PromotionChoice, Square};

const GAMES: u64 = 12;
const MAX_PLIES: usize = 160;

fn candidate_moves(game: &Game) -> Vec<(PieceId, Square)> {
    let side = game.side_to_move();
    game.board()
        .pieces()
        .iter()
        .filter(|p| p.color == side)
        .flat_map(|p| {
            game.legal_destinations(p.id)
                .into_iter()
                .map(move |to| (p.id, to))
        })
        .collect()
}

fn assert_capture_exclusivity(game: &Game) {
    for piece in game.board().pieces() {
        for to in game.legal_destinations(piece.id) {
            if let Some(occupant) = game.piece_at(to) {
                assert_ne!(
                    occupant.color, piece.color,
                    "{} may move onto its own {}",
                    piece, occupant
                );
            }
        }
    }
}

fn assert_round_trip(game: &Game) {
    let exported = game.export_position();
    let reloaded = Game::from_fen(&exported).unwrap();
    assert_eq!(reloaded.export_position(), exported);
}

#[test]
fn random_games_respect_the_rules() {
    for seed in 0..GAMES {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new();

        for _ in 0..MAX_PLIES {
            assert_capture_exclusivity(&game);
            assert_round_trip(&game);

            let moves = candidate_moves(&game);
            if moves.is_empty() {
                assert!(matches!(
                    game.status(),
                    GameStatus::Checkmate { .. } | GameStatus::Stalemate
                ));
                break;
            }

            let side = game.side_to_move();
            let &(piece, to) = moves.choose(&mut rng).unwrap();
            let outcome = match game.attempt_move(piece, to) {
                Ok(MoveOutcome::PromotionPending(_)) => {
                    let choice = *PromotionChoice::ALL.choose(&mut rng).unwrap();
                    game.choose_promotion(choice)
                }
                other => other,
            };
            assert!(
                outcome.is_ok(),
                "seed {}: legal move {} -> {} was refused: {:?}",
                seed,
                piece,
                to,
                outcome
            );
            assert_eq!(game.side_to_move(), side.opposite());
            assert!(!game.king_in_check(side), "seed {}: mover left in check", seed);
        }
    }
}

#[test]
fn random_illegal_attempts_change_nothing() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut game = Game::new();

    for _ in 0..60 {
        let before = game.export_position();
        let side = game.side_to_move();
        let pieces: Vec<PieceId> = game.board().pieces().iter().map(|p| p.id).collect();
        let piece = *pieces.choose(&mut rng).unwrap();
        let target = Square::new(rng.gen_range(0..64)).unwrap();

        let legal = game.board().piece(piece).map_or(false, |p| p.color == side)
            && game.legal_destinations(piece).contains(target);
        if legal {
            continue;
        }
        assert!(game.attempt_move(piece, target).is_err());
        assert_eq!(game.export_position(), before);
        assert_eq!(game.side_to_move(), side);

        // Keep the position moving so later attempts see other boards.
        let moves = candidate_moves(&game);
        let Some(&(piece, to)) = moves.choose(&mut rng) else {
            break;
        };
        if let Ok(MoveOutcome::PromotionPending(_)) = game.attempt_move(piece, to) {
            game.choose_promotion(PromotionChoice::Queen).unwrap();
        }
    }
}

#[test]
fn perft_style_counts_from_the_start() {
    fn count(game: &Game, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut nodes = 0;
        for (piece, to) in candidate_moves(game) {
            let mut next = Game::from_fen(&game.export_position()).unwrap();
            let moved = next.board().piece(piece).map(|p| p.square);
            let piece = moved
                .and_then(|square| next.piece_at(square))
                .map(|p| p.id)
                .unwrap();
            if let Ok(MoveOutcome::PromotionPending(_)) = next.attempt_move(piece, to) {
                next.choose_promotion(PromotionChoice::Queen).unwrap();
            }
            nodes += count(&next, depth - 1);
        }
        nodes
    }

    let game = Game::from_fen(fen::STARTING_FEN).unwrap();
    assert_eq!(count(&game, 1), 20);
    assert_eq!(count(&game, 2), 400);
    assert_eq!(count(&game, 3), 8902);
}
