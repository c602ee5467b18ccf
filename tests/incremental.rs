//! Random games: after every ply the incrementally maintained graph must
//! match one rebuilt from scratch out of the same position.

use cellchess::board::{Board, Outcome};
use cellchess::moves::{Destination, Move};
use cellchess::piece::{Color, PieceType};
use cellchess::snapshot::Snapshot;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const PROMOTIONS: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

fn random_move(board: &Board, turn: Color, rng: &mut StdRng) -> Option<Move> {
    let candidates: Vec<Move> = board
        .valid_moves(turn)
        .into_iter()
        .flat_map(|(key, destinations)| destinations.into_iter().map(move |d| Move::new(key, d)))
        .collect();
    let mv = candidates.choose(rng)?.clone();
    Some(match mv.destination {
        Destination::Promote(_) => {
            let into = *PROMOTIONS.choose(rng)?;
            mv.promoting(into)
        }
        _ => mv,
    })
}

fn assert_matches_rebuild(board: &Board, context: &str) {
    assert!(board.grid().is_consistent(), "{context}: inconsistent graph");

    let rebuilt = Board::from_snapshot(&board.snapshot())
        .unwrap_or_else(|e| panic!("{context}: snapshot rejected: {e}"));

    for (live, fresh) in board.grid().cells().zip(rebuilt.grid().cells()) {
        let at = live.square();
        assert_eq!(live.piece(), fresh.piece(), "{context}: piece on {at}");
        assert_eq!(live.paths(), fresh.paths(), "{context}: paths from {at}");
        assert_eq!(live.referrers(), fresh.referrers(), "{context}: referrers of {at}");
    }
    for color in [Color::White, Color::Black] {
        let mut live = board.pieces(color).clone();
        let mut fresh = rebuilt.pieces(color).clone();
        live.values_mut().for_each(|squares| squares.sort());
        fresh.values_mut().for_each(|squares| squares.sort());
        assert_eq!(live, fresh, "{context}: {color} registry");
        assert_eq!(
            board.valid_moves(color),
            rebuilt.valid_moves(color),
            "{context}: {color} moves"
        );
    }
}

fn play_random_game(seed: u64, max_plies: u32) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut board = Board::new();
    let mut turn = Color::White;

    for ply in 0..max_plies {
        if board.outcome(turn) != Outcome::Ongoing {
            break;
        }
        let Some(mv) = random_move(&board, turn, &mut rng) else {
            break;
        };
        board
            .apply(&mv)
            .unwrap_or_else(|e| panic!("seed {seed} ply {ply}: {mv} rejected: {e}"));

        let context = format!("seed {seed} ply {ply} after {mv}");
        assert_matches_rebuild(&board, &context);
        // The side that just moved can never be left in check.
        let mover = board.king(turn).map(|state| state.check);
        assert_ne!(mover, Some(true), "{context}: {turn} left in check");
        turn = turn.opposite();
    }
}

#[test]
fn random_games_keep_graph_in_sync() {
    for seed in 0..24 {
        play_random_game(seed, 160);
    }
}

#[test]
fn long_random_game_reaches_endgame_in_sync() {
    play_random_game(0xC0FFEE, 400);
}

#[test]
fn snapshot_json_survives_a_midgame_position() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut board = Board::new();
    let mut turn = Color::White;
    for _ in 0..30 {
        let Some(mv) = random_move(&board, turn, &mut rng) else {
            break;
        };
        board.apply(&mv).unwrap();
        turn = turn.opposite();
    }

    let json = board.snapshot().to_json().unwrap();
    let restored = Board::from_snapshot(&Snapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.snapshot(), board.snapshot());
    assert_matches_rebuild(&restored, "restored");
}
