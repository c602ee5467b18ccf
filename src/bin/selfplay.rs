use cellchess::board::{Board, Outcome};
use cellchess::moves::{Destination, Move};
use cellchess::piece::{Color, PieceType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const PROMOTIONS: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

/// Plays random legal moves: `selfplay [seed] [max_plies]`.
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(7);
    let max_plies: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(300);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut board = Board::new();
    let mut turn = Color::White;
    let mut plies = 0;

    while plies < max_plies && board.outcome(turn) == Outcome::Ongoing {
        let candidates: Vec<Move> = board
            .valid_moves(turn)
            .into_iter()
            .flat_map(|(key, destinations)| {
                destinations.into_iter().map(move |d| Move::new(key, d))
            })
            .collect();
        let Some(mv) = candidates.choose(&mut rng) else {
            break;
        };
        let mv = match mv.destination {
            Destination::Promote(_) => {
                let into = PROMOTIONS.choose(&mut rng).copied().unwrap_or(PieceType::Queen);
                mv.clone().promoting(into)
            }
            _ => mv.clone(),
        };

        if let Err(e) = board.apply(&mv) {
            eprintln!("engine rejected its own move {mv}: {e}");
            std::process::exit(1);
        }
        log::info!("{plies:>3} {turn}: {mv}");
        turn = turn.opposite();
        plies += 1;
    }

    let result = match board.outcome(turn) {
        Outcome::Checkmate => format!("{} wins", turn.opposite()),
        Outcome::Stalemate => "stalemate".to_string(),
        Outcome::Ongoing => "ongoing".to_string(),
    };
    eprintln!("Seed {seed}: game over after {plies} plies: {result}");
}
