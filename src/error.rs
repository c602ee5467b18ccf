use thiserror::Error;

use crate::moves::{Destination, PieceKey};
use crate::piece::{Color, PieceType};
use crate::square::Square;

/// Malformed square, piece identifier or destination text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid square `{0}` (expected a1..h8)")]
    Square(String),
    #[error("invalid piece key `{0}` (expected e.g. `k-e4`)")]
    PieceKey(String),
    #[error("invalid destination `{0}`")]
    Destination(String),
    #[error("invalid piece letter `{0}`")]
    Role(char),
}

/// A command that does not correspond to the current board state.
///
/// Returned before anything is mutated; the board is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("no piece on {0}")]
    NoPiece(Square),
    #[error("{key} does not match the piece on {}", key.square)]
    WrongPiece { key: PieceKey },
    #[error("not a legal move: {key} to {destination}")]
    Illegal {
        key: PieceKey,
        destination: Destination,
    },
    #[error("promotion to {destination} needs a piece choice")]
    MissingPromotion { destination: Destination },
    #[error("cannot promote to {0:?}")]
    InvalidPromotion(PieceType),
}

/// A persisted position that cannot be replayed onto a board.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("square {0} is listed more than once")]
    DuplicateSquare(Square),
    #[error("expected at most one {color} king, found {count}")]
    KingCount { color: Color, count: usize },
    #[error("en passant marker {0} does not hold a pawn")]
    BadEnPassant(Square),
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
