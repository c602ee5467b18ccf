//! Persisted position layout.
//!
//! Only occupancy, per-piece flags and the en passant markers are stored;
//! the connectivity graph is rebuilt by replaying placements on load.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::SnapshotError;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub square: Square,
    pub color: Color,
    pub piece_type: PieceType,
    pub moved: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnPassantMarkers {
    pub white: Option<Square>,
    pub black: Option<Square>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pieces: Vec<PlacedPiece>,
    pub en_passant: EnPassantMarkers,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Snapshot, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Board {
    pub fn snapshot(&self) -> Snapshot {
        let pieces = self
            .grid
            .cells()
            .filter_map(|cell| {
                cell.piece().map(|piece| PlacedPiece {
                    square: cell.square(),
                    color: piece.color,
                    piece_type: piece.piece_type(),
                    moved: piece.moved,
                })
            })
            .collect();
        Snapshot {
            pieces,
            en_passant: EnPassantMarkers {
                white: self.en_passant_target(Color::White),
                black: self.en_passant_target(Color::Black),
            },
        }
    }

    /// Rebuilds a board by placing every stored piece in turn.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Board, SnapshotError> {
        let mut seen = BTreeSet::new();
        if let Some(dup) = snapshot.pieces.iter().find(|p| !seen.insert(p.square)) {
            return Err(SnapshotError::DuplicateSquare(dup.square));
        }
        for color in [Color::White, Color::Black] {
            let count = snapshot
                .pieces
                .iter()
                .filter(|p| p.color == color && p.piece_type == PieceType::King)
                .count();
            if count > 1 {
                return Err(SnapshotError::KingCount { color, count });
            }
        }
        let markers = [
            (Color::White, snapshot.en_passant.white),
            (Color::Black, snapshot.en_passant.black),
        ];
        for (color, marker) in markers {
            let Some(at) = marker else { continue };
            let holds_pawn = snapshot
                .pieces
                .iter()
                .any(|p| p.square == at && p.color == color && p.piece_type == PieceType::Pawn);
            if !holds_pawn {
                return Err(SnapshotError::BadEnPassant(at));
            }
        }

        let mut board = Board::empty();
        for placed in &snapshot.pieces {
            let mut piece = Piece::new(placed.piece_type, placed.color);
            piece.moved = placed.moved;
            board.put(piece, placed.square);
        }
        for (color, marker) in markers {
            board.en_passant[color.index()] = marker;
        }
        board.refresh_checks();
        Ok(board)
    }
}
