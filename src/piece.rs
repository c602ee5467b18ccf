use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{ray, Axis, DIAGONAL_STEPS, ORTHOGONAL_STEPS};
use crate::square::Square;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank direction pawns of this color advance in.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The rank a pawn of this color promotes on.
    pub fn last_rank(self) -> i8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Piece type, also the key of a color's piece registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    /// Sliding pieces have paths that other pieces can cut short.
    pub fn is_sliding(self) -> bool {
        matches!(self, PieceType::Queen | PieceType::Rook | PieceType::Bishop)
    }

    /// Whether a sliding piece of this type moves along `axis`.
    pub fn moves_along(self, axis: Axis) -> bool {
        match axis {
            Axis::Orthogonal => matches!(self, PieceType::Queen | PieceType::Rook),
            Axis::Diagonal => matches!(self, PieceType::Queen | PieceType::Bishop),
        }
    }

    pub fn key(self) -> char {
        match self {
            PieceType::King => 'k',
            PieceType::Queen => 'q',
            PieceType::Rook => 'r',
            PieceType::Bishop => 'b',
            PieceType::Knight => 'n',
            PieceType::Pawn => 'p',
        }
    }

    pub fn from_key(key: char) -> Option<PieceType> {
        match key.to_ascii_lowercase() {
            'k' => Some(PieceType::King),
            'q' => Some(PieceType::Queen),
            'r' => Some(PieceType::Rook),
            'b' => Some(PieceType::Bishop),
            'n' => Some(PieceType::Knight),
            'p' => Some(PieceType::Pawn),
            _ => None,
        }
    }

    /// Types a pawn may promote to.
    pub fn is_promotion_choice(self) -> bool {
        matches!(
            self,
            PieceType::Queen | PieceType::Rook | PieceType::Bishop | PieceType::Knight
        )
    }
}

/// Check bookkeeping carried only by kings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckState {
    pub check: bool,
    /// Number of enemy pieces giving check at once.
    pub check_count: usize,
    /// Squares a non-king move must land on to end a single check,
    /// nearest to the king first.
    pub check_removers: Vec<Square>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    King(CheckState),
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: Kind,
    /// Cleared for pieces that have not moved yet (castling, pawn double step).
    pub moved: bool,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        let kind = match piece_type {
            PieceType::King => Kind::King(CheckState::default()),
            PieceType::Queen => Kind::Queen,
            PieceType::Rook => Kind::Rook,
            PieceType::Bishop => Kind::Bishop,
            PieceType::Knight => Kind::Knight,
            PieceType::Pawn => Kind::Pawn,
        };
        Piece {
            color,
            kind,
            moved: false,
        }
    }

    pub fn piece_type(&self) -> PieceType {
        match self.kind {
            Kind::King(_) => PieceType::King,
            Kind::Queen => PieceType::Queen,
            Kind::Rook => PieceType::Rook,
            Kind::Bishop => PieceType::Bishop,
            Kind::Knight => PieceType::Knight,
            Kind::Pawn => PieceType::Pawn,
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.piece_type().is_sliding()
    }

    pub fn check_state(&self) -> Option<&CheckState> {
        match &self.kind {
            Kind::King(state) => Some(state),
            _ => None,
        }
    }

    pub fn check_state_mut(&mut self) -> Option<&mut CheckState> {
        match &mut self.kind {
            Kind::King(state) => Some(state),
            _ => None,
        }
    }

    /// Movement pattern from `at` ignoring every other piece: one direction
    /// per axis or offset, nearest square first, off-board squares dropped.
    pub fn scope(&self, at: Square) -> Vec<Direction> {
        match self.kind {
            Kind::Rook => rays(at, &ORTHOGONAL_STEPS),
            Kind::Bishop => rays(at, &DIAGONAL_STEPS),
            Kind::Queen => {
                let mut directions = rays(at, &ORTHOGONAL_STEPS);
                directions.extend(rays(at, &DIAGONAL_STEPS));
                directions
            }
            Kind::Knight => leaps(at, &KNIGHT_OFFSETS),
            Kind::King(_) => leaps(at, &KING_OFFSETS),
            Kind::Pawn => self.pawn_scope(at),
        }
    }

    fn pawn_scope(&self, at: Square) -> Vec<Direction> {
        let fwd = self.color.forward();
        let mut directions = Vec::with_capacity(3);

        if let Some(right) = at.offset(1, fwd) {
            directions.push(Direction::new(Reach::Attack, vec![right]));
        }
        if let Some(one) = at.offset(0, fwd) {
            let mut forward = vec![one];
            if !self.moved {
                if let Some(two) = at.offset(0, 2 * fwd) {
                    forward.push(two);
                }
            }
            directions.push(Direction::new(Reach::Advance, forward));
        }
        if let Some(left) = at.offset(-1, fwd) {
            directions.push(Direction::new(Reach::Attack, vec![left]));
        }
        directions
    }
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1), (1, 2), (-1, 2), (-2, 1),
    (-2, -1), (-1, -2), (1, -2), (2, -1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1),
    (-1, 0), (-1, -1), (0, -1), (1, -1),
];

fn rays(at: Square, steps: &[(i8, i8)]) -> Vec<Direction> {
    steps
        .iter()
        .map(|&step| ray(at, step))
        .filter(|squares| !squares.is_empty())
        .map(|squares| Direction::new(Reach::Attack, squares))
        .collect()
}

fn leaps(at: Square, offsets: &[(i8, i8)]) -> Vec<Direction> {
    offsets
        .iter()
        .filter_map(|&(df, dr)| at.offset(df, dr))
        .map(|square| Direction::new(Reach::Attack, vec![square]))
        .collect()
}

/// What a piece can do to the squares of one of its directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reach {
    /// Moves or captures there; the squares count as attacked.
    Attack,
    /// Moves there only when empty (pawn advance); never an attack.
    Advance,
}

/// An ordered run of squares along one movement axis, nearest first.
///
/// Straight out of [`Piece::scope`] it runs to the board edge; once stored
/// in a cell it is a path, truncated at the first occupied square.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Direction {
    pub reach: Reach,
    pub squares: Vec<Square>,
}

impl Direction {
    pub fn new(reach: Reach, squares: Vec<Square>) -> Self {
        Direction { reach, squares }
    }

    pub fn contains(&self, square: Square) -> bool {
        self.squares.contains(&square)
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}
