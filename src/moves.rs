use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::piece::PieceType;
use crate::square::Square;

/// Board side of a special move: left is toward the a-file, right toward
/// the h-file, for both colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// File step toward this side.
    pub fn df(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Identifies a live piece by its type and the square it stands on, e.g. `k-e4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PieceKey {
    pub piece_type: PieceType,
    pub square: Square,
}

impl PieceKey {
    pub fn new(piece_type: PieceType, square: Square) -> Self {
        PieceKey { piece_type, square }
    }
}

impl fmt::Display for PieceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.piece_type.key(), self.square)
    }
}

impl FromStr for PieceKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (letter, square) = s
            .split_once('-')
            .ok_or_else(|| ParseError::PieceKey(s.to_string()))?;
        let mut chars = letter.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(ParseError::PieceKey(s.to_string()));
        };
        let piece_type = PieceType::from_key(c).ok_or(ParseError::Role(c))?;
        Ok(PieceKey::new(piece_type, square.parse()?))
    }
}

impl TryFrom<String> for PieceKey {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PieceKey> for String {
    fn from(key: PieceKey) -> String {
        key.to_string()
    }
}

/// Where a piece may go: a plain square or one of the special-move sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    Square(Square),
    /// King hops two files toward `Side`, the rook from that corner crosses it.
    Castle(Side),
    /// Pawn steps diagonally toward `Side`, capturing the pawn beside it.
    EnPassant(Side),
    /// Pawn reaches the last rank on this square and is replaced.
    Promote(Square),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Square(square) => write!(f, "{square}"),
            Destination::Castle(side) => write!(f, "castle_{}", side.name()),
            Destination::EnPassant(side) => write!(f, "enpassant_{}", side.name()),
            Destination::Promote(square) => write!(f, "promote_{square}"),
        }
    }
}

impl FromStr for Destination {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Destination(s.to_string());
        match s {
            "castle_left" => Ok(Destination::Castle(Side::Left)),
            "castle_right" => Ok(Destination::Castle(Side::Right)),
            "enpassant_left" => Ok(Destination::EnPassant(Side::Left)),
            "enpassant_right" => Ok(Destination::EnPassant(Side::Right)),
            _ => match s.strip_prefix("promote_") {
                Some(square) => Ok(Destination::Promote(square.parse().map_err(|_| bad())?)),
                None => s.parse().map(Destination::Square).map_err(|_| bad()),
            },
        }
    }
}

impl TryFrom<String> for Destination {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> String {
        destination.to_string()
    }
}

/// A command for [`Board::apply`](crate::board::Board::apply).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub piece: PieceKey,
    pub destination: Destination,
    /// Piece chosen for a `Promote` destination.
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(piece: PieceKey, destination: Destination) -> Self {
        Move {
            piece,
            destination,
            promotion: None,
        }
    }

    pub fn promoting(mut self, into: PieceType) -> Self {
        self.promotion = Some(into);
        self
    }
}

/// Formats as `p-e7-promote_e8=q`, `k-e1-castle_left`, `n-g1-f3`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.piece, self.destination)?;
        if let Some(into) = self.promotion {
            write!(f, "={}", into.key())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, promotion) = match s.split_once('=') {
            Some((body, letter)) => {
                let mut chars = letter.chars();
                let c = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(ParseError::Destination(s.to_string())),
                };
                (body, Some(PieceType::from_key(c).ok_or(ParseError::Role(c))?))
            }
            None => (s, None),
        };
        // The piece key itself contains one '-', the destination follows the second.
        let split = body
            .match_indices('-')
            .nth(1)
            .map(|(i, _)| i)
            .ok_or_else(|| ParseError::PieceKey(s.to_string()))?;
        Ok(Move {
            piece: body[..split].parse()?,
            destination: body[split + 1..].parse()?,
            promotion,
        })
    }
}
