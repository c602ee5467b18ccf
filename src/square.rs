use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Number of files (and ranks) on the board.
pub const BOARD_SIZE: i8 = 8;

/// A board coordinate. File 0 = a, rank 0 = 1, so (0, 0) is a1 and (7, 7) is h8.
///
/// Squares are only ever constructed in range, which is what lets the engine
/// treat every `Square` it receives as a valid cell key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    // Ordered rank-major so sorted squares read a1, b1, .., h8.
    rank: i8,
    file: i8,
}

impl Square {
    pub fn new(file: i8, rank: i8) -> Option<Square> {
        if (0..BOARD_SIZE).contains(&file) && (0..BOARD_SIZE).contains(&rank) {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// Square from a 0-63 index (a1 = 0, h1 = 7, h8 = 63).
    pub fn from_index(index: usize) -> Option<Square> {
        if index < 64 {
            Some(Square {
                file: (index % 8) as i8,
                rank: (index / 8) as i8,
            })
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    pub fn file(self) -> i8 {
        self.file
    }

    pub fn rank(self) -> i8 {
        self.rank
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        Square::new(self.file + df, self.rank + dr)
    }

    /// All 64 squares, a1 first, h8 last.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).filter_map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file as u8) as char;
        let rank = (b'1' + self.rank as u8) as char;
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseError::Square(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ParseError::Square(s.to_string()));
        }
        Ok(Square {
            file: (file - b'a') as i8,
            rank: (rank - b'1') as i8,
        })
    }
}

impl TryFrom<String> for Square {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> String {
        square.to_string()
    }
}

/// Shorthand for building squares from literal keys in tests and setups.
///
/// # Panics
/// Panics if `key` is not a valid square name.
pub fn sq(key: &str) -> Square {
    match key.parse() {
        Ok(square) => square,
        Err(e) => panic!("{e}"),
    }
}
