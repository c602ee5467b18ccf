//! Pins and check, read off the connectivity graph.

use log::debug;

use crate::board::Board;
use crate::geometry::{alignment, ray, ray_through, step_toward};
use crate::piece::{CheckState, Color, Direction, Piece, PieceType, Reach};
use crate::square::Square;

impl Board {
    /// Whether the piece on `at` is pinned to its own king.
    ///
    /// The piece must share a rank, file or diagonal with the king with only
    /// empty squares between them, and the first piece on the far side must
    /// be an enemy slider that moves along that line. A pinned piece gets no
    /// moves at all.
    pub fn skewed(&self, at: Square) -> bool {
        let Some(piece) = self.piece_at(at) else {
            return false;
        };
        if piece.piece_type() == PieceType::King {
            return false;
        }
        let color = piece.color;
        let Some(king) = self.king_square(color) else {
            return false;
        };
        let (Some(axis), Some((dx, dy))) = (alignment(at, king), step_toward(at, king)) else {
            return false;
        };
        if self.first_occupied(at, (dx, dy)) != Some(king) {
            return false;
        }
        match self
            .first_occupied(at, (-dx, -dy))
            .and_then(|far| self.piece_at(far))
        {
            Some(pinner) => {
                pinner.color != color
                    && pinner.is_sliding()
                    && pinner.piece_type().moves_along(axis)
            }
            None => false,
        }
    }

    /// Recomputes the check state of the `color` king from the pieces
    /// attacking its square.
    ///
    /// One sliding checker can be captured or blocked anywhere on the line
    /// to the king; a non-sliding one can only be captured. With two
    /// checkers only the king can move, so there are no removers.
    pub fn assess_check(&mut self, color: Color) {
        let Some(king) = self.king_square(color) else {
            return;
        };
        let checkers = self.grid.attackers(king, color.opposite());
        let check_removers = match checkers.as_slice() {
            [checker] if self.piece_at(*checker).is_some_and(Piece::is_sliding) => {
                let line = Direction::new(Reach::Attack, ray_through(king, *checker));
                self.grid.path(line).squares
            }
            [checker] => vec![*checker],
            _ => Vec::new(),
        };
        let state = CheckState {
            check: !checkers.is_empty(),
            check_count: checkers.len(),
            check_removers,
        };
        if state.check {
            debug!("{color} king on {king} in check from {checkers:?}");
        }
        if let Some(slot) = self
            .grid
            .cell_mut(king)
            .piece_mut()
            .and_then(Piece::check_state_mut)
        {
            *slot = state;
        }
    }

    pub(crate) fn refresh_checks(&mut self) {
        self.assess_check(Color::White);
        self.assess_check(Color::Black);
    }

    /// Squares behind the `color` king on the line of a sliding checker.
    /// The king's own body hides them from the checker's path, but stepping
    /// there keeps the king on the checking line.
    pub(crate) fn check_shadow(&self, color: Color) -> Vec<Square> {
        let Some(king) = self.king_square(color) else {
            return Vec::new();
        };
        self.grid
            .attackers(king, color.opposite())
            .into_iter()
            .filter(|checker| self.piece_at(*checker).is_some_and(Piece::is_sliding))
            .flat_map(|checker| {
                ray_through(checker, king)
                    .into_iter()
                    .skip_while(move |s| *s != king)
                    .skip(1)
                    .take(1)
            })
            .collect()
    }

    fn first_occupied(&self, from: Square, step: (i8, i8)) -> Option<Square> {
        ray(from, step)
            .into_iter()
            .find(|s| !self.cell(*s).is_empty())
    }
}
