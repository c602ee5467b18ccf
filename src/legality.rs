//! Final legal destinations per piece: connectivity narrowed by pins,
//! check, and the special rules of kings and pawns.

use std::collections::BTreeSet;

use crate::board::Board;
use crate::geometry::ray;
use crate::moves::{Destination, Side};
use crate::piece::{Color, Direction, Piece, PieceType, Reach};
use crate::square::Square;

/// Squares a non-king move may land on given the mover's king.
enum Restriction<'a> {
    Free,
    /// Single check: only these squares capture or block the checker.
    Removers(&'a [Square]),
    /// Double check: nothing but the king may move.
    Frozen,
}

impl Restriction<'_> {
    fn allows(&self, square: Square) -> bool {
        match self {
            Restriction::Free => true,
            Restriction::Removers(squares) => squares.contains(&square),
            Restriction::Frozen => false,
        }
    }
}

impl Board {
    /// Legal destinations of the piece on `at`; empty if the square is empty.
    pub fn legal_destinations(&self, at: Square) -> BTreeSet<Destination> {
        match self.piece_at(at).map(Piece::piece_type) {
            None => BTreeSet::new(),
            Some(PieceType::King) => self.filter_connections_king(at),
            Some(PieceType::Pawn) => self.filter_connections_pawn(at),
            Some(_) => self.filter_connections(at),
        }
    }

    /// Destinations along the piece's paths that it can occupy, respecting
    /// pins and check.
    pub fn filter_connections(&self, at: Square) -> BTreeSet<Destination> {
        let Some(piece) = self.piece_at(at) else {
            return BTreeSet::new();
        };
        if self.skewed(at) {
            return BTreeSet::new();
        }
        let color = piece.color;
        let restriction = self.restriction(color);

        self.cell(at)
            .paths()
            .iter()
            .flat_map(|path| path.squares.iter().copied())
            .filter(|s| self.cell(*s).occupiable_by(color) && restriction.allows(*s))
            .map(Destination::Square)
            .collect()
    }

    fn filter_connections_king(&self, at: Square) -> BTreeSet<Destination> {
        let Some(king) = self.piece_at(at) else {
            return BTreeSet::new();
        };
        let color = king.color;
        let enemy = color.opposite();
        let shadow = self.check_shadow(color);

        let mut destinations: BTreeSet<Destination> = self
            .cell(at)
            .paths()
            .iter()
            .flat_map(|path| path.squares.iter().copied())
            .filter(|s| {
                self.cell(*s).occupiable_by(color)
                    && self.grid.not_checked_by(*s, enemy)
                    && !shadow.contains(s)
            })
            .map(Destination::Square)
            .collect();

        let in_check = king.check_state().is_some_and(|state| state.check);
        if !king.moved && !in_check {
            for side in Side::BOTH {
                if self.can_castle(at, color, side) {
                    destinations.insert(Destination::Castle(side));
                }
            }
        }
        destinations
    }

    /// The king on `at` can castle toward `side` when the squares up to an
    /// unmoved rook in the corner are empty and the two it crosses are not
    /// attacked.
    fn can_castle(&self, at: Square, color: Color, side: Side) -> bool {
        let line = self
            .grid
            .path(Direction::new(Reach::Attack, ray(at, (side.df(), 0))))
            .squares;
        let Some(&corner) = line.last() else {
            return false;
        };
        if line.len() < 3 || corner.offset(side.df(), 0).is_some() {
            return false;
        }
        let rook_ready = self.piece_at(corner).is_some_and(|rook| {
            rook.color == color && rook.piece_type() == PieceType::Rook && !rook.moved
        });
        rook_ready
            && line[..2]
                .iter()
                .all(|s| self.grid.not_checked_by(*s, color.opposite()))
    }

    fn filter_connections_pawn(&self, at: Square) -> BTreeSet<Destination> {
        let Some(pawn) = self.piece_at(at) else {
            return BTreeSet::new();
        };
        if self.skewed(at) {
            return BTreeSet::new();
        }
        let color = pawn.color;
        let restriction = self.restriction(color);
        let mut squares = Vec::new();

        for path in self.cell(at).paths() {
            match path.reach {
                Reach::Advance => {
                    for &s in &path.squares {
                        if !self.cell(s).is_empty() {
                            break;
                        }
                        squares.push(s);
                    }
                }
                Reach::Attack => squares.extend(path.squares.iter().copied().filter(|s| {
                    self.piece_at(*s).is_some_and(|p| p.color != color)
                })),
            }
        }

        let mut destinations: BTreeSet<Destination> = squares
            .into_iter()
            .filter(|s| restriction.allows(*s))
            .map(|s| {
                if s.rank() == color.last_rank() {
                    Destination::Promote(s)
                } else {
                    Destination::Square(s)
                }
            })
            .collect();

        for side in Side::BOTH {
            if self.can_take_en_passant(at, color, side, &restriction) {
                destinations.insert(Destination::EnPassant(side));
            }
        }
        destinations
    }

    fn can_take_en_passant(
        &self,
        at: Square,
        color: Color,
        side: Side,
        restriction: &Restriction<'_>,
    ) -> bool {
        let (Some(victim), Some(target)) = (
            at.offset(side.df(), 0),
            at.offset(side.df(), color.forward()),
        ) else {
            return false;
        };
        if self.en_passant_target(color.opposite()) != Some(victim) {
            return false;
        }
        if !(restriction.allows(victim) || restriction.allows(target)) {
            return false;
        }
        // Two pawns leave the board's lines at once; try it rather than
        // reason about every line they might have been blocking.
        let mut trial = self.clone();
        trial.en_passant(at, side);
        !trial.king(color).is_some_and(|state| state.check)
    }

    fn restriction(&self, color: Color) -> Restriction<'_> {
        match self.king(color) {
            Some(state) if state.check_count >= 2 => Restriction::Frozen,
            Some(state) if state.check => Restriction::Removers(&state.check_removers),
            _ => Restriction::Free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::sq;

    fn place(board: &mut Board, piece_type: PieceType, color: Color, at: &str) {
        board.place(Piece::new(piece_type, color), sq(at));
    }

    fn dests(board: &Board, at: &str) -> Vec<String> {
        board
            .legal_destinations(sq(at))
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[test]
    fn knights_at_start_have_two_moves_each() {
        let board = Board::new();
        assert_eq!(dests(&board, "b1"), ["a3", "c3"]);
        assert_eq!(dests(&board, "g8"), ["f6", "h6"]);
        assert!(dests(&board, "a1").is_empty());
    }

    #[test]
    fn pawn_forward_blocked_and_diagonal_needs_enemy() {
        let mut board = Board::empty();
        place(&mut board, PieceType::Pawn, Color::White, "d2");
        place(&mut board, PieceType::Knight, Color::Black, "d4");
        place(&mut board, PieceType::Knight, Color::White, "c3");
        place(&mut board, PieceType::Bishop, Color::Black, "e3");

        assert_eq!(dests(&board, "d2"), ["d3", "e3"]);
    }

    #[test]
    fn pawn_reaching_last_rank_gets_promote_sentinel() {
        let mut board = Board::empty();
        let mut pawn = Piece::new(PieceType::Pawn, Color::Black);
        pawn.moved = true;
        board.place(pawn, sq("g2"));
        place(&mut board, PieceType::Rook, Color::White, "h1");

        assert_eq!(dests(&board, "g2"), ["promote_g1", "promote_h1"]);
    }

    #[test]
    fn blocking_a_single_check_is_the_only_option() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e1");
        place(&mut board, PieceType::Rook, Color::White, "a3");
        place(&mut board, PieceType::Rook, Color::Black, "e8");

        assert_eq!(dests(&board, "a3"), ["e3"]);
    }

    #[test]
    fn double_check_freezes_everything_but_the_king() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e1");
        place(&mut board, PieceType::Rook, Color::White, "a3");
        place(&mut board, PieceType::Rook, Color::Black, "e8");
        place(&mut board, PieceType::Knight, Color::Black, "d3");

        assert!(dests(&board, "a3").is_empty());
        assert!(!dests(&board, "e1").is_empty());
    }

    #[test]
    fn king_cannot_retreat_along_checking_line() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e4");
        place(&mut board, PieceType::Rook, Color::Black, "e8");

        let moves = dests(&board, "e4");
        assert!(!moves.contains(&"e3".to_string()));
        assert!(!moves.contains(&"e5".to_string()));
        assert_eq!(moves, ["d3", "f3", "d4", "f4", "d5", "f5"]);
    }

    #[test]
    fn king_may_not_capture_a_defended_piece() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e1");
        place(&mut board, PieceType::Pawn, Color::Black, "e2");
        place(&mut board, PieceType::Bishop, Color::Black, "g4");

        assert!(!dests(&board, "e1").contains(&"e2".to_string()));
    }

    #[test]
    fn castling_both_sides_when_clear() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e1");
        place(&mut board, PieceType::Rook, Color::White, "a1");
        place(&mut board, PieceType::Rook, Color::White, "h1");

        let moves = dests(&board, "e1");
        assert!(moves.contains(&"castle_left".to_string()));
        assert!(moves.contains(&"castle_right".to_string()));
    }

    #[test]
    fn castling_refused_through_attacked_square_or_moved_rook() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e1");
        place(&mut board, PieceType::Rook, Color::White, "a1");
        place(&mut board, PieceType::Rook, Color::White, "h1");
        place(&mut board, PieceType::Rook, Color::Black, "f8");
        board.move_piece(sq("a1"), sq("a2"));
        board.move_piece(sq("a2"), sq("a1"));

        let moves = dests(&board, "e1");
        assert!(!moves.contains(&"castle_right".to_string()));
        assert!(!moves.contains(&"castle_left".to_string()));
    }

    #[test]
    fn castling_refused_while_in_check() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::White, "e1");
        place(&mut board, PieceType::Rook, Color::White, "h1");
        place(&mut board, PieceType::Bishop, Color::Black, "b4");

        assert!(!dests(&board, "e1").contains(&"castle_right".to_string()));
    }

    #[test]
    fn castling_refused_with_piece_in_between() {
        let mut board = Board::new();
        assert!(!dests(&board, "e1").iter().any(|d| d.starts_with("castle")));
        board.remove_piece(sq("f1"));
        board.remove_piece(sq("g1"));
        assert!(dests(&board, "e1").contains(&"castle_right".to_string()));
        assert!(!dests(&board, "e1").contains(&"castle_left".to_string()));
    }

    #[test]
    fn en_passant_offered_only_right_after_double_step() {
        let mut board = Board::empty();
        place(&mut board, PieceType::Pawn, Color::White, "e2");
        let mut black = Piece::new(PieceType::Pawn, Color::Black);
        black.moved = true;
        board.place(black, sq("d4"));

        board.move_piece(sq("e2"), sq("e4"));
        assert!(dests(&board, "d4").contains(&"enpassant_right".to_string()));

        let mut board_after_wait = board.clone();
        place(&mut board_after_wait, PieceType::Knight, Color::Black, "a8");
        board_after_wait.move_piece(sq("a8"), sq("b6"));
        assert!(!dests(&board_after_wait, "d4")
            .iter()
            .any(|d| d.starts_with("enpassant")));
    }

    #[test]
    fn en_passant_refused_when_it_exposes_the_king_on_the_rank() {
        let mut board = Board::empty();
        place(&mut board, PieceType::King, Color::Black, "a4");
        let mut black = Piece::new(PieceType::Pawn, Color::Black);
        black.moved = true;
        board.place(black, sq("d4"));
        place(&mut board, PieceType::Pawn, Color::White, "e2");
        place(&mut board, PieceType::Rook, Color::White, "h4");

        board.move_piece(sq("e2"), sq("e4"));

        assert!(!dests(&board, "d4").iter().any(|d| d.starts_with("enpassant")));
    }
}
