use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::cell::{Cell, Grid};
use crate::error::MoveError;
use crate::geometry::ray_through;
use crate::moves::{Destination, Move, PieceKey, Side};
use crate::piece::{CheckState, Color, Direction, Piece, PieceType, Reach};
use crate::square::Square;

/// Live squares of one color's pieces, keyed by piece type.
pub type Registry = BTreeMap<PieceType, Vec<Square>>;

/// Legal destinations per piece, as returned by [`Board::valid_moves`].
pub type MoveMap = BTreeMap<PieceKey, BTreeSet<Destination>>;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate,
    Stalemate,
}

/// Board state plus the line-of-sight graph between its cells.
///
/// All mutation goes through the methods here so that, between calls, every
/// path edge in the grid has its back-reference and every sliding piece's
/// path ends at the first piece in its way.
#[derive(Clone, Debug)]
pub struct Board {
    pub(crate) grid: Grid,
    pub(crate) pieces: [Registry; 2],
    /// Per color, the pawn that just double-stepped and can be taken en passant.
    pub(crate) en_passant: [Option<Square>; 2],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board {
            grid: Grid::new(),
            pieces: [Registry::new(), Registry::new()],
            en_passant: [None, None],
        }
    }

    pub fn new() -> Self {
        let mut board = Board::empty();
        for (file, piece_type) in (0i8..).zip(BACK_RANK) {
            for (color, back, pawns) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
                board.put(Piece::new(piece_type, color), square(file, back));
                board.put(Piece::new(PieceType::Pawn, color), square(file, pawns));
            }
        }
        board.refresh_checks();
        board
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, at: Square) -> &Cell {
        &self.grid[at]
    }

    pub fn piece_at(&self, at: Square) -> Option<&Piece> {
        self.grid.piece_at(at)
    }

    pub fn pieces(&self, color: Color) -> &Registry {
        &self.pieces[color.index()]
    }

    /// Pawn of `color` that may currently be captured en passant.
    pub fn en_passant_target(&self, color: Color) -> Option<Square> {
        self.en_passant[color.index()]
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .get(&PieceType::King)
            .and_then(|squares| squares.first().copied())
    }

    /// Check state of the `color` king, if it is on the board.
    pub fn king(&self, color: Color) -> Option<&CheckState> {
        self.king_square(color)
            .and_then(|at| self.piece_at(at))
            .and_then(Piece::check_state)
    }

    /// Puts `piece` on `at`, capturing any occupant, and refreshes check.
    pub fn place(&mut self, piece: Piece, at: Square) -> Option<Piece> {
        let captured = self.put(piece, at);
        self.refresh_checks();
        debug_assert!(self.grid.is_consistent());
        captured
    }

    /// Takes the occupant off `at` (a capture when done by the opponent).
    pub fn remove_piece(&mut self, at: Square) -> Option<Piece> {
        let removed = self.take(at);
        self.refresh_checks();
        debug_assert!(self.grid.is_consistent());
        removed
    }

    /// Moves the piece on `from` to `to`, capturing whatever stands there.
    ///
    /// # Panics
    /// Panics if `from` is empty.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let (color, piece_type, captured) = self.relocate(from, to);
        let double_step = piece_type == PieceType::Pawn && (to.rank() - from.rank()).abs() == 2;
        self.finish_turn(color, double_step.then_some(to));
        captured
    }

    /// Castles the king on `king_at` toward `side`.
    ///
    /// # Panics
    /// Panics if `king_at` is empty or the king has no room to hop two files.
    pub fn castle(&mut self, king_at: Square, side: Side) {
        let df = side.df();
        let (Some(king_to), Some(rook_to)) = (king_at.offset(2 * df, 0), king_at.offset(df, 0))
        else {
            panic!("no room to castle {side:?} from {king_at}");
        };
        let corner = if side == Side::Left { 0 } else { 7 };
        let rook_from = square(corner, king_at.rank());

        let (color, _, _) = self.relocate(king_at, king_to);
        self.relocate(rook_from, rook_to);
        debug!("{color} castles {side:?}");
        self.finish_turn(color, None);
    }

    /// Captures en passant with the pawn on `pawn_at` toward `side`.
    ///
    /// # Panics
    /// Panics if `pawn_at` is empty or the capture would leave the board.
    pub fn en_passant(&mut self, pawn_at: Square, side: Side) -> Option<Piece> {
        let color = self.occupant(pawn_at).color;
        let (Some(victim), Some(target)) = (
            pawn_at.offset(side.df(), 0),
            pawn_at.offset(side.df(), color.forward()),
        ) else {
            panic!("no en passant {side:?} from {pawn_at}");
        };

        let captured = self.take(victim);
        self.relocate(pawn_at, target);
        debug!("{color} takes en passant on {victim}");
        self.finish_turn(color, None);
        captured
    }

    /// Replaces the pawn on `pawn_at` with a new `into` piece on `target`.
    ///
    /// # Panics
    /// Panics if `pawn_at` is empty.
    pub fn promote(&mut self, pawn_at: Square, target: Square, into: PieceType) -> Option<Piece> {
        let color = self.occupant(pawn_at).color;
        self.take(pawn_at);
        let mut piece = Piece::new(into, color);
        piece.moved = true;
        let captured = self.put(piece, target);
        debug!("{color} pawn {pawn_at} promotes to {into:?} on {target}");
        self.finish_turn(color, None);
        captured
    }

    /// Legal destinations for every live piece of `color`.
    pub fn valid_moves(&self, color: Color) -> MoveMap {
        self.pieces(color)
            .iter()
            .flat_map(|(&piece_type, squares)| {
                squares.iter().map(move |&at| PieceKey::new(piece_type, at))
            })
            .map(|key| (key, self.legal_destinations(key.square)))
            .collect()
    }

    /// Validates `mv` against the current legal moves, then plays it.
    /// Returns the captured piece, if any.
    pub fn apply(&mut self, mv: &Move) -> Result<Option<Piece>, MoveError> {
        let from = mv.piece.square;
        let piece = self.piece_at(from).ok_or(MoveError::NoPiece(from))?;
        if piece.piece_type() != mv.piece.piece_type {
            return Err(MoveError::WrongPiece { key: mv.piece });
        }
        if !self.legal_destinations(from).contains(&mv.destination) {
            return Err(MoveError::Illegal {
                key: mv.piece,
                destination: mv.destination,
            });
        }

        match mv.destination {
            Destination::Square(to) => Ok(self.move_piece(from, to)),
            Destination::Castle(side) => {
                self.castle(from, side);
                Ok(None)
            }
            Destination::EnPassant(side) => Ok(self.en_passant(from, side)),
            Destination::Promote(to) => {
                let into = mv.promotion.ok_or(MoveError::MissingPromotion {
                    destination: mv.destination,
                })?;
                if !into.is_promotion_choice() {
                    return Err(MoveError::InvalidPromotion(into));
                }
                Ok(self.promote(from, to, into))
            }
        }
    }

    /// End-of-turn verdict for the side about to move.
    pub fn outcome(&self, color: Color) -> Outcome {
        if self.valid_moves(color).values().any(|d| !d.is_empty()) {
            return Outcome::Ongoing;
        }
        match self.king(color) {
            Some(state) if state.check => Outcome::Checkmate,
            _ => Outcome::Stalemate,
        }
    }

    /// Places without refreshing check state: capture, register, remap.
    pub(crate) fn put(&mut self, piece: Piece, at: Square) -> Option<Piece> {
        let captured = self.grid.cell_mut(at).remove_piece();
        if let Some(victim) = &captured {
            self.unregister(victim, at);
            // The square stays occupied, so paths ending here keep their length.
            self.grid.disconnect(at);
            debug!("{} {:?} captured on {at}", victim.color, victim.piece_type());
        }
        self.register(&piece, at);
        self.grid.cell_mut(at).place(piece);
        self.placement_remap(at);
        captured
    }

    /// Removes without refreshing check state.
    pub(crate) fn take(&mut self, at: Square) -> Option<Piece> {
        let piece = self.grid.cell_mut(at).remove_piece()?;
        self.unregister(&piece, at);
        self.removal_remap(at);
        Some(piece)
    }

    fn relocate(&mut self, from: Square, to: Square) -> (Color, PieceType, Option<Piece>) {
        let Some(mut piece) = self.take(from) else {
            panic!("no piece on {from}");
        };
        piece.moved = true;
        let (color, piece_type) = (piece.color, piece.piece_type());
        let captured = self.put(piece, to);
        debug!("{color} {piece_type:?} {from} -> {to}");
        (color, piece_type, captured)
    }

    fn finish_turn(&mut self, mover: Color, vulnerable: Option<Square>) {
        self.en_passant[mover.opposite().index()] = None;
        self.en_passant[mover.index()] = vulnerable;
        self.refresh_checks();
        debug_assert!(self.grid.is_consistent());
    }

    fn occupant(&self, at: Square) -> &Piece {
        match self.piece_at(at) {
            Some(piece) => piece,
            None => panic!("no piece on {at}"),
        }
    }

    fn register(&mut self, piece: &Piece, at: Square) {
        self.pieces[piece.color.index()]
            .entry(piece.piece_type())
            .or_default()
            .push(at);
    }

    fn unregister(&mut self, piece: &Piece, at: Square) {
        let registry = &mut self.pieces[piece.color.index()];
        let piece_type = piece.piece_type();
        if let Some(squares) = registry.get_mut(&piece_type) {
            squares.retain(|s| *s != at);
            if squares.is_empty() {
                registry.remove(&piece_type);
            }
        }
    }

    fn placement_remap(&mut self, at: Square) {
        self.remap_paths_through(at);
        self.map_paths_from(at);
    }

    fn removal_remap(&mut self, at: Square) {
        self.remap_paths_through(at);
        self.grid.disconnect(at);
    }

    /// Re-derives every path running through `at` after its occupancy changed.
    /// Sliding paths get cut at a new piece or extended past a vacated square;
    /// so does an unmoved pawn's two-square advance.
    fn remap_paths_through(&mut self, at: Square) {
        let referrers: Vec<Square> = self.grid[at].referrers().keys().copied().collect();
        for origin in referrers {
            let Some(piece) = self.grid.piece_at(origin) else {
                panic!("empty cell {origin} still has a path through {at}");
            };
            let direction = if piece.is_sliding() {
                Direction::new(Reach::Attack, ray_through(origin, at))
            } else {
                match piece
                    .scope(origin)
                    .into_iter()
                    .find(|d| d.len() > 1 && d.contains(at))
                {
                    Some(direction) => direction,
                    None => continue,
                }
            };
            let path = self.grid.path(direction);
            self.grid.update_path(origin, at, path.squares);
        }
    }

    fn map_paths_from(&mut self, at: Square) {
        let Some(piece) = self.grid.piece_at(at) else {
            return;
        };
        let paths = piece
            .scope(at)
            .into_iter()
            .map(|direction| self.grid.path(direction))
            .collect();
        self.grid.connect(at, paths);
    }
}

fn square(file: i8, rank: i8) -> Square {
    match Square::new(file, rank) {
        Some(square) => square,
        None => panic!("({file}, {rank}) is off the board"),
    }
}
