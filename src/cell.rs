//! Board cells and the line-of-sight graph between them.
//!
//! Every cell stores its outgoing paths (where the occupant can reach) and a
//! reverse index of the cells whose paths run through it. Cells refer to
//! each other by [`Square`] only; the [`Grid`] owns all 64 of them, so the
//! graph has no ownership cycles and occupancy is always read live.

use std::collections::BTreeMap;
use std::ops::Index;

use log::trace;

use crate::piece::{Color, Direction, Piece, Reach};
use crate::square::Square;

#[derive(Clone, Debug)]
pub struct Cell {
    square: Square,
    piece: Option<Piece>,
    paths: Vec<Direction>,
    referrers: BTreeMap<Square, Reach>,
}

impl Cell {
    fn new(square: Square) -> Self {
        Cell {
            square,
            piece: None,
            paths: Vec::new(),
            referrers: BTreeMap::new(),
        }
    }

    pub fn square(&self) -> Square {
        self.square
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub(crate) fn piece_mut(&mut self) -> Option<&mut Piece> {
        self.piece.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.piece.is_none()
    }

    /// Sets the occupant, handing back whoever was there. Connectivity is
    /// left alone; the board remaps around the change.
    pub(crate) fn place(&mut self, piece: Piece) -> Option<Piece> {
        self.piece.replace(piece)
    }

    pub(crate) fn remove_piece(&mut self) -> Option<Piece> {
        self.piece.take()
    }

    /// Outgoing paths, each truncated at (and including) its first occupied square.
    pub fn paths(&self) -> &[Direction] {
        &self.paths
    }

    /// Cells whose paths pass through this one, with what they can do here.
    pub fn referrers(&self) -> &BTreeMap<Square, Reach> {
        &self.referrers
    }

    pub fn occupiable_by(&self, color: Color) -> bool {
        match &self.piece {
            None => true,
            Some(piece) => piece.color != color,
        }
    }
}

/// The 8x8 arena of cells, indexed by square.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            cells: Square::all().map(Cell::new).collect(),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn cell_mut(&mut self, square: Square) -> &mut Cell {
        &mut self.cells[square.index()]
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self[square].piece()
    }

    /// Cuts a direction down to a path: every square up to and including
    /// the first occupied one.
    pub fn path(&self, direction: Direction) -> Direction {
        let mut squares = Vec::with_capacity(direction.len());
        for square in direction.squares {
            squares.push(square);
            if !self[square].is_empty() {
                break;
            }
        }
        Direction::new(direction.reach, squares)
    }

    /// Installs `paths` as the outgoing paths of `origin` and registers
    /// `origin` in the reverse index of every square they cover.
    pub(crate) fn connect(&mut self, origin: Square, paths: Vec<Direction>) {
        self.disconnect(origin);
        for path in &paths {
            for &square in &path.squares {
                self.cells[square.index()].referrers.insert(origin, path.reach);
            }
        }
        trace!("connect {origin}: {} paths", paths.len());
        self.cells[origin.index()].paths = paths;
    }

    /// Drops every outgoing path of `origin` and its back-references.
    /// Safe to call on a cell with no paths.
    pub(crate) fn disconnect(&mut self, origin: Square) {
        let paths = std::mem::take(&mut self.cells[origin.index()].paths);
        for path in &paths {
            for square in &path.squares {
                self.cells[square.index()].referrers.remove(&origin);
            }
        }
        if !paths.is_empty() {
            trace!("disconnect {origin}");
        }
    }

    /// Replaces the one path of `origin` that runs through `through` and
    /// adjusts back-references for the squares that left or joined it.
    ///
    /// # Panics
    /// Panics if `origin` has no path through `through`; the reverse index
    /// and the paths have diverged.
    pub(crate) fn update_path(&mut self, origin: Square, through: Square, new_path: Vec<Square>) {
        let Some(slot) = self.cells[origin.index()]
            .paths
            .iter()
            .position(|path| path.contains(through))
        else {
            panic!("{origin} is a referrer of {through} but has no path through it");
        };

        let old = std::mem::replace(
            &mut self.cells[origin.index()].paths[slot].squares,
            new_path.clone(),
        );
        let reach = self.cells[origin.index()].paths[slot].reach;

        for square in old.iter().filter(|s| !new_path.contains(s)) {
            self.cells[square.index()].referrers.remove(&origin);
        }
        for square in new_path.iter().filter(|s| !old.contains(s)) {
            self.cells[square.index()].referrers.insert(origin, reach);
        }
        trace!(
            "update path {origin} via {through}: {} -> {} squares",
            old.len(),
            new_path.len()
        );
    }

    /// Occupied cells of `color` that attack `square`.
    pub fn attackers(&self, square: Square, color: Color) -> Vec<Square> {
        self[square]
            .referrers
            .iter()
            .filter(|(_, reach)| **reach == Reach::Attack)
            .map(|(origin, _)| *origin)
            .filter(|origin| self.piece_at(*origin).is_some_and(|p| p.color == color))
            .collect()
    }

    /// True when no piece of `color` attacks `square`.
    pub fn not_checked_by(&self, square: Square, color: Color) -> bool {
        self.attackers(square, color).is_empty()
    }

    /// Whether every path edge has its back-reference and every
    /// back-reference has its path edge.
    pub fn is_consistent(&self) -> bool {
        let forward = self.cells.iter().all(|cell| {
            cell.paths.iter().all(|path| {
                path.squares
                    .iter()
                    .all(|s| self[*s].referrers.get(&cell.square) == Some(&path.reach))
            })
        });
        let backward = self.cells.iter().all(|cell| {
            cell.referrers.iter().all(|(origin, reach)| {
                self[*origin]
                    .paths
                    .iter()
                    .any(|path| path.reach == *reach && path.contains(cell.square))
            })
        });
        forward && backward
    }
}

impl Index<Square> for Grid {
    type Output = Cell;

    fn index(&self, square: Square) -> &Cell {
        &self.cells[square.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceType;
    use crate::square::sq;

    fn attack(keys: &[&str]) -> Direction {
        Direction::new(Reach::Attack, keys.iter().map(|k| sq(k)).collect())
    }

    #[test]
    fn connect_registers_back_references() {
        let mut grid = Grid::new();
        grid.connect(sq("a1"), vec![attack(&["b4", "b5"])]);

        assert_eq!(grid[sq("b4")].referrers().get(&sq("a1")), Some(&Reach::Attack));
        assert_eq!(grid[sq("b5")].referrers().get(&sq("a1")), Some(&Reach::Attack));
        assert!(grid.is_consistent());
    }

    #[test]
    fn disconnect_removes_only_own_references() {
        let mut grid = Grid::new();
        grid.connect(sq("a1"), vec![attack(&["b4"])]);
        grid.connect(sq("b5"), vec![attack(&["b4"])]);

        grid.disconnect(sq("a1"));

        let referrers: Vec<Square> = grid[sq("b4")].referrers().keys().copied().collect();
        assert_eq!(referrers, [sq("b5")]);
        assert!(grid[sq("a1")].paths().is_empty());
    }

    #[test]
    fn disconnect_twice_is_a_no_op() {
        let mut grid = Grid::new();
        grid.connect(sq("a1"), vec![attack(&["a2", "a3"])]);
        grid.connect(sq("c3"), vec![attack(&["a3"])]);

        grid.disconnect(sq("a1"));
        let once: Vec<_> = grid.cells().map(|c| c.referrers().clone()).collect();
        grid.disconnect(sq("a1"));
        let twice: Vec<_> = grid.cells().map(|c| c.referrers().clone()).collect();

        assert_eq!(once, twice);
        assert!(grid.is_consistent());
    }

    #[test]
    fn update_path_diffs_only_the_matching_path() {
        let mut grid = Grid::new();
        grid.connect(
            sq("d4"),
            vec![attack(&["d5", "d6", "d7", "d8"]), attack(&["e4", "f4"])],
        );

        grid.update_path(sq("d4"), sq("d6"), vec![sq("d5"), sq("d6")]);

        assert!(grid[sq("d7")].referrers().is_empty());
        assert!(grid[sq("d8")].referrers().is_empty());
        assert!(grid[sq("f4")].referrers().contains_key(&sq("d4")));
        assert_eq!(grid[sq("d4")].paths()[1], attack(&["e4", "f4"]));

        grid.update_path(sq("d4"), sq("f4"), vec![sq("e4"), sq("f4"), sq("g4")]);
        assert!(grid[sq("g4")].referrers().contains_key(&sq("d4")));
        assert!(grid.is_consistent());
    }

    #[test]
    #[should_panic(expected = "no path through")]
    fn update_path_without_matching_path_is_fatal() {
        let mut grid = Grid::new();
        grid.connect(sq("d4"), vec![attack(&["d5"])]);
        grid.update_path(sq("d4"), sq("e5"), vec![sq("e5")]);
    }

    #[test]
    fn path_stops_at_first_occupied_cell() {
        let mut grid = Grid::new();
        grid.cell_mut(sq("c1")).place(Piece::new(PieceType::Pawn, Color::White));

        let path = grid.path(attack(&["a1", "b1", "c1", "d1"]));
        assert_eq!(path, attack(&["a1", "b1", "c1"]));
    }

    #[test]
    fn advance_edges_are_not_attacks() {
        let mut grid = Grid::new();
        grid.cell_mut(sq("e2")).place(Piece::new(PieceType::Pawn, Color::White));
        grid.connect(
            sq("e2"),
            vec![
                attack(&["f3"]),
                Direction::new(Reach::Advance, vec![sq("e3"), sq("e4")]),
            ],
        );

        assert!(!grid.not_checked_by(sq("f3"), Color::White));
        assert!(grid.not_checked_by(sq("e3"), Color::White));
        assert!(grid.not_checked_by(sq("f3"), Color::Black));
    }

    #[test]
    fn occupiable_by_opposite_color_or_empty() {
        let mut grid = Grid::new();
        grid.cell_mut(sq("e5")).place(Piece::new(PieceType::Knight, Color::Black));

        assert!(grid[sq("e5")].occupiable_by(Color::White));
        assert!(!grid[sq("e5")].occupiable_by(Color::Black));
        assert!(grid[sq("e6")].occupiable_by(Color::Black));
    }
}
