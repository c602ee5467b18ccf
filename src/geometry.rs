//! Rays between board coordinates. Pure functions, no board state.

use crate::square::Square;

/// The two movement axes a sliding piece can share with another square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal or vertical (slope 0 or undefined).
    Orthogonal,
    /// Either 45 degree diagonal (slope 1 or -1).
    Diagonal,
}

pub const ORTHOGONAL_STEPS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
pub const DIAGONAL_STEPS: [(i8, i8); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// Classifies the slope between two squares. Only slopes of 0, 1, -1 and
/// undefined (vertical) line up along a board axis; anything else, or two
/// equal squares, is `None`.
pub fn alignment(a: Square, b: Square) -> Option<Axis> {
    let dx = b.file() - a.file();
    let dy = b.rank() - a.rank();
    match (dx, dy) {
        (0, 0) => None,
        (0, _) | (_, 0) => Some(Axis::Orthogonal),
        _ if dx.abs() == dy.abs() => Some(Axis::Diagonal),
        _ => None,
    }
}

/// Unit step leading from `from` toward `to`, if the two are aligned.
pub fn step_toward(from: Square, to: Square) -> Option<(i8, i8)> {
    alignment(from, to)?;
    let dx = (to.file() - from.file()).signum();
    let dy = (to.rank() - from.rank()).signum();
    Some((dx, dy))
}

/// Squares from just past `origin` to the board edge, nearest first.
pub fn ray(origin: Square, (df, dr): (i8, i8)) -> Vec<Square> {
    let mut squares = Vec::new();
    let mut current = origin;
    while let Some(next) = current.offset(df, dr) {
        squares.push(next);
        current = next;
    }
    squares
}

/// The ray that starts just past `origin`, passes through `through` and runs
/// on to the board edge. Empty when the squares coincide or are not
/// co-linear along a board axis.
pub fn ray_through(origin: Square, through: Square) -> Vec<Square> {
    match step_toward(origin, through) {
        Some(step) => ray(origin, step),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::sq;

    fn keys(squares: &[Square]) -> Vec<String> {
        squares.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diagonal_ray_toward_corner() {
        // (2,3) through (1,2): c4 through b3
        assert_eq!(keys(&ray_through(sq("c4"), sq("b3"))), ["b3", "a2"]);
    }

    #[test]
    fn anti_diagonal_ray_runs_past_through_point() {
        // (2,4) through (5,1): c5 through f2
        assert_eq!(
            keys(&ray_through(sq("c5"), sq("f2"))),
            ["d4", "e3", "f2", "g1"]
        );
        // (2,7) through (4,5)
        assert_eq!(
            keys(&ray_through(sq("c8"), sq("e6"))),
            ["d7", "e6", "f5", "g4", "h3"]
        );
    }

    #[test]
    fn orthogonal_rays() {
        assert_eq!(keys(&ray_through(sq("e6"), sq("e8"))), ["e7", "e8"]);
        assert_eq!(keys(&ray_through(sq("d5"), sq("c5"))), ["c5", "b5", "a5"]);
    }

    #[test]
    fn unaligned_or_equal_points_give_empty_ray() {
        assert!(ray_through(sq("a1"), sq("b3")).is_empty());
        assert!(ray_through(sq("d4"), sq("d4")).is_empty());
    }

    #[test]
    fn alignment_classifies_slopes() {
        assert_eq!(alignment(sq("a1"), sq("a8")), Some(Axis::Orthogonal));
        assert_eq!(alignment(sq("a1"), sq("h1")), Some(Axis::Orthogonal));
        assert_eq!(alignment(sq("a1"), sq("h8")), Some(Axis::Diagonal));
        assert_eq!(alignment(sq("a8"), sq("h1")), Some(Axis::Diagonal));
        assert_eq!(alignment(sq("a1"), sq("c2")), None);
    }

    #[test]
    fn ray_from_edge_is_empty() {
        assert!(ray(sq("h4"), (1, 0)).is_empty());
    }
}
