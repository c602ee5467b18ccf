pub mod board;
pub mod cell;
pub mod check;
pub mod error;
pub mod geometry;
pub mod legality;
pub mod moves;
pub mod piece;
pub mod snapshot;
pub mod square;
