//! Beam Grid Puzzle Library
//!
//! Core rules and solver for a sliding puzzle where same-colored pieces
//! sharing a row or column connect with a beam. Provides the board model,
//! the beam rule engine, an interactive move pipeline with undo/redo, and
//! a breadth-first minimum-move solver.

pub mod arrangement;
pub mod beams;
pub mod board;
pub mod color;
pub mod engine;
pub mod levels;
pub mod solver;

pub use arrangement::Arrangement;
pub use board::{Board, Laser, Piece, Tile};
pub use color::Color;
pub use engine::{Effect, MoveOutcome, Session, Status};
pub use solver::{Outcome, SolverConfig};
