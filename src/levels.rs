//! Built-in demo levels, defined in code.

use crate::board::{Board, BoardError, LevelMeta, Piece, Tile};
use crate::color::Color;

/// All built-in levels, in id order.
pub fn builtin_levels() -> Result<Vec<Board>, BoardError> {
    Ok(vec![first_beam()?, boxed_in()?, painters_crossing()?])
}

/// The built-in level with the given id.
pub fn builtin_level(id: u32) -> Result<Option<Board>, BoardError> {
    Ok(builtin_levels()?.into_iter().find(|b| b.meta().id == id))
}

/// Two red anchors with the goal between them; one slide forms the first
/// beam and wins.
fn first_beam() -> Result<Board, BoardError> {
    let mut tiles = vec![Tile::OPEN; 3];
    tiles[1].goal = Some(Color::Red);
    Board::from_parts(
        3,
        1,
        tiles,
        vec![Piece::new((0, 0), Color::Red), Piece::new((2, 0), Color::Red)],
        vec![(Color::Red, 1)],
        LevelMeta {
            id: 1,
            par: 1,
            perfect: 1,
        },
    )
}

/// A lone piece walled off from its goal by glass. Has no solution; kept
/// as the showcase input for the solver's exhaustion verdict.
fn boxed_in() -> Result<Board, BoardError> {
    let mut tiles = vec![Tile::OPEN; 9];
    tiles[1].glass = true; // (1, 0)
    tiles[3].glass = true; // (0, 1)
    tiles[8].goal = Some(Color::Red); // (2, 2)
    Board::from_parts(
        3,
        3,
        tiles,
        vec![Piece::new((0, 0), Color::Red)],
        vec![],
        LevelMeta {
            id: 2,
            par: 0,
            perfect: 0,
        },
    )
}

/// Two colors, a glass pillar, and a painter off the short path. The red
/// goal plus a one-beam objective solve in a single slide; the painter
/// lets the blue piece join the red side the long way around.
fn painters_crossing() -> Result<Board, BoardError> {
    let mut tiles = vec![Tile::OPEN; 12];
    tiles[1].goal = Some(Color::Red); // (1, 0)
    tiles[6].glass = true; // (2, 1)
    tiles[8].painter = Some(Color::Red); // (0, 2)
    Board::from_parts(
        4,
        3,
        tiles,
        vec![
            Piece::new((0, 0), Color::Red),
            Piece::new((3, 0), Color::Red),
            Piece::new((1, 2), Color::Blue),
        ],
        vec![(Color::Red, 1)],
        LevelMeta {
            id: 3,
            par: 2,
            perfect: 1,
        },
    )
}
