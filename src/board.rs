//! Board model: tiles, pieces, lasers, objectives.
//!
//! The tile grid is fixed at construction; the piece placement is held as an
//! [`Arrangement`] and is the only mutable part. Lasers are derived values
//! maintained by [`Board::rebuild_lasers`].

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::arrangement::Arrangement;
use crate::beams::{self, Mode};
use crate::color::Color;

/// A cell position `(x, y)`, origin at the bottom-left corner.
pub type Pos = (i32, i32);

/// Largest supported board edge. Bounded by the 6-bit coordinate fields of
/// the packed piece encoding.
pub const MAX_EDGE: i32 = 64;

/// Per-cell traits fixed at board construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub glass: bool,
    pub goal: Option<Color>,
    pub painter: Option<Color>,
}

impl Tile {
    /// An open tile with no goal, painter, or glass.
    pub const OPEN: Tile = Tile {
        glass: false,
        goal: None,
        painter: None,
    };
}

/// A colored piece at a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub pos: Pos,
    pub color: Color,
}

impl Piece {
    pub const fn new(pos: Pos, color: Color) -> Piece {
        Piece { pos, color }
    }
}

/// A beam between two same-colored pieces, endpoints ordered along the
/// shared axis. Equality and hashing use the endpoints only.
#[derive(Clone, Copy, Debug)]
pub struct Laser {
    start: Pos,
    end: Pos,
    color: Color,
}

impl Laser {
    /// Creates a laser between `a` and `b`, normalizing endpoint order.
    pub fn new(a: Pos, b: Pos, color: Color) -> Laser {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Laser { start, end, color }
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn end(&self) -> Pos {
        self.end
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_horizontal(&self) -> bool {
        self.start.1 == self.end.1 && self.start.0 != self.end.0
    }

    /// Whether `pos` is one of the two endpoints.
    pub fn touches(&self, pos: Pos) -> bool {
        self.start == pos || self.end == pos
    }
}

impl PartialEq for Laser {
    fn eq(&self, other: &Laser) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for Laser {}

impl std::hash::Hash for Laser {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

/// Level metadata carried alongside the grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct LevelMeta {
    /// Identifier in the level set.
    pub id: u32,
    /// Move count for a good solution.
    pub par: u32,
    /// Move count for an optimal solution.
    pub perfect: u32,
}

/// Construction-time validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("board dimensions {width}x{height} exceed the supported {MAX_EDGE}x{MAX_EDGE}")]
    BoardTooLarge { width: i32, height: i32 },
    #[error("tile grid has {actual} cells, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("piece at {pos:?} is out of bounds")]
    PieceOutOfBounds { pos: Pos },
    #[error("piece at {pos:?} sits on a glass tile")]
    PieceOnGlass { pos: Pos },
    #[error("two pieces share the cell {pos:?}")]
    DuplicatePiece { pos: Pos },
}

/// The fixed tile grid plus the mutable piece placement.
#[derive(Clone, Debug)]
pub struct Board {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    pieces: Arrangement,
    lasers: FxHashSet<Laser>,
    objectives: Vec<(Color, usize)>,
    goal_tiles: Vec<Pos>,
    meta: LevelMeta,
}

impl Board {
    /// Creates an empty board with open tiles.
    pub fn new(width: i32, height: i32) -> Result<Board, BoardError> {
        if !(1..=MAX_EDGE).contains(&width) || !(1..=MAX_EDGE).contains(&height) {
            return Err(BoardError::BoardTooLarge { width, height });
        }
        Ok(Board {
            width,
            height,
            tiles: vec![Tile::OPEN; (width * height) as usize],
            pieces: Arrangement::empty(width, height),
            lasers: FxHashSet::default(),
            objectives: Vec::new(),
            goal_tiles: Vec::new(),
            meta: LevelMeta::default(),
        })
    }

    /// Constructs a board from its parts, validating the layout and
    /// populating the goal-tile cache. `tiles` is indexed `y * width + x`.
    pub fn from_parts(
        width: i32,
        height: i32,
        tiles: Vec<Tile>,
        pieces: Vec<Piece>,
        objectives: Vec<(Color, usize)>,
        meta: LevelMeta,
    ) -> Result<Board, BoardError> {
        let mut board = Board::new(width, height)?;
        if tiles.len() != board.tiles.len() {
            return Err(BoardError::DimensionMismatch {
                expected: board.tiles.len(),
                actual: tiles.len(),
            });
        }
        board.tiles = tiles;
        for piece in pieces {
            board.put_piece(piece)?.map_or(Ok(()), |_| {
                Err(BoardError::DuplicatePiece { pos: piece.pos })
            })?;
        }
        board.objectives = objectives;
        board.meta = meta;
        board.goal_tiles = board
            .iter_positions()
            .filter(|&pos| board.tile_at(pos).goal.is_some())
            .collect();
        board.rebuild_lasers();
        Ok(board)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn meta(&self) -> LevelMeta {
        self.meta
    }

    pub fn in_bounds(&self, (x, y): Pos) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, (x, y): Pos) -> usize {
        (y * self.width + x) as usize
    }

    /// Iterates every cell position, x-major.
    pub fn iter_positions(&self) -> impl Iterator<Item = Pos> + '_ {
        let (w, h) = (self.width, self.height);
        (0..w).flat_map(move |x| (0..h).map(move |y| (x, y)))
    }

    /// Tile at a position. Callers must pass an in-bounds position.
    pub fn tile_at(&self, pos: Pos) -> &Tile {
        &self.tiles[self.index(pos)]
    }

    pub fn piece_at(&self, pos: Pos) -> Option<Piece> {
        self.pieces
            .color_at(pos)
            .map(|color| Piece::new(pos, color))
    }

    /// Current piece placement.
    pub fn arrangement(&self) -> &Arrangement {
        &self.pieces
    }

    /// Adds a piece, returning the piece previously at that cell.
    pub fn put_piece(&mut self, piece: Piece) -> Result<Option<Piece>, BoardError> {
        if !self.in_bounds(piece.pos) {
            return Err(BoardError::PieceOutOfBounds { pos: piece.pos });
        }
        if self.tile_at(piece.pos).glass {
            return Err(BoardError::PieceOnGlass { pos: piece.pos });
        }
        let previous = self.piece_at(piece.pos);
        self.pieces.set(piece.pos, Some(piece.color));
        Ok(previous)
    }

    /// Removes and returns the piece at a cell, if any.
    pub fn remove_piece_at(&mut self, pos: Pos) -> Option<Piece> {
        let previous = self.piece_at(pos);
        if previous.is_some() {
            self.pieces.set(pos, None);
        }
        previous
    }

    /// Recolors the piece at `pos` in place (a painter firing).
    pub(crate) fn repaint(&mut self, pos: Pos, color: Color) {
        debug_assert!(self.pieces.color_at(pos).is_some());
        self.pieces.set(pos, Some(color));
    }

    /// Moves the piece at `from` to `to` if `to` is orthogonally adjacent,
    /// glass-free, and unoccupied. Anything else is a no-op returning
    /// `false` — never an error.
    pub fn move_piece(&mut self, from: Pos, to: Pos) -> bool {
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        if !self.can_move(from, to) {
            return false;
        }
        self.pieces.set(from, None);
        self.pieces.set(to, Some(piece.color));
        true
    }

    /// Whether a piece at `from` may step onto `to`.
    pub fn can_move(&self, from: Pos, to: Pos) -> bool {
        places_adjacent(from, to) && self.is_passable(to, &self.pieces)
    }

    /// Whether `pos` is in bounds, glass-free, and empty in `arr`.
    pub fn is_passable(&self, pos: Pos, arr: &Arrangement) -> bool {
        self.in_bounds(pos) && !self.tile_at(pos).glass && arr.color_at(pos).is_none()
    }

    /// Replaces the piece placement wholesale and rederives the lasers.
    /// Used by undo/redo; the arrangement must share the board's size.
    pub fn reset_pieces(&mut self, arr: Arrangement) {
        debug_assert_eq!((arr.width(), arr.height()), (self.width, self.height));
        self.pieces = arr;
        self.rebuild_lasers();
    }

    /// Whether two tiles have the same glass, goal, and painter traits.
    pub fn tiles_similar(&self, a: Pos, b: Pos) -> bool {
        self.tile_at(a) == self.tile_at(b)
    }

    // ---- lasers ----

    /// The active laser set, derived from the current placement.
    pub fn lasers(&self) -> &FxHashSet<Laser> {
        &self.lasers
    }

    /// Removes a laser from the active set (a broken attachment).
    pub fn remove_laser(&mut self, laser: &Laser) -> bool {
        self.lasers.remove(laser)
    }

    /// Rederives the whole laser set by running the rule engine in
    /// full-rebuild mode for every piece. Pieces that the static layout
    /// already condemns are logged, not removed: a level author placing an
    /// obstruction between anchors gets a warning instead of silent data
    /// loss.
    pub fn rebuild_lasers(&mut self) {
        self.lasers.clear();
        let positions: Vec<Piece> = self.pieces.pieces().collect();
        for piece in positions {
            let report = beams::form_beams(&self.pieces, piece.pos, piece.color, Mode::FullRebuild);
            self.lasers.extend(report.formed);
            for cancelled in &report.cancelled {
                self.lasers.remove(cancelled);
            }
            if !report.destroyed.is_empty() {
                log::warn!(
                    "static layout destroys pieces at {:?} (beam through {:?})",
                    report.destroyed,
                    piece.pos
                );
            }
        }
    }

    /// Number of active lasers of one color.
    pub fn laser_count(&self, color: Color) -> usize {
        self.lasers.iter().filter(|l| l.color() == color).count()
    }

    /// Number of active lasers of every color. This is the "match any
    /// color" wildcard query, kept as its own operation.
    pub fn laser_count_all(&self) -> usize {
        self.lasers.len()
    }

    // ---- objectives and win check ----

    pub fn objectives(&self) -> &[(Color, usize)] {
        &self.objectives
    }

    /// Required beam count for one objective color, or `None` if that
    /// color is not an objective on this level.
    pub fn objective_count(&self, color: Color) -> Option<usize> {
        self.objectives
            .iter()
            .find(|(c, _)| *c == color)
            .map(|&(_, n)| n)
    }

    /// Sum of the required beam counts over all objective colors — the
    /// wildcard form of [`Board::objective_count`].
    pub fn total_objective_count(&self) -> usize {
        self.objectives.iter().map(|&(_, n)| n).sum()
    }

    /// Cached goal-tile positions, immutable after construction.
    pub fn goal_tiles(&self) -> &[Pos] {
        &self.goal_tiles
    }

    /// Whether the goal at `pos` holds a matching-colored piece in `arr`.
    pub fn is_goal_met(&self, pos: Pos, arr: &Arrangement) -> bool {
        self.tile_at(pos).goal.is_some() && arr.color_at(pos) == self.tile_at(pos).goal
    }

    pub fn goals_filled(&self, arr: &Arrangement) -> usize {
        self.goal_tiles
            .iter()
            .filter(|&&pos| self.is_goal_met(pos, arr))
            .count()
    }

    /// Win check against the board's own placement.
    pub fn is_won(&self) -> bool {
        self.is_won_with(&self.pieces)
    }

    /// True iff every goal tile holds a matching piece and, for every
    /// objective color, the heuristic beam count equals the requirement.
    pub fn is_won_with(&self, arr: &Arrangement) -> bool {
        if self.goals_filled(arr) != self.goal_tiles.len() {
            return false;
        }
        self.objectives
            .iter()
            .all(|&(color, required)| self.heuristic_beam_count(arr, color) == required)
    }

    /// Heuristic beam count used only by the win check: each row and each
    /// column with `k >= 2` pieces of `color` contributes `k - 1`,
    /// ignoring any pieces interposed between them.
    ///
    /// This deliberately diverges from the strict rule engine, which
    /// requires anchored spans to be obstruction-free. States reached
    /// through legal moves cannot expose the difference (obstructions are
    /// destroyed during formation), but a statically authored layout can:
    /// the win check may then count beams that do not visually exist.
    /// Kept as-is pending a product decision.
    pub fn heuristic_beam_count(&self, arr: &Arrangement, color: Color) -> usize {
        let mut sum = 0;
        let mut column_counts = vec![0usize; self.width as usize];
        for y in 0..self.height {
            let mut row_count = 0;
            for x in 0..self.width {
                if arr.color_at((x, y)) == Some(color) {
                    row_count += 1;
                    column_counts[x as usize] += 1;
                }
            }
            if row_count >= 2 {
                sum += row_count - 1;
            }
        }
        for count in column_counts {
            if count >= 2 {
                sum += count - 1;
            }
        }
        sum
    }

    /// Star rating for a finished level: 3 at or under perfect, 2 at or
    /// under par, 1 otherwise.
    pub fn stars_for(&self, moves: u32) -> u32 {
        if moves <= self.meta.perfect {
            3
        } else if moves <= self.meta.par {
            2
        } else {
            1
        }
    }

    // ---- rendering ----

    /// Renders the current placement; see [`Board::render_with`].
    pub fn render(&self) -> String {
        self.render_with(&self.pieces)
    }

    /// Plain-text rendering, rows top to bottom. Pieces show as uppercase
    /// color letters, glass as `#`, goals as lowercase color letters,
    /// painters as `*`, open tiles as `.`.
    pub fn render_with(&self, arr: &Arrangement) -> String {
        let mut out = String::new();
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let tile = self.tile_at((x, y));
                let glyph = match arr.color_at((x, y)) {
                    Some(color) => color.glyph(),
                    None if tile.glass => '#',
                    None => match (tile.goal, tile.painter) {
                        (Some(goal), _) => goal.glyph().to_ascii_lowercase(),
                        (None, Some(_)) => '*',
                        (None, None) => '.',
                    },
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

/// Whether two cells are orthogonally adjacent.
fn places_adjacent((x1, y1): Pos, (x2, y2): Pos) -> bool {
    ((x1 - x2).abs() == 1 && y1 == y2) || ((y1 - y2).abs() == 1 && x1 == x2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tiles(w: i32, h: i32) -> Vec<Tile> {
        vec![Tile::OPEN; (w * h) as usize]
    }

    fn plain_board(w: i32, h: i32, pieces: Vec<Piece>) -> Board {
        Board::from_parts(w, h, open_tiles(w, h), pieces, vec![], LevelMeta::default()).unwrap()
    }

    #[test]
    fn test_piece_on_glass_is_rejected() {
        let mut tiles = open_tiles(3, 3);
        tiles[4].glass = true;
        let err = Board::from_parts(
            3,
            3,
            tiles,
            vec![Piece::new((1, 1), Color::Red)],
            vec![],
            LevelMeta::default(),
        )
        .unwrap_err();
        assert_eq!(err, BoardError::PieceOnGlass { pos: (1, 1) });
    }

    #[test]
    fn test_mismatched_tile_grid_is_rejected() {
        let err =
            Board::from_parts(3, 3, open_tiles(2, 2), vec![], vec![], LevelMeta::default())
                .unwrap_err();
        assert_eq!(
            err,
            BoardError::DimensionMismatch {
                expected: 9,
                actual: 4
            }
        );
    }

    #[test]
    fn test_duplicate_pieces_are_rejected() {
        let pieces = vec![
            Piece::new((0, 0), Color::Red),
            Piece::new((0, 0), Color::Blue),
        ];
        let err = Board::from_parts(2, 2, open_tiles(2, 2), pieces, vec![], LevelMeta::default())
            .unwrap_err();
        assert_eq!(err, BoardError::DuplicatePiece { pos: (0, 0) });
    }

    #[test]
    fn test_move_changes_only_the_moved_piece() {
        let mut board = plain_board(
            3,
            3,
            vec![
                Piece::new((0, 0), Color::Red),
                Piece::new((2, 2), Color::Blue),
            ],
        );
        assert!(board.move_piece((0, 0), (1, 0)));
        assert_eq!(board.piece_at((1, 0)), Some(Piece::new((1, 0), Color::Red)));
        assert_eq!(board.piece_at((0, 0)), None);
        assert_eq!(
            board.piece_at((2, 2)),
            Some(Piece::new((2, 2), Color::Blue))
        );
    }

    #[test]
    fn test_invalid_moves_are_noops() {
        let mut board = plain_board(
            3,
            1,
            vec![
                Piece::new((0, 0), Color::Red),
                Piece::new((1, 0), Color::Blue),
            ],
        );
        // occupied
        assert!(!board.move_piece((0, 0), (1, 0)));
        // non-adjacent
        assert!(!board.move_piece((0, 0), (2, 0)));
        // out of bounds
        assert!(!board.move_piece((0, 0), (-1, 0)));
        // no piece at source
        assert!(!board.move_piece((2, 0), (1, 0)));
        assert_eq!(board.piece_at((0, 0)), Some(Piece::new((0, 0), Color::Red)));
    }

    #[test]
    fn test_heuristic_beam_count_ignores_obstructions() {
        // R B R in one row: the heuristic still counts one red beam even
        // though the blue piece interrupts the span.
        let board = plain_board(
            3,
            1,
            vec![
                Piece::new((0, 0), Color::Red),
                Piece::new((1, 0), Color::Blue),
                Piece::new((2, 0), Color::Red),
            ],
        );
        assert_eq!(board.heuristic_beam_count(board.arrangement(), Color::Red), 1);
        assert_eq!(
            board.heuristic_beam_count(board.arrangement(), Color::Blue),
            0
        );
    }

    #[test]
    fn test_is_won_requires_goals_and_objectives() {
        let mut tiles = open_tiles(3, 1);
        tiles[1].goal = Some(Color::Red);
        let board = Board::from_parts(
            3,
            1,
            tiles.clone(),
            vec![
                Piece::new((1, 0), Color::Red),
                Piece::new((2, 0), Color::Red),
            ],
            vec![(Color::Red, 1)],
            LevelMeta::default(),
        )
        .unwrap();
        assert!(board.is_won());

        // flip the goal occupant's color
        let wrong_piece = Board::from_parts(
            3,
            1,
            tiles.clone(),
            vec![
                Piece::new((1, 0), Color::Blue),
                Piece::new((2, 0), Color::Red),
            ],
            vec![(Color::Red, 1)],
            LevelMeta::default(),
        )
        .unwrap();
        assert!(!wrong_piece.is_won());

        // flip the beam-count requirement
        let wrong_count = Board::from_parts(
            3,
            1,
            tiles,
            vec![
                Piece::new((1, 0), Color::Red),
                Piece::new((2, 0), Color::Red),
            ],
            vec![(Color::Red, 2)],
            LevelMeta::default(),
        )
        .unwrap();
        assert!(!wrong_count.is_won());
    }

    #[test]
    fn test_laser_equality_is_endpoint_only() {
        let a = Laser::new((0, 0), (3, 0), Color::Red);
        let b = Laser::new((3, 0), (0, 0), Color::Blue);
        assert_eq!(a, b);
        assert_eq!(a.start(), (0, 0));
        assert_eq!(b.start(), (0, 0));
    }

    #[test]
    fn test_wildcard_counts_are_separate_operations() {
        let board = Board::from_parts(
            4,
            1,
            open_tiles(4, 1),
            vec![
                Piece::new((0, 0), Color::Red),
                Piece::new((1, 0), Color::Red),
            ],
            vec![(Color::Red, 1), (Color::Blue, 2)],
            LevelMeta::default(),
        )
        .unwrap();
        assert_eq!(board.objective_count(Color::Red), Some(1));
        assert_eq!(board.objective_count(Color::Green), None);
        assert_eq!(board.total_objective_count(), 3);
        assert_eq!(board.laser_count(Color::Red), 1);
        assert_eq!(board.laser_count_all(), 1);
    }

    #[test]
    fn test_render_glyphs() {
        let mut tiles = open_tiles(3, 2);
        tiles[0].glass = true; // (0, 0)
        tiles[2].goal = Some(Color::Blue); // (2, 0)
        tiles[4].painter = Some(Color::Green); // (1, 1)
        let board = Board::from_parts(
            3,
            2,
            tiles,
            vec![Piece::new((0, 1), Color::Red)],
            vec![],
            LevelMeta::default(),
        )
        .unwrap();
        assert_eq!(board.render(), "R*.\n#.b\n");
    }
}
