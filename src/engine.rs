//! Move resolution pipeline and history.
//!
//! A [`Session`] owns the board, the move counter, and the encoded history
//! stack — the explicit state that replaces any notion of a globally
//! current move. Each committed slide is applied atomically: either every
//! step lands and one snapshot is pushed, or the board is restored to the
//! pre-move placement and nothing is recorded.

use thiserror::Error;

use crate::arrangement::Arrangement;
use crate::beams::{self, Axis, Mode};
use crate::board::{Board, Laser, Piece, Pos};
use crate::color::Color;

/// One named state change inside a resolved move, in application order.
/// The presentation layer animates these at its own pacing; the core
/// guarantees set and order only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// A laser perpendicular to the move detached and was removed.
    BeamBroken(Laser),
    /// A laser on the move's own axis keeps tracking the piece.
    BeamMovedAlong(Laser),
    PieceMoved { from: Pos, to: Pos },
    PiecePainted { pos: Pos, from: Color, to: Color },
    BeamFormed(Laser),
    PieceDestroyed(Piece),
}

/// Session status after the latest move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    InProgress,
    Won,
    /// A piece was destroyed; the level must be undone or reset.
    Destroyed,
}

/// Result of applying a slide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { effects: Vec<Effect>, status: Status },
    /// The request was invalid (blocked, non-adjacent, or out-of-bounds
    /// destination); the board is untouched.
    NotMoved,
}

/// Pipeline misuse, as opposed to a merely invalid destination.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("a move path needs the origin and at least one step")]
    EmptyPath,
    #[error("no piece at the path origin {pos:?}")]
    NoPieceAtOrigin { pos: Pos },
}

/// Interactive game session: board + move counter + undo/redo history.
#[derive(Clone, Debug)]
pub struct Session {
    board: Board,
    move_count: usize,
    /// Encoded snapshots; index `i` is the placement after `i` moves.
    history: Vec<Vec<u8>>,
    status: Status,
}

enum StepEnd {
    Continue,
    /// Something was destroyed; the slide stops here.
    Destruction,
}

impl Session {
    pub fn new(board: Board) -> Session {
        let initial = board.arrangement().encode();
        Session {
            board,
            move_count: 0,
            history: vec![initial],
            status: Status::InProgress,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn can_undo(&self) -> bool {
        self.move_count > 0
    }

    pub fn can_redo(&self) -> bool {
        self.move_count + 1 < self.history.len()
    }

    /// Star rating for the current move count.
    pub fn stars(&self) -> u32 {
        self.board.stars_for(self.move_count as u32)
    }

    /// Applies one committed slide along `path` (origin plus adjacent
    /// steps). Stops early if anything is destroyed. A step onto an
    /// occupied, glass, out-of-bounds, or non-adjacent cell rolls the
    /// whole slide back and reports [`MoveOutcome::NotMoved`].
    pub fn apply_move(&mut self, path: &[Pos]) -> Result<MoveOutcome, MoveError> {
        let [origin, steps @ ..] = path else {
            return Err(MoveError::EmptyPath);
        };
        if steps.is_empty() {
            return Err(MoveError::EmptyPath);
        }
        if self.board.piece_at(*origin).is_none() {
            return Err(MoveError::NoPieceAtOrigin { pos: *origin });
        }

        // Retained so an in-flight move can be rolled back without
        // recomputation.
        let before = self.board.arrangement().clone();
        let mut effects = Vec::new();
        let mut destroyed = false;

        let mut from = *origin;
        for &to in steps {
            if !self.board.can_move(from, to) {
                self.board.reset_pieces(before);
                return Ok(MoveOutcome::NotMoved);
            }
            match self.apply_step(from, to, &mut effects) {
                StepEnd::Continue => from = to,
                StepEnd::Destruction => {
                    destroyed = true;
                    break;
                }
            }
        }

        // Commit: a fresh move discards any stale redo future.
        self.history.truncate(self.move_count + 1);
        self.history.push(self.board.arrangement().encode());
        self.move_count += 1;

        self.status = if destroyed {
            Status::Destroyed
        } else if self.board.is_won() {
            Status::Won
        } else {
            Status::InProgress
        };
        Ok(MoveOutcome::Moved {
            effects,
            status: self.status,
        })
    }

    /// One pre-validated step of the slide.
    fn apply_step(&mut self, from: Pos, to: Pos, effects: &mut Vec<Effect>) -> StepEnd {
        let move_axis = if from.1 == to.1 {
            Axis::Horizontal
        } else {
            Axis::Vertical
        };

        // Attached lasers: a perpendicular one breaks, one on the move
        // axis follows the piece.
        let (broken, moved_along) = match move_axis {
            Axis::Horizontal => (
                attached_laser(&self.board, from, false),
                attached_laser(&self.board, from, true),
            ),
            Axis::Vertical => (
                attached_laser(&self.board, from, true),
                attached_laser(&self.board, from, false),
            ),
        };
        if let Some(laser) = broken {
            self.board.remove_laser(&laser);
            effects.push(Effect::BeamBroken(laser));
        }
        if let Some(laser) = moved_along {
            effects.push(Effect::BeamMovedAlong(laser));
        }

        self.board.move_piece(from, to);
        effects.push(Effect::PieceMoved { from, to });
        let Some(mover) = self.board.piece_at(to) else {
            return StepEnd::Continue;
        };
        let mut color = mover.color;

        if beams::is_self_destroyed(self.board.arrangement(), to, color) {
            self.destroy_mover(to, color, effects);
            return StepEnd::Destruction;
        }

        let mut painted = false;
        if let Some(paint) = self.board.tile_at(to).painter {
            if paint != color {
                self.board.repaint(to, paint);
                effects.push(Effect::PiecePainted {
                    pos: to,
                    from: color,
                    to: paint,
                });
                painted = true;
                color = paint;
                if beams::is_self_destroyed(self.board.arrangement(), to, color) {
                    self.destroy_mover(to, color, effects);
                    return StepEnd::Destruction;
                }
            }
        }

        let report = beams::form_beams(
            self.board.arrangement(),
            to,
            color,
            Mode::Incremental { move_axis, painted },
        );
        for laser in &report.formed {
            effects.push(Effect::BeamFormed(*laser));
        }
        let any_victims = !report.destroyed.is_empty();
        for victim in report.destroyed {
            match self.board.remove_piece_at(victim) {
                Some(piece) => effects.push(Effect::PieceDestroyed(piece)),
                None => {
                    // Fallback inherited from the replay protocol: when a
                    // recorded victim cannot be located, attribute the
                    // destruction to the mover itself. Ambiguous under
                    // multi-piece destruction; kept as documented.
                    log::warn!(
                        "destroyed piece missing at {:?}; attributing to the mover",
                        victim
                    );
                    if let Some(piece) = self.board.remove_piece_at(to) {
                        effects.push(Effect::PieceDestroyed(piece));
                    }
                }
            }
        }
        self.board.rebuild_lasers();
        if any_victims {
            StepEnd::Destruction
        } else {
            StepEnd::Continue
        }
    }

    fn destroy_mover(&mut self, pos: Pos, color: Color, effects: &mut Vec<Effect>) {
        self.board.remove_piece_at(pos);
        effects.push(Effect::PieceDestroyed(Piece::new(pos, color)));
        self.board.rebuild_lasers();
    }

    /// Steps back one move. Returns `false` at the bottom of the history.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.restore(self.move_count - 1);
        self.refresh_status();
        true
    }

    /// Steps forward one move if a redo future exists.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.restore(self.move_count + 1);
        self.refresh_status();
        true
    }

    /// Back to the initial placement, dropping all history.
    pub fn reset(&mut self) {
        self.restore(0);
        self.history.truncate(1);
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        self.status = if self.board.is_won() {
            Status::Won
        } else {
            Status::InProgress
        };
    }

    /// Restores the snapshot at `index`. A corrupt snapshot falls back to
    /// the nearest earlier valid one.
    fn restore(&mut self, index: usize) {
        let (w, h) = (self.board.width(), self.board.height());
        for i in (0..=index).rev() {
            match Arrangement::decode(&self.history[i], w, h) {
                Ok(arr) => {
                    self.board.reset_pieces(arr);
                    self.move_count = i;
                    return;
                }
                Err(err) => {
                    log::warn!("history snapshot {i} is corrupt ({err}); falling back");
                }
            }
        }
        log::error!("no valid history snapshot; keeping the current placement");
    }
}

/// The laser touching `pos` on the given axis, if there is exactly one.
/// More than one touching laser on an axis is treated as none.
fn attached_laser(board: &Board, pos: Pos, horizontal: bool) -> Option<Laser> {
    let mut found = None;
    for laser in board.lasers() {
        if laser.touches(pos) && laser.is_horizontal() == horizontal {
            if found.is_some() {
                return None;
            }
            found = Some(*laser);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{LevelMeta, Tile};

    fn board(w: i32, h: i32, pieces: &[(Pos, Color)]) -> Board {
        board_with(w, h, pieces, |_| {})
    }

    fn board_with(
        w: i32,
        h: i32,
        pieces: &[(Pos, Color)],
        edit: impl FnOnce(&mut Vec<Tile>),
    ) -> Board {
        let mut tiles = vec![Tile::OPEN; (w * h) as usize];
        edit(&mut tiles);
        let pieces = pieces
            .iter()
            .map(|&(pos, color)| Piece::new(pos, color))
            .collect();
        Board::from_parts(w, h, tiles, pieces, vec![], LevelMeta::default()).unwrap()
    }

    fn moved(outcome: MoveOutcome) -> Vec<Effect> {
        match outcome {
            MoveOutcome::Moved { effects, .. } => effects,
            MoveOutcome::NotMoved => panic!("expected the move to apply"),
        }
    }

    #[test]
    fn test_step_into_beam_forms_and_reports() {
        let mut session = Session::new(board(
            3,
            2,
            &[((0, 1), Color::Red), ((2, 0), Color::Red)],
        ));
        let effects = moved(session.apply_move(&[(0, 1), (0, 0)]).unwrap());
        assert_eq!(
            effects,
            vec![
                Effect::PieceMoved {
                    from: (0, 1),
                    to: (0, 0)
                },
                Effect::BeamFormed(Laser::new((0, 0), (2, 0), Color::Red)),
            ]
        );
        assert!(session
            .board()
            .lasers()
            .contains(&Laser::new((0, 0), (2, 0), Color::Red)));
        assert_eq!(session.move_count(), 1);
    }

    #[test]
    fn test_perpendicular_laser_breaks() {
        // Vertical red beam; its lower anchor slides right.
        let mut session = Session::new(board(
            2,
            3,
            &[((0, 0), Color::Red), ((0, 2), Color::Red)],
        ));
        let beam = Laser::new((0, 0), (0, 2), Color::Red);
        assert!(session.board().lasers().contains(&beam));

        let effects = moved(session.apply_move(&[(0, 0), (1, 0)]).unwrap());
        assert_eq!(effects[0], Effect::BeamBroken(beam));
        assert_eq!(
            effects[1],
            Effect::PieceMoved {
                from: (0, 0),
                to: (1, 0)
            }
        );
        assert!(session.board().lasers().is_empty());
    }

    #[test]
    fn test_gliding_along_a_beam_reports_no_new_formation() {
        // Horizontal beam R(0,0)-R(3,0); the right anchor glides left.
        let mut session = Session::new(board(
            4,
            1,
            &[((0, 0), Color::Red), ((3, 0), Color::Red)],
        ));
        let effects = moved(session.apply_move(&[(3, 0), (2, 0)]).unwrap());
        assert_eq!(
            effects,
            vec![
                Effect::BeamMovedAlong(Laser::new((0, 0), (3, 0), Color::Red)),
                Effect::PieceMoved {
                    from: (3, 0),
                    to: (2, 0)
                },
            ]
        );
        // The active set tracked the endpoint.
        assert!(session
            .board()
            .lasers()
            .contains(&Laser::new((0, 0), (2, 0), Color::Red)));
    }

    #[test]
    fn test_two_touching_lasers_on_one_axis_detach_nothing() {
        // R(0,0)-R(2,0) and R(2,0)-R(4,0): the shared anchor moves up.
        // The ambiguity rule treats the pair as no attachment, so no
        // break is reported.
        let mut session = Session::new(board(
            5,
            2,
            &[
                ((0, 0), Color::Red),
                ((2, 0), Color::Red),
                ((4, 0), Color::Red),
            ],
        ));
        let effects = moved(session.apply_move(&[(2, 0), (2, 1)]).unwrap());
        assert!(effects
            .iter()
            .all(|e| !matches!(e, Effect::BeamBroken(_) | Effect::BeamMovedAlong(_))));
    }

    #[test]
    fn test_painter_recolors_and_reports_formation() {
        // Painter turns the blue mover red; the repainted piece then
        // anchors a beam on the move's own axis (painted pieces are
        // exempt from suppression).
        let mut session = Session::new(board_with(
            3,
            1,
            &[((0, 0), Color::Blue), ((2, 0), Color::Red)],
            |tiles| tiles[1].painter = Some(Color::Red),
        ));
        let effects = moved(session.apply_move(&[(0, 0), (1, 0)]).unwrap());
        assert_eq!(
            effects,
            vec![
                Effect::PieceMoved {
                    from: (0, 0),
                    to: (1, 0)
                },
                Effect::PiecePainted {
                    pos: (1, 0),
                    from: Color::Blue,
                    to: Color::Red
                },
                Effect::BeamFormed(Laser::new((1, 0), (2, 0), Color::Red)),
            ]
        );
    }

    #[test]
    fn test_criss_cross_destroys_the_mover_and_stops_the_slide() {
        // Moving red down between two blues destroys it; the remaining
        // path step is never taken.
        let mut session = Session::new(board(
            3,
            2,
            &[
                ((0, 0), Color::Blue),
                ((2, 0), Color::Blue),
                ((1, 1), Color::Red),
            ],
        ));
        let outcome = session.apply_move(&[(1, 1), (1, 0), (0, 0)]).unwrap();
        let MoveOutcome::Moved { effects, status } = outcome else {
            panic!("expected the move to apply");
        };
        assert_eq!(status, Status::Destroyed);
        assert_eq!(
            effects.last(),
            Some(&Effect::PieceDestroyed(Piece::new((1, 0), Color::Red)))
        );
        assert_eq!(session.board().piece_at((1, 0)), None);
        // No painting or formation after destruction.
        assert!(effects
            .iter()
            .all(|e| !matches!(e, Effect::PiecePainted { .. } | Effect::BeamFormed(_))));
    }

    #[test]
    fn test_cancellation_destroys_between_but_forms_no_span() {
        // R B . G R with a red slid into the center: both bystanders die
        // and no beam spanning the outer anchors is reported or
        // registered. The mismatched flank colors keep the criss-cross
        // rule out of the picture.
        let mut session = Session::new(board(
            5,
            2,
            &[
                ((0, 0), Color::Red),
                ((1, 0), Color::Blue),
                ((3, 0), Color::Green),
                ((4, 0), Color::Red),
                ((2, 1), Color::Red),
            ],
        ));
        let effects = moved(session.apply_move(&[(2, 1), (2, 0)]).unwrap());
        assert!(!effects.iter().any(|e| matches!(e, Effect::BeamFormed(_))));
        let destroyed: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::PieceDestroyed(p) => Some(p.pos),
                _ => None,
            })
            .collect();
        assert_eq!(destroyed, vec![(1, 0), (3, 0)]);
        assert!(!session
            .board()
            .lasers()
            .contains(&Laser::new((0, 0), (4, 0), Color::Red)));
        assert_eq!(session.status(), Status::Destroyed);
    }

    #[test]
    fn test_blocked_step_rolls_the_whole_slide_back() {
        let mut session = Session::new(board(
            3,
            1,
            &[((0, 0), Color::Red), ((2, 0), Color::Blue)],
        ));
        let outcome = session.apply_move(&[(0, 0), (1, 0), (2, 0)]).unwrap();
        assert_eq!(outcome, MoveOutcome::NotMoved);
        assert_eq!(
            session.board().piece_at((0, 0)),
            Some(Piece::new((0, 0), Color::Red))
        );
        assert_eq!(session.move_count(), 0);
    }

    #[test]
    fn test_malformed_paths_are_errors() {
        let mut session = Session::new(board(3, 1, &[((0, 0), Color::Red)]));
        assert_eq!(session.apply_move(&[]), Err(MoveError::EmptyPath));
        assert_eq!(session.apply_move(&[(0, 0)]), Err(MoveError::EmptyPath));
        assert_eq!(
            session.apply_move(&[(2, 0), (1, 0)]),
            Err(MoveError::NoPieceAtOrigin { pos: (2, 0) })
        );
    }

    #[test]
    fn test_undo_redo_roundtrip_and_future_truncation() {
        let mut session = Session::new(board(4, 1, &[((0, 0), Color::Red)]));
        session.apply_move(&[(0, 0), (1, 0)]).unwrap();
        session.apply_move(&[(1, 0), (2, 0)]).unwrap();
        assert_eq!(session.move_count(), 2);

        assert!(session.undo());
        assert_eq!(session.move_count(), 1);
        assert!(session.board().piece_at((1, 0)).is_some());
        assert!(session.can_redo());

        assert!(session.redo());
        assert!(session.board().piece_at((2, 0)).is_some());

        // Fresh move after an undo discards the stale future.
        assert!(session.undo());
        session.apply_move(&[(1, 0), (0, 0)]).unwrap();
        assert!(!session.can_redo());
        assert_eq!(session.move_count(), 2);
        assert!(session.board().piece_at((0, 0)).is_some());
    }

    #[test]
    fn test_reset_returns_to_the_initial_placement() {
        let mut session = Session::new(board(3, 1, &[((0, 0), Color::Red)]));
        session.apply_move(&[(0, 0), (1, 0)]).unwrap();
        session.apply_move(&[(1, 0), (2, 0)]).unwrap();
        session.reset();
        assert_eq!(session.move_count(), 0);
        assert!(session.board().piece_at((0, 0)).is_some());
        assert!(!session.can_undo());
        assert!(!session.can_redo());
    }

    #[test]
    fn test_winning_move_sets_the_status() {
        let mut tiles = vec![Tile::OPEN; 3];
        tiles[1].goal = Some(Color::Red);
        let board = Board::from_parts(
            3,
            1,
            tiles,
            vec![Piece::new((0, 0), Color::Red), Piece::new((2, 0), Color::Red)],
            vec![(Color::Red, 1)],
            LevelMeta {
                id: 1,
                par: 2,
                perfect: 1,
            },
        )
        .unwrap();
        let mut session = Session::new(board);
        let MoveOutcome::Moved { status, .. } =
            session.apply_move(&[(0, 0), (1, 0)]).unwrap()
        else {
            panic!("expected the move to apply");
        };
        assert_eq!(status, Status::Won);
        assert_eq!(session.stars(), 3);
    }
}
