//! Beam rule engine.
//!
//! Pure directional-scan logic: no hidden state, arrangement in, report
//! out. [`Board::rebuild_lasers`](crate::board::Board::rebuild_lasers) is
//! the only consumer that turns full-rebuild reports into active-set
//! mutations; the move pipeline consumes incremental reports for its
//! effect list.

use crate::arrangement::Arrangement;
use crate::board::{Laser, Pos};
use crate::color::Color;

/// Scan axis of a beam or a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Negative- and positive-direction steps along this axis.
    const fn steps(self) -> [(i32, i32); 2] {
        match self {
            Axis::Horizontal => [(-1, 0), (1, 0)],
            Axis::Vertical => [(0, -1), (0, 1)],
        }
    }
}

/// How a formation pass reports its findings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Report every anchored laser plus cancelled spans, for rederiving
    /// the whole active set.
    FullRebuild,
    /// Report only lasers that are *newly* formed by this move: a laser is
    /// suppressed when the piece still has its pre-move color and the
    /// laser lies on the move's own axis (the piece merely kept gliding
    /// along a beam it already anchors).
    Incremental { move_axis: Axis, painted: bool },
}

/// Outcome of [`form_beams`] for one piece.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BeamReport {
    /// Lasers formed, in scan order (horizontal axis first).
    pub formed: Vec<Laser>,
    /// Spans that a full rebuild must drop from the active set: the piece
    /// sits between two same-colored anchors, so no beam crosses it.
    pub cancelled: Vec<Laser>,
    /// Pieces strictly between the scanned piece and its anchors,
    /// destroyed regardless of cancellation. Anchors are never included.
    pub destroyed: Vec<Pos>,
}

/// One direction's scan result: the nearest same-colored piece (if any)
/// and every differently-colored piece passed on the way to it.
struct DirScan {
    anchor: Option<Pos>,
    victims: Vec<Pos>,
}

/// Shared directional primitive: walk outward from `from` by `step`,
/// collecting differently-colored pieces until the first piece of `color`
/// or the boundary.
fn scan_dir(arr: &Arrangement, from: Pos, step: (i32, i32), color: Color) -> DirScan {
    let mut victims = Vec::new();
    let (mut x, mut y) = (from.0 + step.0, from.1 + step.1);
    while arr.in_bounds((x, y)) {
        if let Some(found) = arr.color_at((x, y)) {
            if found == color {
                return DirScan {
                    anchor: Some((x, y)),
                    victims,
                };
            }
            victims.push((x, y));
        }
        x += step.0;
        y += step.1;
    }
    DirScan {
        anchor: None,
        victims,
    }
}

/// Runs the formation rules for the piece of `color` at `pos` on both
/// axes. Pure: the caller applies the report.
pub fn form_beams(arr: &Arrangement, pos: Pos, color: Color, mode: Mode) -> BeamReport {
    let mut report = BeamReport::default();
    for axis in [Axis::Horizontal, Axis::Vertical] {
        let [neg_step, pos_step] = axis.steps();
        let near = scan_dir(arr, pos, neg_step, color);
        let far = scan_dir(arr, pos, pos_step, color);

        // Victims on a side only die when that side has an anchor.
        if near.anchor.is_some() {
            report.destroyed.extend(near.victims);
        }
        if far.anchor.is_some() {
            report.destroyed.extend(far.victims);
        }

        match (near.anchor, far.anchor) {
            (Some(a), Some(b)) => match mode {
                Mode::FullRebuild => {
                    report.formed.push(Laser::new(a, pos, color));
                    report.formed.push(Laser::new(pos, b, color));
                    report.cancelled.push(Laser::new(a, b, color));
                }
                // Anchors on both sides: nothing newly forms.
                Mode::Incremental { .. } => {}
            },
            (Some(anchor), None) | (None, Some(anchor)) => {
                let laser = Laser::new(anchor, pos, color);
                match mode {
                    Mode::FullRebuild => report.formed.push(laser),
                    Mode::Incremental { move_axis, painted } => {
                        if painted || axis != move_axis {
                            report.formed.push(laser);
                        }
                    }
                }
            }
            (None, None) => {}
        }
    }
    report
}

/// Criss-cross predicate: on either axis, the nearest piece in each
/// direction exists, the two share a color, and that color differs from
/// the piece's own.
pub fn is_self_destroyed(arr: &Arrangement, pos: Pos, color: Color) -> bool {
    [Axis::Horizontal, Axis::Vertical].iter().any(|&axis| {
        let [neg_step, pos_step] = axis.steps();
        let near = nearest_color(arr, pos, neg_step, color);
        let far = nearest_color(arr, pos, pos_step, color);
        matches!((near, far), (Some(a), Some(b)) if a == b && a != color)
    })
}

/// Color of the nearest piece in one direction. A same-colored anchor
/// terminates the scan just like any other piece.
fn nearest_color(arr: &Arrangement, from: Pos, step: (i32, i32), color: Color) -> Option<Color> {
    let scan = scan_dir(arr, from, step, color);
    scan.victims
        .first()
        .and_then(|&pos| arr.color_at(pos))
        .or(scan.anchor.map(|_| color))
}
