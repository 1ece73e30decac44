//! Minimum-move breadth-first solver.
//!
//! A search state is a full [`Arrangement`]; one move is one atomic slide,
//! modeled as relocating a piece anywhere in the region it can reach
//! through *safe* cells. A cell is safe when it is passable and landing
//! there destroys nothing: no other piece falls to beam formation and the
//! piece itself survives the criss-cross rule. The search does not
//! simulate painter recolors; levels that hinge on painting need the full
//! move pipeline.
//!
//! The visited table is keyed by the arrangement's packed content key, so
//! two placements with the same pieces on the same cells are one state no
//! matter how they were reached.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arrangement::{Arrangement, ArrangementKey};
use crate::beams::{self, Mode};
use crate::board::{Board, Pos};
use crate::color::Color;

/// Search limits and toggles.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolverConfig {
    /// Abort after expanding this many states.
    pub max_states: Option<usize>,
    /// Abort after this much wall-clock time.
    pub time_limit: Option<Duration>,
    /// Prune mirror images on boards whose tile layout is symmetric.
    pub symmetry_reduction: bool,
}

/// Search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An optimal solution; `trace` runs from the initial placement to the
    /// winning one, inclusive, so `trace.len() == moves + 1`.
    Solved { moves: u32, trace: Vec<Arrangement> },
    /// The reachable state space holds no winning placement.
    Unsolvable,
    /// A limit from [`SolverConfig`] was hit first.
    Aborted { states_explored: usize },
}

/// Tile-layout mirror symmetries, probed once per solve.
struct Symmetry {
    horizontal: bool,
    vertical: bool,
}

impl Symmetry {
    fn probe(board: &Board) -> Symmetry {
        let (w, h) = (board.width(), board.height());
        Symmetry {
            horizontal: board
                .iter_positions()
                .all(|(x, y)| board.tiles_similar((x, y), (w - x - 1, y))),
            vertical: board
                .iter_positions()
                .all(|(x, y)| board.tiles_similar((x, y), (x, h - y - 1))),
        }
    }
}

/// Finds a minimum-move solution for the board's current placement.
pub fn solve(board: &Board, config: &SolverConfig) -> Outcome {
    let start = board.arrangement().clone();
    if board.is_won_with(&start) {
        return Outcome::Solved {
            moves: 0,
            trace: vec![start],
        };
    }

    let symmetry = if config.symmetry_reduction {
        Some(Symmetry::probe(board))
    } else {
        None
    };
    let deadline = config.time_limit.map(|limit| Instant::now() + limit);

    let mut visited: FxHashSet<ArrangementKey> = FxHashSet::default();
    // Child key to parent placement, for reconstructing the trace.
    let mut parents: FxHashMap<ArrangementKey, Arrangement> = FxHashMap::default();
    let mut queue: VecDeque<(Arrangement, u32)> = VecDeque::new();

    mark_visited(&mut visited, &start, symmetry.as_ref());
    queue.push_back((start, 0));

    let mut states_explored = 0usize;
    let mut logged_depth = 0;

    while let Some((current, depth)) = queue.pop_front() {
        if config.max_states.is_some_and(|max| states_explored >= max)
            || deadline.is_some_and(|d| Instant::now() >= d)
        {
            log::debug!("search aborted after {states_explored} states at depth {depth}");
            return Outcome::Aborted { states_explored };
        }
        states_explored += 1;

        if depth > logged_depth {
            logged_depth = depth;
            log::debug!(
                "depth {depth}: {states_explored} states expanded, {} distinct",
                visited.len()
            );
        }

        for next in successors(board, &current) {
            let key = next.key();
            if visited.contains(&key) {
                continue;
            }
            if board.is_won_with(&next) {
                let mut trace = rebuild_trace(&parents, current);
                trace.push(next);
                log::debug!(
                    "solved in {} moves, {states_explored} states expanded",
                    depth + 1
                );
                return Outcome::Solved {
                    moves: depth + 1,
                    trace,
                };
            }
            mark_visited(&mut visited, &next, symmetry.as_ref());
            parents.insert(key, current.clone());
            queue.push_back((next, depth + 1));
        }
    }

    log::debug!("exhausted {states_explored} states with no solution");
    Outcome::Unsolvable
}

/// Convenience wrapper returning just the optimal move count.
pub fn minimal_moves(board: &Board, config: &SolverConfig) -> Option<u32> {
    match solve(board, config) {
        Outcome::Solved { moves, .. } => Some(moves),
        Outcome::Unsolvable | Outcome::Aborted { .. } => None,
    }
}

fn mark_visited(
    visited: &mut FxHashSet<ArrangementKey>,
    arr: &Arrangement,
    symmetry: Option<&Symmetry>,
) {
    visited.insert(arr.key());
    if let Some(sym) = symmetry {
        if sym.horizontal {
            visited.insert(arr.mirrored_horizontal().key());
        }
        if sym.vertical {
            visited.insert(arr.mirrored_vertical().key());
        }
        if sym.horizontal && sym.vertical {
            visited.insert(arr.mirrored_horizontal().mirrored_vertical().key());
        }
    }
}

/// Walks the parent chain back to the initial placement.
fn rebuild_trace(
    parents: &FxHashMap<ArrangementKey, Arrangement>,
    last: Arrangement,
) -> Vec<Arrangement> {
    let mut trace = vec![last];
    while let Some(parent) = parents.get(&trace[trace.len() - 1].key()) {
        trace.push(parent.clone());
    }
    trace.reverse();
    trace
}

/// All placements one slide away: each piece relocated to any cell of its
/// safe reachable region.
fn successors(board: &Board, arr: &Arrangement) -> Vec<Arrangement> {
    let mut out = Vec::new();
    for piece in arr.pieces() {
        let in_hand = arr.without(piece.pos);
        for dest in reachable_cells(board, &in_hand, piece.pos, piece.color) {
            let mut next = in_hand.clone();
            next.set(dest, Some(piece.color));
            out.push(next);
        }
    }
    out
}

/// Whether landing a piece of `color` on `pos` destroys nothing. `arr` is
/// the placement with the piece in hand.
fn is_safe(board: &Board, arr: &Arrangement, pos: Pos, color: Color) -> bool {
    board.is_passable(pos, arr)
        && beams::form_beams(arr, pos, color, Mode::FullRebuild)
            .destroyed
            .is_empty()
        && !beams::is_self_destroyed(arr, pos, color)
}

/// 4-connected flood fill over the safe cells, from the piece's own cell.
/// The origin itself is excluded from the result.
fn reachable_cells(board: &Board, arr: &Arrangement, origin: Pos, color: Color) -> Vec<Pos> {
    let mut seen: FxHashSet<Pos> = FxHashSet::default();
    let mut frontier = vec![origin];
    seen.insert(origin);
    let mut out = Vec::new();

    while let Some((x, y)) = frontier.pop() {
        for step in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let next = (x + step.0, y + step.1);
            if seen.contains(&next) || !is_safe(board, arr, next, color) {
                continue;
            }
            seen.insert(next);
            out.push(next);
            frontier.push(next);
        }
    }
    out
}
