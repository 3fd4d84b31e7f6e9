//! Single-pair shortest-path search used for adversary navigation.
//!
//! The search is A* over [`GridGraph`] with edge cost and heuristic both equal to
//! [`GridGraph::distance`]. Because the two share one metric the heuristic is consistent
//! and the first time the goal is popped its cost is optimal. The tunnel edge costs the
//! Manhattan distance between its endpoints, which keeps that property intact.
//!
//! Open-set ordering is part of the contract: lowest `f` first, and among equal `f` the
//! node that entered the open set first. Replays of identical input therefore expand
//! identical node sequences and produce identical routes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use thiserror::Error;

use crate::maze::GridGraph;
use crate::types::{CellPos, Direction, GhostState};

const UNREACHED: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("cell ({}, {}) lies outside the maze", .0.row, .0.col)]
    OutOfBounds(CellPos),
    #[error("start cell ({}, {}) is a wall", .0.row, .0.col)]
    StartBlocked(CellPos),
    #[error("goal cell ({}, {}) is a wall", .0.row, .0.col)]
    GoalBlocked(CellPos),
    #[error("no path from ({}, {}) to ({}, {})", .start.row, .start.col, .goal.row, .goal.col)]
    NoPathFound { start: CellPos, goal: CellPos },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub start: CellPos,
    pub goal: CellPos,
    /// Edge out of `start` that is dropped for this search only.
    pub blocked_exit: Option<Direction>,
}

impl SearchRequest {
    pub fn new(start: CellPos, goal: CellPos) -> Self {
        Self {
            start,
            goal,
            blocked_exit: None,
        }
    }

    /// Drops the edge back toward the previous cell when the state forbids reversing.
    pub fn for_ghost(start: CellPos, goal: CellPos, state: GhostState, heading: Direction) -> Self {
        let blocked_exit = if state.forbids_reversal() && heading != Direction::None {
            Some(heading.opposite())
        } else {
            None
        };
        Self {
            start,
            goal,
            blocked_exit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Start first, goal last.
    pub cells: Vec<CellPos>,
    pub cost: u32,
    /// Cells in the order they were popped from the open set.
    pub expanded: Vec<CellPos>,
}

impl Route {
    /// The way-point: the single cell adjacent to the start.
    pub fn next_step(&self) -> Option<CellPos> {
        self.cells.get(1).copied()
    }
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    g: u32,
    f: u32,
    visited: bool,
    parent: Option<usize>,
    enqueued_at: u64,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            g: UNREACHED,
            f: UNREACHED,
            visited: false,
            parent: None,
            enqueued_at: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    enqueued_at: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert both keys.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.enqueued_at.cmp(&self.enqueued_at))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn find_route(graph: &GridGraph, request: SearchRequest) -> Result<Route, PathError> {
    let SearchRequest {
        start,
        goal,
        blocked_exit,
    } = request;
    let start_idx = graph.index_of(start).ok_or(PathError::OutOfBounds(start))?;
    let goal_idx = graph.index_of(goal).ok_or(PathError::OutOfBounds(goal))?;
    if !graph.is_walkable(start) {
        return Err(PathError::StartBlocked(start));
    }
    if !graph.is_walkable(goal) {
        return Err(PathError::GoalBlocked(goal));
    }

    let mut nodes = vec![SearchNode::default(); graph.cell_count()];
    let mut open = BinaryHeap::new();
    let mut next_order = 0u64;
    let mut expanded = Vec::new();

    nodes[start_idx].g = 0;
    nodes[start_idx].f = 0;
    open.push(OpenEntry {
        f: 0,
        enqueued_at: next_order,
        node: start_idx,
    });
    next_order += 1;

    while let Some(entry) = open.pop() {
        let current_idx = entry.node;
        if nodes[current_idx].visited || entry.f != nodes[current_idx].f {
            continue;
        }
        nodes[current_idx].visited = true;
        let current = graph.pos_of(current_idx);
        expanded.push(current);

        if current_idx == goal_idx {
            return Ok(Route {
                cells: trace_back(graph, &nodes, goal_idx),
                cost: nodes[goal_idx].g,
                expanded,
            });
        }

        for (dir, neighbor) in graph.neighbors(current) {
            if current_idx == start_idx && blocked_exit == Some(dir) {
                continue;
            }
            let Some(neighbor_idx) = graph.index_of(neighbor) else {
                continue;
            };
            if nodes[neighbor_idx].visited || !graph.is_walkable(neighbor) {
                continue;
            }

            let candidate = nodes[current_idx].g + graph.distance(neighbor, current);
            if candidate >= nodes[neighbor_idx].g {
                continue;
            }
            let first_reach = nodes[neighbor_idx].g == UNREACHED;
            let node = &mut nodes[neighbor_idx];
            node.parent = Some(current_idx);
            node.g = candidate;
            node.f = candidate + graph.distance(neighbor, goal);
            if first_reach {
                node.enqueued_at = next_order;
                next_order += 1;
            }
            // An improved node re-enters with its original order; the stale entry is skipped on pop.
            open.push(OpenEntry {
                f: node.f,
                enqueued_at: node.enqueued_at,
                node: neighbor_idx,
            });
        }
    }

    Err(PathError::NoPathFound { start, goal })
}

/// Runs a full search and keeps only the step adjacent to `start`.
/// `Ok(None)` means the caller already stands on the goal.
pub fn next_waypoint(graph: &GridGraph, request: SearchRequest) -> Result<Option<CellPos>, PathError> {
    find_route(graph, request).map(|route| route.next_step())
}

fn trace_back(graph: &GridGraph, nodes: &[SearchNode], goal_idx: usize) -> Vec<CellPos> {
    let mut cells = vec![graph.pos_of(goal_idx)];
    let mut cursor = nodes[goal_idx].parent;
    while let Some(idx) = cursor {
        cells.push(graph.pos_of(idx));
        cursor = nodes[idx].parent;
    }
    cells.reverse();
    cells
}
