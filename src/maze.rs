use serde::Serialize;
use thiserror::Error;

use crate::constants::{CLASSIC_LAYOUT, TILE_SIZE, TUNNEL_ROW};
use crate::types::{CellPos, Direction, PelletKind, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub pos: CellPos,
    pub wall: bool,
    pub pellet: PelletKind,
}

/// The single wraparound edge joining both horizontal extremes of one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tunnel {
    pub west: CellPos,
    pub east: CellPos,
}

impl Tunnel {
    pub fn partner(&self, cell: CellPos) -> Option<CellPos> {
        if cell == self.west {
            Some(self.east)
        } else if cell == self.east {
            Some(self.west)
        } else {
            None
        }
    }

    /// Heading that leaves the maze across the boundary from this endpoint.
    pub fn exit_heading(&self, cell: CellPos) -> Option<Direction> {
        if cell == self.west {
            Some(Direction::Left)
        } else if cell == self.east {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// How a free point is matched back to a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointMatch {
    /// Only a point sitting exactly on a cell origin matches.
    Exact,
    /// The cell whose origin is closest to the point.
    Nearest,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("layout is empty")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown tile {tile:?} at row {row}, col {col}")]
    UnknownTile { tile: char, row: usize, col: usize },
    #[error("tunnel row {row} needs open cells at both edges")]
    TunnelBlocked { row: i32 },
}

#[derive(Clone, Debug)]
pub struct GridGraph {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
    initial_pellets: Vec<PelletKind>,
    adjacency: Vec<[Option<CellPos>; 4]>,
    tunnel: Option<Tunnel>,
}

impl GridGraph {
    pub fn classic() -> Self {
        match Self::from_layout(&CLASSIC_LAYOUT, Some(TUNNEL_ROW)) {
            Ok(graph) => graph,
            Err(error) => unreachable!("built-in layout is valid: {error}"),
        }
    }

    /// `#` wall, `.` small pellet, `o` large pellet, space open floor.
    pub fn from_layout(layout: &[&str], tunnel_row: Option<i32>) -> Result<Self, MazeError> {
        let expected = layout.first().map(|row| row.chars().count()).unwrap_or(0);
        if expected == 0 {
            return Err(MazeError::Empty);
        }

        let mut cells = Vec::with_capacity(layout.len() * expected);
        for (row, line) in layout.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(MazeError::RaggedRow {
                    row,
                    found,
                    expected,
                });
            }
            for (col, tile) in line.chars().enumerate() {
                let (wall, pellet) = match tile {
                    '#' => (true, PelletKind::None),
                    '.' => (false, PelletKind::Small),
                    'o' => (false, PelletKind::Large),
                    ' ' => (false, PelletKind::None),
                    _ => return Err(MazeError::UnknownTile { tile, row, col }),
                };
                cells.push(Cell {
                    pos: CellPos::new(row as i32, col as i32),
                    wall,
                    pellet,
                });
            }
        }

        let mut graph = Self {
            rows: layout.len() as i32,
            cols: expected as i32,
            initial_pellets: cells.iter().map(|cell| cell.pellet).collect(),
            cells,
            adjacency: Vec::new(),
            tunnel: None,
        };
        graph.wire_neighbors();

        if let Some(row) = tunnel_row {
            let tunnel = Tunnel {
                west: CellPos::new(row, 0),
                east: CellPos::new(row, graph.cols - 1),
            };
            if !graph.is_walkable(tunnel.west) || !graph.is_walkable(tunnel.east) {
                return Err(MazeError::TunnelBlocked { row });
            }
            graph.install_tunnel(tunnel);
        }
        Ok(graph)
    }

    fn wire_neighbors(&mut self) {
        self.adjacency = self
            .cells
            .iter()
            .map(|cell| {
                let mut out = [None; 4];
                for (slot, dir) in Direction::CARDINAL.into_iter().enumerate() {
                    out[slot] = self.step(cell.pos, dir);
                }
                out
            })
            .collect();
    }

    fn install_tunnel(&mut self, tunnel: Tunnel) {
        if let (Some(west), Some(east)) = (self.index_of(tunnel.west), self.index_of(tunnel.east)) {
            self.adjacency[west][slot(Direction::Left)] = Some(tunnel.east);
            self.adjacency[east][slot(Direction::Right)] = Some(tunnel.west);
            self.tunnel = Some(tunnel);
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn tunnel(&self) -> Option<Tunnel> {
        self.tunnel
    }

    pub fn in_bounds(&self, pos: CellPos) -> bool {
        pos.row >= 0 && pos.col >= 0 && pos.row < self.rows && pos.col < self.cols
    }

    pub(crate) fn index_of(&self, pos: CellPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some((pos.row * self.cols + pos.col) as usize)
    }

    pub(crate) fn pos_of(&self, index: usize) -> CellPos {
        self.cells[index].pos
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_at(&self, row: i32, col: i32) -> Option<&Cell> {
        self.index_of(CellPos::new(row, col))
            .and_then(|idx| self.cells.get(idx))
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn is_walkable(&self, pos: CellPos) -> bool {
        self.cell_at(pos.row, pos.col)
            .map(|cell| !cell.wall)
            .unwrap_or(false)
    }

    /// Up to four neighbors in Up, Down, Left, Right order, tunnel edge included.
    pub fn neighbors(&self, pos: CellPos) -> impl Iterator<Item = (Direction, CellPos)> + '_ {
        let wired = self
            .index_of(pos)
            .and_then(|idx| self.adjacency.get(idx))
            .copied()
            .unwrap_or([None; 4]);
        Direction::CARDINAL
            .into_iter()
            .zip(wired)
            .filter_map(|(dir, next)| next.map(|cell| (dir, cell)))
    }

    pub fn neighbor(&self, pos: CellPos, dir: Direction) -> Option<CellPos> {
        let idx = self.index_of(pos)?;
        let slot = dir.index()?;
        self.adjacency[idx][slot]
    }

    /// Plain grid step without the tunnel edge; `None` past the maze border.
    pub fn step(&self, pos: CellPos, dir: Direction) -> Option<CellPos> {
        self.ahead(pos, dir, 1)
    }

    pub fn ahead(&self, pos: CellPos, dir: Direction, steps: i32) -> Option<CellPos> {
        let (dr, dc) = dir.delta();
        let next = CellPos::new(pos.row + dr * steps, pos.col + dc * steps);
        self.in_bounds(next).then_some(next)
    }

    pub fn direction_between(&self, from: CellPos, to: CellPos) -> Option<Direction> {
        self.neighbors(from)
            .find(|(_, cell)| *cell == to)
            .map(|(dir, _)| dir)
    }

    pub fn is_tunnel_edge(&self, from: CellPos, to: CellPos) -> bool {
        self.tunnel
            .and_then(|tunnel| tunnel.partner(from))
            .map(|partner| partner == to)
            .unwrap_or(false)
    }

    /// Manhattan distance in tiles.
    pub fn distance(&self, a: CellPos, b: CellPos) -> u32 {
        a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
    }

    pub fn pellet_at(&self, pos: CellPos) -> PelletKind {
        self.cell_at(pos.row, pos.col)
            .map(|cell| cell.pellet)
            .unwrap_or(PelletKind::None)
    }

    /// Clears and returns the pellet under `pos`.
    pub fn take_pellet(&mut self, pos: CellPos) -> PelletKind {
        let Some(idx) = self.index_of(pos) else {
            return PelletKind::None;
        };
        std::mem::replace(&mut self.cells[idx].pellet, PelletKind::None)
    }

    pub fn pellet_count(&self) -> u32 {
        self.cells
            .iter()
            .filter(|cell| cell.pellet != PelletKind::None)
            .count() as u32
    }

    pub fn reset_pellets(&mut self) {
        for (cell, pellet) in self.cells.iter_mut().zip(&self.initial_pellets) {
            cell.pellet = *pellet;
        }
    }

    /// Inverse of `from_layout` for the current pellet state.
    pub fn layout_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols as usize)
            .map(|row| {
                row.iter()
                    .map(|cell| match (cell.wall, cell.pellet) {
                        (true, _) => '#',
                        (false, PelletKind::Small) => '.',
                        (false, PelletKind::Large) => 'o',
                        (false, PelletKind::None) => ' ',
                    })
                    .collect()
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn set_wall(&mut self, pos: CellPos, wall: bool) {
        if let Some(idx) = self.index_of(pos) {
            self.cells[idx].wall = wall;
        }
    }

    pub fn cell_origin(&self, pos: CellPos) -> Point {
        Point {
            x: (pos.col - 1) as f32 * TILE_SIZE,
            y: pos.row as f32 * TILE_SIZE,
        }
    }

    pub fn cell_at_point(&self, point: Point, policy: PointMatch) -> Option<CellPos> {
        let col = point.x / TILE_SIZE + 1.0;
        let row = point.y / TILE_SIZE;
        let pos = match policy {
            PointMatch::Exact => {
                if col.fract() != 0.0 || row.fract() != 0.0 {
                    return None;
                }
                CellPos::new(row as i32, col as i32)
            }
            PointMatch::Nearest => CellPos::new(row.round() as i32, col.round() as i32),
        };
        self.in_bounds(pos).then_some(pos)
    }
}

fn slot(dir: Direction) -> usize {
    dir.index().unwrap_or(0)
}
