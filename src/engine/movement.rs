use super::*;

/// Continuous position of an entity plus the pair of cells it travels between.
///
/// `current == target` means the entity sits exactly on `current` and waits for a decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub pos: Point,
    pub current: CellPos,
    pub target: CellPos,
    pub heading: Direction,
    /// Pixels per tick.
    pub speed: f32,
}

impl Motion {
    pub fn at(graph: &GridGraph, cell: CellPos, heading: Direction, speed: f32) -> Self {
        Self {
            pos: graph.cell_origin(cell),
            current: cell,
            target: cell,
            heading,
            speed,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.current != self.target
    }

    /// Queued heading first, then the current heading moves the target one cell if that cell is open.
    pub fn steer(&mut self, graph: &GridGraph, queued: Direction) {
        if self.is_moving() {
            return;
        }
        if open_step(graph, self.current, queued).is_some() {
            self.heading = queued;
        }
        if let Some(next) = open_step(graph, self.current, self.heading) {
            self.target = next;
        }
    }

    /// Starts a step toward an adjacent way-point. Crossing the tunnel edge lands at once.
    pub fn head_to(&mut self, graph: &GridGraph, next: CellPos) -> bool {
        let Some(dir) = graph.direction_between(self.current, next) else {
            return false;
        };
        self.heading = dir;
        if graph.is_tunnel_edge(self.current, next) {
            return self.teleport_if_exiting(graph);
        }
        self.target = next;
        true
    }

    /// Moves one tick toward the target without overshooting. Returns true on the arrival tick.
    pub fn advance(&mut self, graph: &GridGraph) -> bool {
        if !self.is_moving() {
            return false;
        }
        let goal = graph.cell_origin(self.target);
        let remaining = (goal.x - self.pos.x).abs() + (goal.y - self.pos.y).abs();
        if remaining <= self.speed {
            self.pos = goal;
            self.current = self.target;
            return true;
        }
        let unit_x = (self.target.col - self.current.col).signum() as f32;
        let unit_y = (self.target.row - self.current.row).signum() as f32;
        self.pos.x += self.speed * unit_x;
        self.pos.y += self.speed * unit_y;
        false
    }

    pub fn teleport_if_exiting(&mut self, graph: &GridGraph) -> bool {
        let Some(tunnel) = graph.tunnel() else {
            return false;
        };
        if tunnel.exit_heading(self.current) != Some(self.heading) {
            return false;
        }
        let Some(partner) = tunnel.partner(self.current) else {
            return false;
        };
        self.current = partner;
        self.target = partner;
        self.pos = graph.cell_origin(partner);
        true
    }
}

fn open_step(graph: &GridGraph, from: CellPos, dir: Direction) -> Option<CellPos> {
    if dir == Direction::None {
        return None;
    }
    graph.step(from, dir).filter(|cell| graph.is_walkable(*cell))
}

impl GameEngine {
    pub(super) fn advance_player(&mut self) {
        let queued = self.player.queued;
        let motion = &mut self.player.motion;
        motion.steer(&self.graph, queued);
        motion.advance(&self.graph);
        motion.teleport_if_exiting(&self.graph);
    }

    pub(super) fn advance_ghosts(&mut self) {
        for idx in 0..self.ghosts.len() {
            if !self.ghosts[idx].motion.is_moving() {
                self.plan_ghost_step(idx);
            }
            let pellets_remaining = self.pellets_remaining;
            let ghost = &mut self.ghosts[idx];
            if ghost.motion.advance(&self.graph) {
                ghost.motion.speed = ghost_speed(ghost.state, pellets_remaining);
            }
            ghost.motion.teleport_if_exiting(&self.graph);
        }
    }

    /// Fresh search from the ghost's cell; only the first step of the route is kept.
    fn plan_ghost_step(&mut self, idx: usize) {
        let ghost = &self.ghosts[idx];
        let cell = ghost.motion.current;
        let goal = ghost.target.unwrap_or(cell);
        let request = SearchRequest::for_ghost(cell, goal, ghost.state, ghost.motion.heading);
        match next_waypoint(&self.graph, request) {
            Ok(Some(next)) => {
                self.ghosts[idx].motion.head_to(&self.graph, next);
            }
            Ok(None) => {}
            Err(_) => {
                self.stats.path_failures += 1;
                // an unreachable random way-point is re-rolled on the next update
                self.ghosts[idx].wandering = false;
            }
        }
    }
}
