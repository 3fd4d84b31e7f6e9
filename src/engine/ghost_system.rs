use super::*;

#[derive(Clone, Debug)]
pub struct Ghost {
    pub personality: Personality,
    pub state: GhostState,
    pub motion: Motion,
    pub target: Option<CellPos>,
    pub corners: (CellPos, CellPos),
    /// Set while heading for a random way-point, cleared on reaching it.
    pub wandering: bool,
    pub countdown: Countdown,
}

impl Ghost {
    pub fn spawn(graph: &GridGraph, spawn: &GhostSpawn) -> Self {
        Self {
            personality: spawn.personality,
            state: spawn.state,
            motion: Motion::at(graph, spawn.cell, spawn.heading, GHOST_SPAWN_SPEED),
            target: None,
            corners: spawn.corners,
            wandering: false,
            countdown: Countdown::default(),
        }
    }

    pub fn cell(&self) -> CellPos {
        self.motion.current
    }

    /// Second corner unless already standing on it.
    pub fn scatter_target(&self) -> CellPos {
        let (first, second) = self.corners;
        if self.cell() != second {
            second
        } else {
            first
        }
    }

    /// Table-checked transition. Any accepted transition drops the running countdown.
    pub fn enter_state(&mut self, next: GhostState) -> bool {
        if !self.state.allows(next) {
            return false;
        }
        if next != self.state {
            self.wandering = false;
        }
        self.state = next;
        self.countdown.clear();
        true
    }

    pub fn frightened_ending(&self, now_ms: u64) -> bool {
        self.state == GhostState::Frightened
            && self
                .countdown
                .remaining_ms(now_ms)
                .map(|left| left < ENDING_WARNING_MS)
                .unwrap_or(false)
    }

    pub fn view(&self, now_ms: u64) -> GhostView {
        GhostView {
            personality: self.personality,
            x: self.motion.pos.x,
            y: self.motion.pos.y,
            cell: self.cell(),
            heading: self.motion.heading,
            state: self.state,
            target: self.target,
            frightened_ending: self.frightened_ending(now_ms),
        }
    }
}

pub struct ChaseContext<'a> {
    pub graph: &'a GridGraph,
    pub player_cell: CellPos,
    pub player_heading: Direction,
    /// Cell of the direct chaser; the patroller mirrors through it.
    pub reference_cell: CellPos,
}

pub trait TargetingStrategy {
    /// Chase-state target. `None` keeps whatever target the ghost already had.
    fn chase_target(&self, ghost: &Ghost, ctx: &ChaseContext<'_>) -> Option<CellPos>;
}

pub struct DirectChase;

pub struct AmbushChase {
    pub lookahead: i32,
}

pub struct FlankerChase {
    pub shy_radius: u32,
}

pub struct PatrollerChase {
    pub lookahead: i32,
    pub matching: PointMatch,
}

impl TargetingStrategy for DirectChase {
    fn chase_target(&self, _ghost: &Ghost, ctx: &ChaseContext<'_>) -> Option<CellPos> {
        Some(ctx.player_cell)
    }
}

impl TargetingStrategy for AmbushChase {
    fn chase_target(&self, ghost: &Ghost, ctx: &ChaseContext<'_>) -> Option<CellPos> {
        let ahead = ctx
            .graph
            .ahead(ctx.player_cell, ctx.player_heading, self.lookahead)
            .filter(|cell| ctx.graph.is_walkable(*cell))
            .unwrap_or(ctx.player_cell);
        if ghost.cell() == ahead {
            return Some(ghost.scatter_target());
        }
        Some(ahead)
    }
}

impl TargetingStrategy for FlankerChase {
    fn chase_target(&self, ghost: &Ghost, ctx: &ChaseContext<'_>) -> Option<CellPos> {
        if ctx.graph.distance(ctx.player_cell, ghost.cell()) <= self.shy_radius {
            return Some(ghost.scatter_target());
        }
        Some(ctx.player_cell)
    }
}

impl TargetingStrategy for PatrollerChase {
    fn chase_target(&self, ghost: &Ghost, ctx: &ChaseContext<'_>) -> Option<CellPos> {
        let graph = ctx.graph;
        let Some(anchor) = graph.ahead(ctx.player_cell, ctx.player_heading, self.lookahead) else {
            return Some(ctx.player_cell);
        };
        let pivot = graph.cell_origin(ctx.reference_cell);
        let anchor = graph.cell_origin(anchor);
        let mirrored = Point {
            x: 2.0 * pivot.x - anchor.x,
            y: 2.0 * pivot.y - anchor.y,
        };
        if !within_maze(mirrored) {
            return Some(ctx.player_cell);
        }
        match graph.cell_at_point(mirrored, self.matching) {
            Some(cell) if graph.is_walkable(cell) => {
                if ghost.cell() == cell {
                    Some(ghost.scatter_target())
                } else {
                    Some(cell)
                }
            }
            _ => None,
        }
    }
}

fn within_maze(point: Point) -> bool {
    (TILE_SIZE..MAZE_WIDTH_PX).contains(&point.x) && (TILE_SIZE..MAZE_HEIGHT_PX).contains(&point.y)
}

const DIRECT: DirectChase = DirectChase;
const AMBUSH: AmbushChase = AmbushChase {
    lookahead: AMBUSH_LOOKAHEAD,
};
const FLANKER: FlankerChase = FlankerChase {
    shy_radius: FLANKER_SHY_RADIUS,
};
const PATROLLER: PatrollerChase = PatrollerChase {
    lookahead: PATROL_LOOKAHEAD,
    matching: PointMatch::Exact,
};

pub fn targeting_for(personality: Personality) -> &'static dyn TargetingStrategy {
    match personality {
        Personality::Direct => &DIRECT,
        Personality::Ambush => &AMBUSH,
        Personality::Flanker => &FLANKER,
        Personality::Patroller => &PATROLLER,
    }
}

pub struct UpdateContext<'a> {
    pub chase: ChaseContext<'a>,
    pub pellets_remaining: u32,
    pub now_ms: u64,
}

/// Refreshes the ghost's target for this tick and reports the state it should move to, if any.
pub fn update_ghost(ghost: &mut Ghost, ctx: &UpdateContext<'_>, rng: &mut Rng) -> Option<GhostState> {
    let graph = ctx.chase.graph;
    match ghost.state {
        GhostState::Home => {
            if ctx.pellets_remaining < HOME_RELEASE_PELLETS {
                return Some(GhostState::Scatter);
            }
            wander(ghost, graph, rng, HOME_BOX);
            None
        }
        GhostState::Scatter => {
            ghost.target = Some(ghost.scatter_target());
            let duration = scatter_duration_ms(ctx.pellets_remaining);
            ghost
                .countdown
                .poll(ctx.now_ms, duration)
                .then_some(GhostState::Chase)
        }
        GhostState::Chase => {
            if let Some(target) = targeting_for(ghost.personality).chase_target(ghost, &ctx.chase) {
                ghost.target = Some(target);
            }
            ghost.wandering = false;
            ghost
                .countdown
                .poll(ctx.now_ms, CHASE_MS)
                .then_some(GhostState::Scatter)
        }
        GhostState::Frightened => {
            wander(ghost, graph, rng, ROAM_AREA);
            let duration = scatter_duration_ms(ctx.pellets_remaining);
            ghost
                .countdown
                .poll(ctx.now_ms, duration)
                .then_some(GhostState::Chase)
        }
        GhostState::Eaten => {
            ghost.target = Some(HOME_CENTER);
            ghost.wandering = false;
            (ghost.cell() == HOME_CENTER).then_some(GhostState::Chase)
        }
    }
}

fn wander(ghost: &mut Ghost, graph: &GridGraph, rng: &mut Rng, area: CellArea) {
    if !ghost.wandering {
        let cell = random_open_cell(graph, rng, area).unwrap_or(ghost.cell());
        ghost.target = Some(cell);
        ghost.wandering = true;
    }
    if ghost.target == Some(ghost.cell()) {
        ghost.wandering = false;
    }
}

impl GameEngine {
    pub(super) fn update_ghost_states(&mut self) {
        let reference_cell = self
            .ghosts
            .iter()
            .find(|ghost| ghost.personality == Personality::Direct)
            .map(Ghost::cell)
            .unwrap_or(self.player.motion.current);
        let ctx = UpdateContext {
            chase: ChaseContext {
                graph: &self.graph,
                player_cell: self.player.motion.current,
                player_heading: self.player.motion.heading,
                reference_cell,
            },
            pellets_remaining: self.pellets_remaining,
            now_ms: self.elapsed_ms,
        };

        let mut transitions = Vec::new();
        for (idx, ghost) in self.ghosts.iter_mut().enumerate() {
            if let Some(next) = update_ghost(ghost, &ctx, &mut self.rng) {
                transitions.push((idx, next));
            }
        }
        for (idx, next) in transitions {
            self.transition_ghost(idx, next);
        }
    }

    pub(super) fn transition_ghost(&mut self, idx: usize, next: GhostState) -> bool {
        let Some(ghost) = self.ghosts.get_mut(idx) else {
            return false;
        };
        let from = ghost.state;
        if !ghost.enter_state(next) {
            return false;
        }
        if from != next {
            self.events.push(RuntimeEvent::GhostStateChanged {
                personality: ghost.personality,
                from,
                to: next,
            });
        }
        true
    }

    /// Large-pellet event: every ghost not Eaten turns Frightened with a fresh countdown.
    pub(super) fn frighten_ghosts(&mut self) {
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].state != GhostState::Eaten {
                self.transition_ghost(idx, GhostState::Frightened);
            }
        }
    }
}
