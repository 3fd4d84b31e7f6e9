use serde::Serialize;

use crate::constants::{
    ghost_spawns, ghost_speed, scatter_duration_ms, CellArea, GhostSpawn, AMBUSH_LOOKAHEAD,
    CHASE_MS, ENDING_WARNING_MS, FLANKER_SHY_RADIUS, GHOST_EATEN_SCORE, GHOST_SPAWN_SPEED,
    HOME_BOX, HOME_CENTER, HOME_RELEASE_PELLETS, INITIAL_LIVES, LARGE_PELLET_SCORE,
    MAZE_HEIGHT_PX, MAZE_WIDTH_PX, PATROL_LOOKAHEAD, PLAYER_SPEED, PLAYER_START, ROAM_AREA,
    ROUND_PAUSE_MS, SCATTER_LATE_MS, SCATTER_MS, SMALL_PELLET_SCORE, TICK_RATE, TILE_SIZE,
};
use crate::maze::{GridGraph, PointMatch};
use crate::pathfinding::{next_waypoint, SearchRequest};
use crate::rng::Rng;
use crate::types::{
    CellPos, Direction, GameConfig, GhostState, GhostView, InputFrame, PelletKind, Personality,
    PlayerView, Point, RuntimeEvent, Snapshot, WorldInit,
};

mod collision;
mod ghost_system;
mod movement;
mod timers;
mod utils;

pub use self::collision::{encounter, overlaps, Encounter};
pub use self::ghost_system::{
    targeting_for, update_ghost, AmbushChase, ChaseContext, DirectChase, FlankerChase, Ghost,
    PatrollerChase, TargetingStrategy, UpdateContext,
};
pub use self::movement::Motion;
pub use self::timers::Countdown;
use self::utils::random_open_cell;

#[derive(Clone, Debug)]
struct Player {
    motion: Motion,
    queued: Direction,
    alive: bool,
}

impl Player {
    fn spawn(graph: &GridGraph) -> Self {
        Self {
            motion: Motion::at(graph, PLAYER_START, Direction::None, PLAYER_SPEED),
            queued: Direction::None,
            alive: true,
        }
    }

    fn view(&self) -> PlayerView {
        PlayerView {
            x: self.motion.pos.x,
            y: self.motion.pos.y,
            cell: self.motion.current,
            heading: self.motion.heading,
            alive: self.alive,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct EngineStats {
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    pub deaths: u32,
    #[serde(rename = "roundsCleared")]
    pub rounds_cleared: u32,
    #[serde(rename = "pathFailures")]
    pub path_failures: u64,
}

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    pub seed: u64,
    /// Previously stored best score.
    pub high_score: u32,
    pub initial_lives_override: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    graph: GridGraph,
    rng: Rng,
    player: Player,
    ghosts: Vec<Ghost>,
    events: Vec<RuntimeEvent>,
    stats: EngineStats,

    score: u32,
    high_score: u32,
    lives: u32,
    pellets_remaining: u32,
    round_pause: Countdown,
    paused: bool,
    game_over: bool,
    quit_requested: bool,

    elapsed_ms: u64,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(options: GameEngineOptions) -> Self {
        let graph = GridGraph::classic();
        let config = GameConfig {
            tick_rate: TICK_RATE,
            initial_lives: options.initial_lives_override.unwrap_or(INITIAL_LIVES).max(1),
            total_pellets: graph.pellet_count(),
            chase_ms: CHASE_MS,
            scatter_ms: SCATTER_MS,
            scatter_late_ms: SCATTER_LATE_MS,
            round_pause_ms: ROUND_PAUSE_MS,
        };
        let player = Player::spawn(&graph);
        let ghosts = spawn_ghosts(&graph);

        Self {
            rng: Rng::new(options.seed),
            player,
            ghosts,
            events: Vec::new(),
            stats: EngineStats::default(),
            score: 0,
            high_score: options.high_score,
            lives: config.initial_lives,
            pellets_remaining: config.total_pellets,
            round_pause: Countdown::default(),
            paused: false,
            game_over: false,
            quit_requested: false,
            elapsed_ms: 0,
            tick_counter: 0,
            config,
            graph,
        }
    }

    pub fn graph(&self) -> &GridGraph {
        &self.graph
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn pellets_remaining(&self) -> u32 {
        self.pellets_remaining
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn player_alive(&self) -> bool {
        self.player.alive
    }

    pub fn player_cell(&self) -> CellPos {
        self.player.motion.current
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn world_init(&self) -> WorldInit {
        WorldInit {
            rows: self.graph.rows(),
            cols: self.graph.cols(),
            tile_size: TILE_SIZE,
            tiles: self.graph.layout_rows(),
            tunnel: self.graph.tunnel().map(|tunnel| (tunnel.west, tunnel.east)),
        }
    }

    /// One fixed-cadence tick. The clock only runs while a game is live and unpaused.
    pub fn step(&mut self, dt_ms: u64, input: InputFrame) {
        self.tick_counter += 1;
        self.apply_controls(input);
        if self.quit_requested || self.paused || self.game_over {
            return;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if let Some(heading) = input.heading {
            self.player.queued = heading;
        }

        if !self.player.alive {
            if self.round_pause.poll(self.elapsed_ms, self.config.round_pause_ms) {
                self.resolve_life_loss();
            }
        } else if self.pellets_remaining == 0 {
            if self.round_pause.poll(self.elapsed_ms, self.config.round_pause_ms) {
                self.reset_round();
            }
        } else {
            self.advance_player();
            // nothing else runs until the player picks a heading
            if self.player.motion.heading != Direction::None {
                self.consume_pellet();
                self.update_ghost_states();
                self.advance_ghosts();
                self.resolve_collisions();
            }
        }

        self.high_score = self.high_score.max(self.score);
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            score: self.score,
            high_score: self.high_score,
            lives: self.lives,
            pellets_remaining: self.pellets_remaining,
            game_over: self.game_over,
            paused: self.paused,
            player: self.player.view(),
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| ghost.view(self.elapsed_ms))
                .collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn apply_controls(&mut self, input: InputFrame) {
        if input.quit {
            self.quit_requested = true;
            return;
        }
        if !input.toggle_start {
            return;
        }
        if self.game_over {
            self.game_over = false;
            self.events.push(RuntimeEvent::GameStarted);
            return;
        }
        self.paused = !self.paused;
        self.events.push(if self.paused {
            RuntimeEvent::Paused
        } else {
            RuntimeEvent::Resumed
        });
    }

    fn consume_pellet(&mut self) {
        let cell = self.player.motion.current;
        match self.graph.take_pellet(cell) {
            PelletKind::None => return,
            PelletKind::Small => {
                self.score += SMALL_PELLET_SCORE;
                self.events.push(RuntimeEvent::PelletEaten { cell });
            }
            PelletKind::Large => {
                self.score += LARGE_PELLET_SCORE;
                self.events.push(RuntimeEvent::PowerPelletEaten { cell });
                self.frighten_ghosts();
            }
        }
        self.pellets_remaining = self.pellets_remaining.saturating_sub(1);
        self.stats.pellets_eaten += 1;
        if self.pellets_remaining == 0 {
            self.stats.rounds_cleared += 1;
            self.events.push(RuntimeEvent::RoundCleared { score: self.score });
        }
    }

    fn reset_round(&mut self) {
        self.refill_maze();
        self.respawn_entities();
        self.events.push(RuntimeEvent::RoundReset);
    }

    fn resolve_life_loss(&mut self) {
        if self.lives > 1 {
            self.lives -= 1;
            self.events.push(RuntimeEvent::LifeLost {
                lives_left: self.lives,
            });
        } else {
            self.high_score = self.high_score.max(self.score);
            self.events.push(RuntimeEvent::GameOver {
                score: self.score,
                high_score: self.high_score,
            });
            self.game_over = true;
            self.refill_maze();
            self.lives = self.config.initial_lives;
            self.score = 0;
        }
        self.respawn_entities();
    }

    fn refill_maze(&mut self) {
        self.graph.reset_pellets();
        self.pellets_remaining = self.config.total_pellets;
    }

    fn respawn_entities(&mut self) {
        self.player = Player::spawn(&self.graph);
        self.ghosts = spawn_ghosts(&self.graph);
        self.round_pause.clear();
    }
}

fn spawn_ghosts(graph: &GridGraph) -> Vec<Ghost> {
    ghost_spawns()
        .iter()
        .map(|spawn| Ghost::spawn(graph, spawn))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TICK_MS, TOTAL_PELLETS};

    fn make_engine(seed: u64) -> GameEngine {
        GameEngine::new(GameEngineOptions {
            seed,
            ..GameEngineOptions::default()
        })
    }

    fn place_player(engine: &mut GameEngine, cell: CellPos, heading: Direction) {
        engine.player.motion = Motion::at(&engine.graph, cell, heading, PLAYER_SPEED);
    }

    fn ghost_idx(engine: &GameEngine, personality: Personality) -> usize {
        engine
            .ghosts
            .iter()
            .position(|ghost| ghost.personality == personality)
            .expect("ghost present")
    }

    fn idle_ticks(engine: &mut GameEngine, ticks: usize) {
        for _ in 0..ticks {
            engine.step(TICK_MS, InputFrame::default());
        }
    }

    fn scripted_input(tick: usize) -> InputFrame {
        const CYCLE: [Direction; 4] = [
            Direction::Left,
            Direction::Up,
            Direction::Right,
            Direction::Down,
        ];
        if tick % 45 == 0 {
            InputFrame::heading(CYCLE[(tick / 45) % CYCLE.len()])
        } else {
            InputFrame::default()
        }
    }

    #[test]
    fn small_pellet_scores_ten_once() {
        let mut engine = make_engine(1);
        place_player(&mut engine, CellPos::new(23, 13), Direction::Left);
        engine.consume_pellet();
        assert_eq!(engine.score, 10);
        assert_eq!(engine.pellets_remaining, TOTAL_PELLETS - 1);

        engine.consume_pellet();
        assert_eq!(engine.score, 10);
        assert_eq!(engine.pellets_remaining, 244);
        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.events.len(), 1);
    }

    #[test]
    fn large_pellet_frightens_every_ghost_not_eaten() {
        let mut engine = make_engine(1);
        let flanker = ghost_idx(&engine, Personality::Flanker);
        engine.ghosts[flanker].state = GhostState::Eaten;
        place_player(&mut engine, CellPos::new(3, 2), Direction::Up);

        engine.consume_pellet();
        assert_eq!(engine.score, 100);
        assert_eq!(engine.pellets_remaining, 244);
        for (idx, ghost) in engine.ghosts.iter().enumerate() {
            if idx == flanker {
                assert_eq!(ghost.state, GhostState::Eaten);
            } else {
                assert_eq!(ghost.state, GhostState::Frightened);
                assert!(!ghost.countdown.is_armed());
            }
        }
    }

    #[test]
    fn large_pellet_while_frightened_only_resets_timers() {
        let mut engine = make_engine(1);
        for ghost in &mut engine.ghosts {
            ghost.state = GhostState::Frightened;
            ghost.countdown.poll(0, SCATTER_MS);
        }
        place_player(&mut engine, CellPos::new(22, 27), Direction::Up);
        engine.build_snapshot(true);

        engine.consume_pellet();
        assert!(engine
            .ghosts
            .iter()
            .all(|ghost| ghost.state == GhostState::Frightened && !ghost.countdown.is_armed()));
        let events = engine.build_snapshot(true).events;
        assert!(!events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::GhostStateChanged { .. })));

        engine.elapsed_ms = 2_000;
        engine.update_ghost_states();
        for ghost in &engine.ghosts {
            assert_eq!(ghost.countdown.deadline_ms(), Some(2_000 + SCATTER_MS));
        }
    }

    #[test]
    fn chase_ghost_on_player_kills_player() {
        let mut engine = make_engine(1);
        let direct = ghost_idx(&engine, Personality::Direct);
        engine.ghosts[direct].state = GhostState::Chase;
        engine.ghosts[direct].motion.pos = engine.player.motion.pos;

        engine.resolve_collisions();
        assert!(!engine.player.alive);
        let events = engine.build_snapshot(true).events;
        assert!(matches!(
            events.as_slice(),
            [RuntimeEvent::PlayerCaught {
                personality: Personality::Direct
            }]
        ));
    }

    #[test]
    fn struck_frightened_ghost_is_eaten_even_with_expired_timer() {
        let mut engine = make_engine(1);
        let ambush = ghost_idx(&engine, Personality::Ambush);
        engine.ghosts[ambush].state = GhostState::Frightened;
        engine.ghosts[ambush].countdown.poll(0, 10);
        engine.elapsed_ms = 50_000;
        engine.ghosts[ambush].motion.pos = Point {
            x: engine.player.motion.pos.x + 19.0,
            y: engine.player.motion.pos.y,
        };

        engine.resolve_collisions();
        assert_eq!(engine.ghosts[ambush].state, GhostState::Eaten);
        assert_eq!(engine.score, GHOST_EATEN_SCORE);
        assert!(engine.player.alive);

        engine.update_ghost_states();
        assert_eq!(engine.ghosts[ambush].state, GhostState::Eaten);
        assert_eq!(engine.ghosts[ambush].target, Some(HOME_CENTER));
    }

    #[test]
    fn home_and_eaten_ghosts_are_harmless() {
        let mut engine = make_engine(1);
        let pos = engine.player.motion.pos;
        engine.ghosts[0].state = GhostState::Eaten;
        for ghost in &mut engine.ghosts {
            ghost.motion.pos = pos;
        }
        engine.resolve_collisions();
        assert!(engine.player.alive);
        assert_eq!(engine.score, 0);
    }

    #[test]
    fn cleared_round_resets_after_pause_keeping_score_and_lives() {
        let mut engine = make_engine(9);
        let cells: Vec<CellPos> = engine.graph.cells().map(|cell| cell.pos).collect();
        for cell in cells {
            engine.graph.take_pellet(cell);
        }
        engine.pellets_remaining = 0;
        engine.score = 2_450;
        engine.lives = 2;
        place_player(&mut engine, CellPos::new(5, 5), Direction::Right);

        idle_ticks(&mut engine, 100);
        assert_eq!(engine.pellets_remaining, 0);
        assert_eq!(engine.player_cell(), CellPos::new(5, 5));

        idle_ticks(&mut engine, 100);
        assert_eq!(engine.pellets_remaining, TOTAL_PELLETS);
        assert_eq!(engine.graph.pellet_count(), TOTAL_PELLETS);
        assert_eq!(engine.score, 2_450);
        assert_eq!(engine.lives, 2);
        assert_eq!(engine.player_cell(), PLAYER_START);
        for (ghost, spawn) in engine.ghosts.iter().zip(ghost_spawns().iter()) {
            assert_eq!(ghost.cell(), spawn.cell);
            assert_eq!(ghost.state, spawn.state);
        }
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::RoundReset)));
    }

    #[test]
    fn caught_player_loses_a_life_after_pause() {
        let mut engine = make_engine(4);
        engine.score = 300;
        engine.player.alive = false;

        idle_ticks(&mut engine, 150);
        assert_eq!(engine.lives, INITIAL_LIVES);
        idle_ticks(&mut engine, 50);
        assert_eq!(engine.lives, INITIAL_LIVES - 1);
        assert!(engine.player.alive);
        assert_eq!(engine.score, 300);
        assert!(!engine.game_over);
    }

    #[test]
    fn last_life_ends_game_and_resets_progress() {
        let mut engine = make_engine(4);
        engine.lives = 1;
        engine.score = 1_234;
        engine.pellets_remaining = 17;
        engine.player.alive = false;

        idle_ticks(&mut engine, 200);
        assert!(engine.game_over);
        assert_eq!(engine.score, 0);
        assert_eq!(engine.lives, INITIAL_LIVES);
        assert_eq!(engine.pellets_remaining, TOTAL_PELLETS);
        assert_eq!(engine.high_score, 1_234);
        let events = engine.build_snapshot(true).events;
        assert!(events.iter().any(|event| matches!(
            event,
            RuntimeEvent::GameOver {
                score: 1_234,
                high_score: 1_234
            }
        )));

        let frozen = engine.elapsed_ms;
        idle_ticks(&mut engine, 10);
        assert_eq!(engine.elapsed_ms, frozen);

        engine.step(
            TICK_MS,
            InputFrame {
                toggle_start: true,
                ..InputFrame::default()
            },
        );
        assert!(!engine.game_over);
        assert!(engine.elapsed_ms > frozen);
    }

    #[test]
    fn nothing_moves_before_the_first_heading() {
        let mut engine = make_engine(5);
        idle_ticks(&mut engine, 120);
        assert_eq!(engine.pellets_remaining, TOTAL_PELLETS);
        for (ghost, spawn) in engine.ghosts.iter().zip(ghost_spawns().iter()) {
            assert_eq!(ghost.motion.pos, engine.graph.cell_origin(spawn.cell));
        }

        engine.step(TICK_MS, InputFrame::heading(Direction::Left));
        assert_eq!(engine.player.motion.heading, Direction::Left);
        idle_ticks(&mut engine, 10);
        let direct = ghost_idx(&engine, Personality::Direct);
        assert_ne!(
            engine.ghosts[direct].motion.pos,
            engine.graph.cell_origin(CellPos::new(11, 14))
        );
    }

    #[test]
    fn player_crosses_tunnel_with_same_heading() {
        let mut engine = make_engine(6);
        place_player(&mut engine, CellPos::new(14, 1), Direction::Left);
        idle_ticks(&mut engine, 5);
        let tunnel = engine.graph.tunnel().expect("tunnel");
        assert_eq!(engine.player_cell(), tunnel.east);
        assert_eq!(engine.player.motion.heading, Direction::Left);
        assert_eq!(engine.player.motion.pos, engine.graph.cell_origin(tunnel.east));

        idle_ticks(&mut engine, 5);
        assert_eq!(engine.player_cell(), CellPos::new(14, 28));
    }

    #[test]
    fn pause_toggle_freezes_the_clock() {
        let mut engine = make_engine(2);
        let toggle = InputFrame {
            toggle_start: true,
            ..InputFrame::default()
        };
        idle_ticks(&mut engine, 3);
        engine.step(TICK_MS, toggle);
        assert!(engine.paused);
        let frozen = engine.elapsed_ms;
        idle_ticks(&mut engine, 30);
        assert_eq!(engine.elapsed_ms, frozen);
        assert_eq!(engine.tick(), 34);

        engine.step(TICK_MS, toggle);
        assert!(!engine.paused);
        assert_eq!(engine.elapsed_ms, frozen + TICK_MS);
        let events = engine.build_snapshot(true).events;
        assert!(matches!(
            events.as_slice(),
            [RuntimeEvent::Paused, RuntimeEvent::Resumed]
        ));
    }

    #[test]
    fn quit_input_raises_flag() {
        let mut engine = make_engine(2);
        engine.step(
            TICK_MS,
            InputFrame {
                quit: true,
                ..InputFrame::default()
            },
        );
        assert!(engine.is_quit_requested());
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = make_engine(424_242);
        let mut b = make_engine(424_242);
        for tick in 0..1_500 {
            let input = scripted_input(tick);
            a.step(TICK_MS, input);
            b.step(TICK_MS, input);
            let sa = serde_json::to_string(&a.build_snapshot(true)).expect("serialize");
            let sb = serde_json::to_string(&b.build_snapshot(true)).expect("serialize");
            assert_eq!(sa, sb, "diverged at tick {tick}");
        }
    }

    #[test]
    fn long_run_keeps_core_invariants() {
        let mut engine = make_engine(77);
        let mut last_pellets = engine.pellets_remaining;
        for tick in 0..6_000 {
            engine.step(TICK_MS, scripted_input(tick));
            let snapshot = engine.build_snapshot(true);

            let refilled = snapshot.events.iter().any(|event| {
                matches!(event, RuntimeEvent::RoundReset | RuntimeEvent::GameOver { .. })
            });
            if !refilled {
                assert!(snapshot.pellets_remaining <= last_pellets, "tick {tick}");
            }
            last_pellets = snapshot.pellets_remaining;

            assert!(engine.graph.is_walkable(engine.player_cell()));
            for ghost in &engine.ghosts {
                assert!(engine.graph.is_walkable(ghost.cell()), "{:?}", ghost.cell());
                assert!(engine.graph.is_walkable(ghost.motion.target));
            }
            for event in &snapshot.events {
                if let RuntimeEvent::GhostStateChanged { from, to, .. } = event {
                    assert!(from.allows(*to), "{from:?} -> {to:?}");
                }
            }
            assert!(snapshot.high_score >= snapshot.score);
        }
        assert!(engine.stats.pellets_eaten > 0);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = make_engine(3);
        engine.events.push(RuntimeEvent::RoundReset);
        assert_eq!(engine.build_snapshot(false).events.len(), 0);
        assert_eq!(engine.build_snapshot(true).events.len(), 1);
        assert_eq!(engine.build_snapshot(true).events.len(), 0);
    }

    #[test]
    fn stored_high_score_is_kept_until_beaten() {
        let mut engine = GameEngine::new(GameEngineOptions {
            seed: 1,
            high_score: 50,
            initial_lives_override: None,
        });
        place_player(&mut engine, CellPos::new(23, 13), Direction::Left);
        engine.step(TICK_MS, InputFrame::default());
        assert_eq!(engine.score, 10);
        assert_eq!(engine.high_score, 50);
        engine.score = 70;
        engine.step(TICK_MS, InputFrame::default());
        assert_eq!(engine.high_score(), 70);
    }

    #[test]
    fn world_init_describes_the_maze() {
        let engine = make_engine(1);
        let init = engine.world_init();
        assert_eq!(init.rows, 33);
        assert_eq!(init.cols, 30);
        assert_eq!(init.tiles.len(), 33);
        assert_eq!(init.tunnel, Some((CellPos::new(14, 0), CellPos::new(14, 29))));
    }
}
