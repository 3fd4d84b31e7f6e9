use crate::types::{CellPos, GhostState, Personality};

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAZE_ROWS: i32 = 33;
pub const MAZE_COLS: i32 = 30;
pub const TILE_SIZE: f32 = 20.0;
pub const MAZE_WIDTH_PX: f32 = 560.0;
pub const MAZE_HEIGHT_PX: f32 = 660.0;
pub const TUNNEL_ROW: i32 = 14;

pub const TOTAL_PELLETS: u32 = 245;
pub const INITIAL_LIVES: u32 = 3;
pub const SMALL_PELLET_SCORE: u32 = 10;
pub const LARGE_PELLET_SCORE: u32 = 100;
pub const GHOST_EATEN_SCORE: u32 = 100;

pub const HOME_RELEASE_PELLETS: u32 = 215;
pub const LATE_ROUND_PELLETS: u32 = 100;
pub const FAST_GHOST_PELLETS: u32 = 50;

pub const SCATTER_MS: u64 = 7_000;
pub const SCATTER_LATE_MS: u64 = 3_000;
pub const CHASE_MS: u64 = 20_000;
pub const ENDING_WARNING_MS: u64 = 3_000;
pub const ROUND_PAUSE_MS: u64 = 3_000;

pub const PLAYER_SPEED: f32 = 4.0;
pub const GHOST_SPAWN_SPEED: f32 = 2.5;
pub const GHOST_BASE_SPEED: f32 = 2.0;
pub const GHOST_FAST_SPEED: f32 = 2.5;
pub const GHOST_FRIGHTENED_SPEED: f32 = 0.5;
pub const GHOST_EATEN_SPEED: f32 = 4.0;

pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const PATROL_LOOKAHEAD: i32 = 2;
pub const FLANKER_SHY_RADIUS: u32 = 8;

pub const PLAYER_START: CellPos = CellPos { row: 23, col: 14 };
pub const HOME_CENTER: CellPos = CellPos { row: 14, col: 14 };

/// Inclusive rectangle of cells used when rolling random waypoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellArea {
    pub rows: (i32, i32),
    pub cols: (i32, i32),
}

pub const HOME_BOX: CellArea = CellArea {
    rows: (13, 15),
    cols: (12, 17),
};

pub const ROAM_AREA: CellArea = CellArea {
    rows: (1, 29),
    cols: (2, 27),
};

#[rustfmt::skip]
pub const CLASSIC_LAYOUT: [&str; MAZE_ROWS as usize] = [
    "##############################",
    "##............##............##",
    "##.####.#####.##.#####.####.##",
    "##o####.#####.##.#####.####o##",
    "##.####.#####.##.#####.####.##",
    "##..........................##",
    "##.####.##.########.##.####.##",
    "##.####.##.########.##.####.##",
    "##......##....##....##......##",
    "#######.##### ## #####.#######",
    "#######.##### ## #####.#######",
    "#######.##          ##.#######",
    "#######.## ###  ### ##.#######",
    "#######.## #      # ##.#######",
    "       .   #      #   .       ",
    "#######.## #      # ##.#######",
    "#######.## ######## ##.#######",
    "#######.##          ##.#######",
    "#######.## ######## ##.#######",
    "#######.## ######## ##.#######",
    "##............##............##",
    "##.####.#####.##.#####.####.##",
    "##o####.#####.##.#####.####o##",
    "##...##....... ........##...##",
    "####.##.##.########.##.##.####",
    "####.##.##.########.##.##.####",
    "##......##....##....##......##",
    "##.##########.##.##########.##",
    "##.##########.##.##########.##",
    "##..........................##",
    "##############################",
    "                              ",
    "                              ",
];

/// Spawn cell, spawn heading, spawn state and the two corner cells per personality.
pub struct GhostSpawn {
    pub personality: Personality,
    pub cell: CellPos,
    pub heading: crate::types::Direction,
    pub state: GhostState,
    pub corners: (CellPos, CellPos),
}

pub fn ghost_spawns() -> [GhostSpawn; 4] {
    use crate::types::Direction;
    [
        GhostSpawn {
            personality: Personality::Direct,
            cell: CellPos { row: 11, col: 14 },
            heading: Direction::Up,
            state: GhostState::Scatter,
            corners: (CellPos { row: 5, col: 27 }, CellPos { row: 1, col: 22 }),
        },
        GhostSpawn {
            personality: Personality::Ambush,
            cell: CellPos { row: 14, col: 13 },
            heading: Direction::Left,
            state: GhostState::Home,
            corners: (CellPos { row: 1, col: 7 }, CellPos { row: 5, col: 2 }),
        },
        GhostSpawn {
            personality: Personality::Flanker,
            cell: CellPos { row: 14, col: 14 },
            heading: Direction::Down,
            state: GhostState::Home,
            corners: (CellPos { row: 23, col: 7 }, CellPos { row: 29, col: 8 }),
        },
        GhostSpawn {
            personality: Personality::Patroller,
            cell: CellPos { row: 14, col: 15 },
            heading: Direction::Right,
            state: GhostState::Home,
            corners: (CellPos { row: 23, col: 22 }, CellPos { row: 29, col: 21 }),
        },
    ]
}

pub fn scatter_duration_ms(pellets_remaining: u32) -> u64 {
    if pellets_remaining < LATE_ROUND_PELLETS {
        return SCATTER_LATE_MS;
    }
    SCATTER_MS
}

pub fn ghost_speed(state: GhostState, pellets_remaining: u32) -> f32 {
    match state {
        GhostState::Home | GhostState::Scatter | GhostState::Chase => {
            if pellets_remaining < FAST_GHOST_PELLETS {
                GHOST_FAST_SPEED
            } else {
                GHOST_BASE_SPEED
            }
        }
        GhostState::Frightened => GHOST_FRIGHTENED_SPEED,
        GhostState::Eaten => GHOST_EATEN_SPEED,
    }
}
