use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Neighbor order used by graph wiring and search relaxation.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" | "u" => Some(Self::Up),
            "down" | "d" => Some(Self::Down),
            "left" | "l" => Some(Self::Left),
            "right" | "r" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    /// Row/column delta of one grid step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
            Self::None => (0, 0),
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Self::Up => Some(0),
            Self::Down => Some(1),
            Self::Left => Some(2),
            Self::Right => Some(3),
            Self::None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PelletKind {
    None,
    Small,
    Large,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Home,
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

impl GhostState {
    pub const ALL: [GhostState; 5] = [
        GhostState::Home,
        GhostState::Scatter,
        GhostState::Chase,
        GhostState::Frightened,
        GhostState::Eaten,
    ];

    /// Transition table. Frightened -> Frightened is the timer reset of a repeated power pellet.
    pub fn allows(self, next: GhostState) -> bool {
        use GhostState::*;
        matches!(
            (self, next),
            (Home, Scatter)
                | (Home, Frightened)
                | (Scatter, Chase)
                | (Scatter, Frightened)
                | (Chase, Scatter)
                | (Chase, Frightened)
                | (Frightened, Chase)
                | (Frightened, Eaten)
                | (Frightened, Frightened)
                | (Eaten, Chase)
        )
    }

    /// Adversary may not reverse mid-corridor in these states.
    pub fn forbids_reversal(self) -> bool {
        matches!(self, GhostState::Scatter | GhostState::Chase)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Direct,
    Ambush,
    Flanker,
    Patroller,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellPos {
    pub row: i32,
    pub col: i32,
}

impl CellPos {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Continuous position in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Latest queued input for one tick. Most recent command wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub heading: Option<Direction>,
    pub toggle_start: bool,
    pub quit: bool,
}

impl InputFrame {
    pub fn heading(dir: Direction) -> Self {
        Self {
            heading: Some(dir),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "initialLives")]
    pub initial_lives: u32,
    #[serde(rename = "totalPellets")]
    pub total_pellets: u32,
    #[serde(rename = "chaseMs")]
    pub chase_ms: u64,
    #[serde(rename = "scatterMs")]
    pub scatter_ms: u64,
    #[serde(rename = "scatterLateMs")]
    pub scatter_late_ms: u64,
    #[serde(rename = "roundPauseMs")]
    pub round_pause_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub rows: i32,
    pub cols: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    /// Current maze, one string per row, same alphabet as the layout table.
    pub tiles: Vec<String>,
    pub tunnel: Option<(CellPos, CellPos)>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub cell: CellPos,
    pub heading: Direction,
    pub alive: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub personality: Personality,
    pub x: f32,
    pub y: f32,
    pub cell: CellPos,
    pub heading: Direction,
    pub state: GhostState,
    pub target: Option<CellPos>,
    #[serde(rename = "frightenedEnding")]
    pub frightened_ending: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        cell: CellPos,
    },
    PowerPelletEaten {
        cell: CellPos,
    },
    GhostStateChanged {
        personality: Personality,
        from: GhostState,
        to: GhostState,
    },
    GhostEaten {
        personality: Personality,
        bonus: u32,
    },
    PlayerCaught {
        personality: Personality,
    },
    RoundCleared {
        score: u32,
    },
    RoundReset,
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    GameOver {
        score: u32,
        #[serde(rename = "highScore")]
        high_score: u32,
    },
    GameStarted,
    Paused,
    Resumed,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    pub lives: u32,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: u32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    pub paused: bool,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}
