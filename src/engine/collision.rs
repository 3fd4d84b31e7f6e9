use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encounter {
    None,
    GhostEaten,
    PlayerCaught,
}

/// Both axis deltas strictly below one tile.
pub fn overlaps(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < TILE_SIZE && (a.y - b.y).abs() < TILE_SIZE
}

pub fn encounter(player: Point, ghost: Point, state: GhostState) -> Encounter {
    if !overlaps(player, ghost) {
        return Encounter::None;
    }
    match state {
        GhostState::Frightened => Encounter::GhostEaten,
        GhostState::Scatter | GhostState::Chase => Encounter::PlayerCaught,
        GhostState::Home | GhostState::Eaten => Encounter::None,
    }
}

impl GameEngine {
    pub(super) fn resolve_collisions(&mut self) {
        let player_pos = self.player.motion.pos;
        for idx in 0..self.ghosts.len() {
            let ghost = &self.ghosts[idx];
            match encounter(player_pos, ghost.motion.pos, ghost.state) {
                Encounter::None => {}
                Encounter::GhostEaten => {
                    if self.transition_ghost(idx, GhostState::Eaten) {
                        self.score += GHOST_EATEN_SCORE;
                        self.stats.ghosts_eaten += 1;
                        self.events.push(RuntimeEvent::GhostEaten {
                            personality: self.ghosts[idx].personality,
                            bonus: GHOST_EATEN_SCORE,
                        });
                    }
                }
                Encounter::PlayerCaught => {
                    if self.player.alive {
                        self.player.alive = false;
                        self.stats.deaths += 1;
                        self.events.push(RuntimeEvent::PlayerCaught {
                            personality: self.ghosts[idx].personality,
                        });
                    }
                }
            }
        }
    }
}
