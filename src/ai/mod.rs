//! # Monster AI
//!
//! Per-monster finite state machines driving perception and movement.
//!
//! Each monster owns a single [`AiMemory`], created lazily the first time
//! the AI touches it. One AI turn is two calls: [`MonsterAi::update`]
//! recomputes perception and runs the state transition rules, then
//! [`MonsterAi::next_move`] picks a destination tile for the current state.
//! Every decision fails soft: a missing path, room or memory always means
//! "stay where you are", never an error.

use crate::game::{Level, Monster, PlayerCharacter, Position};
use crate::utils::pathfinding;
use log::trace;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Behavior states of the monster state machine.
///
/// There is no terminal state; the machine runs for the monster's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    /// Wandering its territory, unaware of the player
    Idle,
    /// Player noticed at the edge of awareness; investigating
    Alert,
    /// Actively pursuing the player
    Hostile,
    /// Retreating from the player after taking heavy damage
    Fleeing,
    /// Heading back to its assigned room after losing the player
    Returning,
}

/// Per-monster AI state and memory.
///
/// Owned exclusively by its monster; destroyed with it. The cached path is
/// exhausted once `path_cursor` reaches its length and must be recomputed
/// before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMemory {
    pub state: AiState,
    /// Center of the assigned room, used as the return destination
    pub home_room_center: Option<Position>,
    /// Index of the assigned room in the level's room list
    pub assigned_room: Option<usize>,
    /// Where the player was last sighted
    pub last_player_pos: Option<Position>,
    /// Turns elapsed since the player was last visible
    pub turns_since_player_seen: u32,
    /// Counter throttling idle wandering
    pub idle_move_counter: u32,
    /// Path being followed while pursuing or returning
    pub cached_path: Vec<Position>,
    /// Next step to consume from `cached_path`
    pub path_cursor: usize,
}

impl AiMemory {
    /// Creates a fresh idle memory with nothing seen and nowhere to go.
    pub fn new() -> Self {
        Self {
            state: AiState::Idle,
            home_room_center: None,
            assigned_room: None,
            last_player_pos: None,
            turns_since_player_seen: 0,
            idle_move_counter: 0,
            cached_path: Vec::new(),
            path_cursor: 0,
        }
    }

    /// Whether the cached path has no steps left to consume.
    fn path_exhausted(&self) -> bool {
        self.path_cursor >= self.cached_path.len()
    }
}

impl Default for AiMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// The monster AI system.
///
/// Stateless; all per-monster state lives in each monster's [`AiMemory`].
pub struct MonsterAi;

impl MonsterAi {
    /// How far a monster can see the player, in tiles.
    pub const VISION_RANGE: f32 = 8.0;
    /// Distance at which a visible player makes a monster hostile.
    pub const HOSTILE_RANGE: f32 = 8.0;
    /// Distance at which a visible player puts a monster on alert.
    pub const ALERT_RANGE: f32 = 10.0;
    /// Turns a monster keeps hunting after losing sight of the player.
    pub const MEMORY_TURNS: u32 = 5;
    /// Turns of lost sight after which a fleeing monster calms down.
    pub const FLEE_GIVE_UP_TURNS: u32 = 3;
    /// Health fraction below which a monster tries to flee.
    pub const FLEE_HEALTH_FRACTION: f32 = 0.25;
    /// An idle monster moves only every this many AI turns.
    const IDLE_MOVE_PERIOD: u32 = 3;

    /// Runs perception and the state transition rules for one monster.
    pub fn update(monster: &mut Monster, player: &PlayerCharacter, level: &Level) {
        let can_see = Self::can_see_player(monster, player, level);
        let dist = pathfinding::distance(monster.position, player.position);
        let health_fraction = monster.hp as f32 / monster.max_hp as f32;
        // The orc flee exemption is a flavor rule: orcs never run.
        let should_flee =
            health_fraction < Self::FLEE_HEALTH_FRACTION && monster.species != "orc";

        let monster_pos = monster.position;
        let player_pos = player.position;
        let name = monster.name.clone();
        let memory = monster.ai_mut();

        trace!(
            "{} update: state={:?} can_see={} distance={:.1}",
            name,
            memory.state,
            can_see,
            dist
        );

        if can_see {
            memory.last_player_pos = Some(player_pos);
            memory.turns_since_player_seen = 0;

            if should_flee {
                memory.state = AiState::Fleeing;
            } else if dist <= Self::HOSTILE_RANGE {
                memory.state = AiState::Hostile;
            } else if dist <= Self::ALERT_RANGE {
                memory.state = AiState::Alert;
            }
        } else {
            memory.turns_since_player_seen += 1;

            match memory.state {
                AiState::Fleeing => {
                    if memory.turns_since_player_seen > Self::FLEE_GIVE_UP_TURNS {
                        memory.state = AiState::Idle;
                    }
                }
                AiState::Hostile | AiState::Alert => {
                    if memory.turns_since_player_seen > Self::MEMORY_TURNS {
                        let home = memory.assigned_room;
                        let outside_home = home
                            .map_or(true, |idx| !Self::in_room(monster_pos, level, idx));
                        if home.is_some() && outside_home {
                            memory.state = AiState::Returning;
                        } else {
                            memory.state = AiState::Idle;
                        }
                    }
                }
                AiState::Returning => {
                    if memory
                        .assigned_room
                        .map_or(false, |idx| Self::in_room(monster_pos, level, idx))
                    {
                        memory.state = AiState::Idle;
                    }
                }
                AiState::Idle => {}
            }
        }
    }

    /// Picks the monster's destination tile for this turn.
    ///
    /// Returning the current position means "stay put".
    pub fn next_move(
        monster: &mut Monster,
        player: &PlayerCharacter,
        level: &Level,
        rng: &mut StdRng,
    ) -> Position {
        let state = monster.ai_mut().state;

        let next = match state {
            AiState::Idle => Self::choose_idle_move(monster, level, rng),
            AiState::Alert => {
                // An alerted monster only has somewhere to go once it has a
                // sighting to investigate.
                if monster.ai_mut().last_player_pos.is_some() {
                    Self::choose_hostile_move(monster, player, level)
                } else {
                    monster.position
                }
            }
            AiState::Hostile => Self::choose_hostile_move(monster, player, level),
            AiState::Fleeing => Self::choose_fleeing_move(monster, player, level),
            AiState::Returning => Self::choose_return_move(monster, level),
        };

        if next != monster.position {
            trace!(
                "{} ({:?}) moving to ({}, {})",
                monster.name,
                state,
                next.x,
                next.y
            );
        }

        next
    }

    /// Gives a monster a home room, bounding its idle wander and acting as
    /// its return destination.
    pub fn assign_room(monster: &mut Monster, level: &Level, room_index: usize) {
        let center = level.rooms.get(room_index).map(|room| room.center());
        let memory = monster.ai_mut();
        memory.assigned_room = Some(room_index);
        memory.home_room_center = center;
    }

    /// Whether the monster can currently see the player.
    ///
    /// True iff the player is within vision range and an unobstructed line
    /// of sight exists.
    pub fn can_see_player(monster: &Monster, player: &PlayerCharacter, level: &Level) -> bool {
        let dist = pathfinding::distance(monster.position, player.position);
        if dist > Self::VISION_RANGE {
            return false;
        }
        pathfinding::has_line_of_sight(monster.position, player.position, level)
    }

    /// Throttled random wander, bounded to the assigned room if any.
    fn choose_idle_move(monster: &mut Monster, level: &Level, rng: &mut StdRng) -> Position {
        let current = monster.position;
        let memory = monster.ai_mut();

        memory.idle_move_counter += 1;
        if memory.idle_move_counter < Self::IDLE_MOVE_PERIOD {
            return current;
        }
        memory.idle_move_counter = 0;
        let assigned_room = memory.assigned_room;

        let mut moves = pathfinding::walkable_neighbors(current, level, true);
        if let Some(idx) = assigned_room {
            moves.retain(|&pos| Self::in_room(pos, level, idx));
        }

        if moves.is_empty() {
            return current;
        }
        moves[rng.gen_range(0..moves.len())]
    }

    /// Pursuit via a cached A* path, recomputed only when exhausted, with a
    /// greedy fallback when no path exists.
    fn choose_hostile_move(
        monster: &mut Monster,
        player: &PlayerCharacter,
        level: &Level,
    ) -> Position {
        let current = monster.position;
        let live_target = player.position;
        let memory = monster.ai_mut();

        // Chase the remembered position while out of sight, the live one
        // otherwise.
        let target = match memory.last_player_pos {
            Some(last) if memory.turns_since_player_seen > 0 => last,
            _ => live_target,
        };

        if memory.cached_path.is_empty() || memory.path_exhausted() {
            memory.cached_path = pathfinding::find_path(current, target, level, true);
            memory.path_cursor = 0;
        }

        if !memory.path_exhausted() {
            let next = memory.cached_path[memory.path_cursor];
            memory.path_cursor += 1;
            return next;
        }

        // No route: inch toward the target greedily.
        let moves = pathfinding::walkable_neighbors(current, level, true);
        let mut best_move = current;
        let mut best_dist = pathfinding::distance(current, target);
        for candidate in moves {
            let dist = pathfinding::distance(candidate, target);
            if dist < best_dist {
                best_dist = dist;
                best_move = candidate;
            }
        }
        best_move
    }

    /// Gradient ascent away from the player; no path caching.
    fn choose_fleeing_move(
        monster: &mut Monster,
        player: &PlayerCharacter,
        level: &Level,
    ) -> Position {
        let current = monster.position;
        let player_pos = player.position;

        let moves = pathfinding::walkable_neighbors(current, level, true);
        let mut best_move = current;
        let mut best_dist = pathfinding::distance(current, player_pos);
        for candidate in moves {
            let dist = pathfinding::distance(candidate, player_pos);
            if dist > best_dist {
                best_dist = dist;
                best_move = candidate;
            }
        }
        best_move
    }

    /// Walks the cached path back to the home room's center.
    fn choose_return_move(monster: &mut Monster, level: &Level) -> Position {
        let current = monster.position;
        let memory = monster.ai_mut();

        let center = match (memory.assigned_room, memory.home_room_center) {
            (Some(_), Some(center)) => center,
            _ => return current,
        };

        if memory.cached_path.is_empty() || memory.path_exhausted() {
            memory.cached_path = pathfinding::find_path(current, center, level, true);
            memory.path_cursor = 0;
        }

        if !memory.path_exhausted() {
            let next = memory.cached_path[memory.path_cursor];
            memory.path_cursor += 1;
            return next;
        }

        current
    }

    /// Whether a position lies inside the given room of the level.
    fn in_room(pos: Position, level: &Level, room_index: usize) -> bool {
        level
            .rooms
            .get(room_index)
            .map_or(false, |room| room.contains(pos))
    }
}
