//! # Game State Module
//!
//! Central game state management and coordination between all game systems.
//!
//! [`GameState`] owns the world, the player, the live monster population
//! and the systems that act on them, and enforces the per-tick sequencing:
//! the player acts, every monster takes its AI turn, then the spawn manager
//! may act. Randomness is always passed in by the caller so a seeded
//! generator drives the whole tick deterministically.

use crate::ai::{AiState, MonsterAi};
use crate::combat::CombatSystem;
use crate::game::{
    EntityId, GameConfig, MessageLog, Monster, PlayerCharacter, Position, SpeciesRegistry,
    TileType, World,
};
use crate::generation::{DungeonGenerator, GenerationConfig};
use crate::spawn::SpawnManager;
use crate::{GloamError, GloamResult};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Depth at which descending the stairs wins the game.
pub const MAX_DEPTH: u32 = 26;

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStatistics {
    pub enemies_defeated: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub steps_taken: u64,
    pub max_depth_reached: u32,
}

/// Game completion state for handling endings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    /// Game is still in progress
    Playing,
    /// Player climbed out from depth 1 (escape ending)
    EscapedEarly,
    /// Player reached the bottom of the dungeon (victory)
    CompletedDungeon,
    /// Player died
    PlayerDied,
}

/// Central game state containing all game data and systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The game world containing all generated levels
    pub world: World,
    pub player: PlayerCharacter,
    /// Live monsters on the current level, by id
    pub monsters: HashMap<EntityId, Monster>,
    next_entity_id: EntityId,
    pub species: SpeciesRegistry,
    pub spawn_manager: SpawnManager,
    pub messages: MessageLog,
    pub config: GameConfig,
    pub turn_number: u64,
    /// Seed this game was started from
    pub rng_seed: u64,
    pub statistics: GameStatistics,
    pub completion_state: GameCompletionState,
}

impl GameState {
    /// Creates a new game: generates the first level, places the player at
    /// its spawn point and populates the initial monster set.
    pub fn new(seed: u64, config: GameConfig) -> GloamResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let generator = DungeonGenerator::new();
        let level = generator.generate(0, &GenerationConfig::new(seed), &mut rng)?;

        let spawn_pos = level.player_spawn;
        let mut world = World::new(seed);
        world.add_level(level);

        let player = PlayerCharacter::from_config("Adventurer".to_string(), spawn_pos, &config);
        let spawn_manager = SpawnManager::new(&config);

        let mut state = Self {
            world,
            player,
            monsters: HashMap::new(),
            next_entity_id: 1,
            species: SpeciesRegistry::builtin(),
            spawn_manager,
            messages: MessageLog::new(),
            config,
            turn_number: 0,
            rng_seed: seed,
            statistics: GameStatistics::default(),
            completion_state: GameCompletionState::Playing,
        };

        state.populate_current_level(&mut rng);
        state.update_player_visibility()?;
        state.statistics.max_depth_reached = 1;

        info!(
            "new game: seed={} depth=1 monsters={}",
            seed,
            state.monsters.len()
        );
        Ok(state)
    }

    /// Registers a monster and returns its id.
    pub fn add_monster(&mut self, monster: Monster) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        self.monsters.insert(id, monster);
        id
    }

    /// Finds the live monster standing on a position, if any.
    pub fn monster_at(&self, pos: Position) -> Option<EntityId> {
        self.monsters
            .iter()
            .find(|(_, monster)| monster.position == pos && monster.is_alive())
            .map(|(&id, _)| id)
    }

    /// Whether the game has reached an ending.
    pub fn is_game_ended(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Aggregate threat of the live monster population.
    pub fn current_threat_level(&self) -> i32 {
        self.spawn_manager.current_threat_level(self.monsters.values())
    }

    /// Executes a one-tile player step.
    ///
    /// Stepping into a monster attacks it, stepping into a closed door
    /// opens it, stepping into a wall does nothing. Returns whether the
    /// input consumed a turn.
    pub fn player_step(&mut self, delta: Position, rng: &mut StdRng) -> GloamResult<bool> {
        if self.is_game_ended() {
            return Ok(false);
        }

        let target = self.player.position + delta;

        // Bump attack.
        if let Some(id) = self.monster_at(target) {
            let monster = self
                .monsters
                .get_mut(&id)
                .expect("monster id from index must exist");
            let outcome =
                CombatSystem::process_attack(&self.player, monster, rng, Some(&mut self.messages));
            if outcome.hit {
                self.statistics.damage_dealt += outcome.damage as u64;
            }
            if outcome.fatal {
                let xp = monster.xp_value;
                self.monsters.remove(&id);
                self.player.xp += xp;
                self.statistics.enemies_defeated += 1;
            }
            return Ok(true);
        }

        let level = self
            .world
            .current_level_mut()
            .ok_or_else(|| GloamError::InvalidState("No current level".to_string()))?;

        // Closed doors open instead of blocking.
        if let Some(tile) = level.get_tile_mut(target) {
            if tile.tile_type == (TileType::Door { is_open: false }) {
                tile.tile_type = TileType::Door { is_open: true };
                self.messages.append("You open the door.");
                return Ok(true);
            }
        }

        if !level.is_walkable(target.x, target.y) {
            return Ok(false);
        }

        self.player.position = target;
        self.statistics.steps_taken += 1;
        self.update_player_visibility()?;
        Ok(true)
    }

    /// Uses the stairs under the player, if any.
    ///
    /// Returns whether a turn was consumed. Climbing up from depth 1 or
    /// down from the lowest depth ends the game instead of changing level.
    pub fn use_stairs(&mut self, rng: &mut StdRng) -> GloamResult<bool> {
        if self.is_game_ended() {
            return Ok(false);
        }

        let level = self
            .world
            .current_level()
            .ok_or_else(|| GloamError::InvalidState("No current level".to_string()))?;
        let tile_type = level
            .get_tile(self.player.position)
            .map(|tile| tile.tile_type.clone());

        match tile_type {
            Some(TileType::StairsDown) => {
                if self.world.current_level_id + 1 >= MAX_DEPTH {
                    self.completion_state = GameCompletionState::CompletedDungeon;
                    self.messages
                        .append("You reach the bottom of the dungeon. You have won!");
                    return Ok(true);
                }
                let target = self.world.current_level_id + 1;
                self.change_to_level(target, rng)?;
                self.messages
                    .append(format!("You descend to depth {}.", self.world.current_depth()));
                Ok(true)
            }
            Some(TileType::StairsUp) => {
                if self.world.current_level_id == 0 {
                    self.completion_state = GameCompletionState::EscapedEarly;
                    self.messages
                        .append("You climb back into the daylight. The dungeon keeps its secrets.");
                    return Ok(true);
                }
                let target = self.world.current_level_id - 1;
                self.change_to_level(target, rng)?;
                self.messages
                    .append(format!("You climb up to depth {}.", self.world.current_depth()));
                Ok(true)
            }
            _ => {
                self.messages.append("There are no stairs here.");
                Ok(false)
            }
        }
    }

    /// Advances the world by one tick: every monster takes its AI turn,
    /// then the spawn manager may act.
    pub fn advance_turn(&mut self, rng: &mut StdRng) -> GloamResult<()> {
        if self.is_game_ended() {
            return Ok(());
        }

        self.run_monster_turns(rng);
        self.run_spawn_update(rng);
        self.turn_number += 1;
        Ok(())
    }

    /// Runs one AI turn for every live monster, in id order.
    fn run_monster_turns(&mut self, rng: &mut StdRng) {
        let mut ids: Vec<EntityId> = self.monsters.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            if self.is_game_ended() {
                break;
            }

            let player_pos = self.player.position;

            enum Decision {
                Attack,
                Move(Position),
            }

            let decision = {
                let level = match self.world.current_level() {
                    Some(level) => level,
                    None => return,
                };
                let monster = match self.monsters.get_mut(&id) {
                    Some(monster) if monster.is_alive() => monster,
                    _ => continue,
                };

                MonsterAi::update(monster, &self.player, level);
                let state = monster.ai_mut().state;
                if state == AiState::Hostile && monster.position.is_adjacent(player_pos) {
                    Decision::Attack
                } else {
                    Decision::Move(MonsterAi::next_move(monster, &self.player, level, rng))
                }
            };

            match decision {
                Decision::Attack => {
                    let monster = self
                        .monsters
                        .get_mut(&id)
                        .expect("attacking monster must exist");
                    let outcome = CombatSystem::process_attack(
                        &*monster,
                        &mut self.player,
                        rng,
                        Some(&mut self.messages),
                    );
                    if outcome.hit {
                        self.statistics.damage_taken += outcome.damage as u64;
                    }
                    if outcome.fatal {
                        self.completion_state = GameCompletionState::PlayerDied;
                        debug!("player killed by {} on turn {}", monster.name, self.turn_number);
                    }
                }
                Decision::Move(next) => {
                    let current = self
                        .monsters
                        .get(&id)
                        .map(|monster| monster.position)
                        .expect("moving monster must exist");
                    if next == current {
                        continue;
                    }

                    let walkable = self
                        .world
                        .current_level()
                        .map_or(false, |level| level.is_walkable(next.x, next.y));
                    let occupied = next == self.player.position
                        || self
                            .monsters
                            .iter()
                            .any(|(&other, monster)| other != id && monster.position == next);

                    if walkable && !occupied {
                        self.monsters
                            .get_mut(&id)
                            .expect("moving monster must exist")
                            .position = next;
                    }
                }
            }
        }
    }

    /// Gives the spawn manager its end-of-tick slot.
    fn run_spawn_update(&mut self, rng: &mut StdRng) {
        let depth = self.world.current_depth();
        let spawned = {
            let level = match self.world.current_level() {
                Some(level) => level,
                None => return,
            };
            self.spawn_manager.update(
                level,
                Some(&self.player),
                self.monsters.len(),
                &self.species,
                depth,
                rng,
            )
        };

        if let Some(monster) = spawned {
            debug!("dynamic spawn: {} on turn {}", monster.name, self.turn_number);
            self.add_monster(monster);
        }
    }

    /// Moves the player to another level, generating and repopulating it as
    /// needed.
    fn change_to_level(&mut self, level_id: u32, rng: &mut StdRng) -> GloamResult<()> {
        if self.world.get_level(level_id).is_none() {
            self.generate_level(level_id)?;
        }

        self.world.change_level(level_id)?;

        let level = self
            .world
            .current_level()
            .ok_or_else(|| GloamError::InvalidState("No current level".to_string()))?;
        // Arrive on the matching staircase when there is one.
        self.player.position = if level_id > 0 {
            level.stairs_up_position.unwrap_or(level.player_spawn)
        } else {
            level.stairs_down_position.unwrap_or(level.player_spawn)
        };

        self.populate_current_level(rng);
        self.update_player_visibility()?;

        let depth = self.world.current_depth() as u32;
        if depth > self.statistics.max_depth_reached {
            self.statistics.max_depth_reached = depth;
        }
        Ok(())
    }

    /// Generates a level with a seed derived from the world seed.
    fn generate_level(&mut self, level_id: u32) -> GloamResult<()> {
        let level_seed = self.rng_seed.wrapping_add(level_id as u64 * 1000);
        let mut rng = StdRng::seed_from_u64(level_seed);
        let generator = DungeonGenerator::new();
        let level = generator.generate(level_id, &GenerationConfig::new(level_seed), &mut rng)?;
        self.world.add_level(level);
        Ok(())
    }

    /// Replaces the monster population with a fresh initial spawn for the
    /// current level.
    fn populate_current_level(&mut self, rng: &mut StdRng) {
        self.monsters.clear();

        let depth = self.world.current_depth();
        let spawned = {
            let level = match self.world.current_level() {
                Some(level) => level,
                None => return,
            };
            self.spawn_manager.spawn_initial_monsters(
                level,
                Some(&self.player),
                &self.species,
                depth,
                rng,
            )
        };

        for monster in spawned {
            self.add_monster(monster);
        }
    }

    /// Recomputes the player's field of view on the current level.
    pub fn update_player_visibility(&mut self) -> GloamResult<()> {
        let center = self.player.position;
        let radius = self.player.fov_radius;
        let level = self
            .world
            .current_level_mut()
            .ok_or_else(|| GloamError::InvalidState("No current level".to_string()))?;
        level.update_visibility(center, radius);
        Ok(())
    }

    /// Serializes the game state to JSON.
    pub fn save_to_json(&self) -> GloamResult<String> {
        serde_json::to_string_pretty(self).map_err(GloamError::from)
    }

    /// Restores a game state from JSON.
    pub fn load_from_json(json: &str) -> GloamResult<Self> {
        serde_json::from_str(json).map_err(GloamError::from)
    }

    /// Writes the game state to a save file.
    pub fn save_to_file(&self, path: &Path) -> GloamResult<()> {
        std::fs::write(path, self.save_to_json()?)?;
        Ok(())
    }

    /// Reads a game state back from a save file.
    pub fn load_from_file(path: &Path) -> GloamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::load_from_json(&contents)
    }
}
