//! # Spawn Manager
//!
//! Monster placement and aggregate threat tracking.
//!
//! The spawn manager populates a freshly generated level, keeps trickling
//! in monsters during play subject to a rate and a population cap, and
//! reports the summed threat of whatever is currently alive. Spawned
//! monsters are handed back to the caller for insertion; monsters placed
//! inside a room get that room assigned as their AI territory.

use crate::ai::MonsterAi;
use crate::game::{GameConfig, Level, Monster, PlayerCharacter, Position, SpeciesRegistry, TileType};
use crate::utils::pathfinding;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One row of the spawn table: which species can appear at which depths,
/// how often, and how dangerous it counts as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub species: String,
    pub min_depth: i32,
    pub max_depth: i32,
    pub weight: f32,
    pub threat_value: i32,
}

impl SpawnEntry {
    pub fn new(species: &str, min_depth: i32, max_depth: i32, weight: f32, threat_value: i32) -> Self {
        Self {
            species: species.to_string(),
            min_depth,
            max_depth,
            weight,
            threat_value,
        }
    }
}

/// The stock spawn table.
fn default_spawn_table() -> Vec<SpawnEntry> {
    vec![
        SpawnEntry::new("gutter_rat", 1, 5, 1.0, 1),
        SpawnEntry::new("cave_spider", 1, 10, 0.8, 2),
        SpawnEntry::new("kobold", 2, 15, 0.7, 2),
        SpawnEntry::new("orc_rookling", 3, 20, 0.6, 3),
        SpawnEntry::new("zombie", 5, 30, 0.5, 4),
    ]
}

/// Decides when and where new monsters enter the level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnManager {
    turns_since_spawn: u32,
    spawn_rate: u32,
    max_monsters: u32,
    initial_monster_count: u32,
    min_spawn_distance: f32,
    spawn_outside_fov: bool,
    room_spawn_percentage: f32,
    fov_radius: u32,
    spawn_table: Vec<SpawnEntry>,
}

impl SpawnManager {
    /// Creates a spawn manager from the game configuration with the stock
    /// spawn table.
    pub fn new(config: &GameConfig) -> Self {
        Self::with_table(config, default_spawn_table())
    }

    /// Creates a spawn manager with a custom spawn table.
    pub fn with_table(config: &GameConfig, spawn_table: Vec<SpawnEntry>) -> Self {
        Self {
            turns_since_spawn: 0,
            spawn_rate: config.monster_spawn_rate,
            max_monsters: config.max_monsters_per_level,
            initial_monster_count: config.initial_monster_count,
            min_spawn_distance: config.min_spawn_distance,
            spawn_outside_fov: config.spawn_outside_fov,
            room_spawn_percentage: config.room_spawn_percentage,
            fov_radius: config.fov_radius,
            spawn_table,
        }
    }

    /// Places the initial monster population for a level.
    ///
    /// Room and corridor candidates are shuffled independently; a
    /// `room_spawn_percentage` share of the target count goes to rooms and
    /// the remainder to corridors, spilling back into unused room points if
    /// the corridors run dry. Monsters spawned in a room get it as their
    /// home territory.
    pub fn spawn_initial_monsters(
        &self,
        level: &Level,
        player: Option<&PlayerCharacter>,
        registry: &SpeciesRegistry,
        depth: i32,
        rng: &mut StdRng,
    ) -> Vec<Monster> {
        let mut room_points = self.room_spawn_points(level, player);
        let mut corridor_points = self.corridor_spawn_points(level, player);
        room_points.shuffle(rng);
        corridor_points.shuffle(rng);

        let target = self.initial_monster_count as usize;
        let room_quota =
            (self.initial_monster_count as f32 * self.room_spawn_percentage) as usize;
        let corridor_quota = target - room_quota;

        let mut spawned = Vec::new();

        let mut rooms_used = 0;
        for &point in room_points.iter() {
            if spawned.len() >= room_quota {
                break;
            }
            if let Some(monster) = self.spawn_at(point, level, registry, depth, rng, true) {
                spawned.push(monster);
            }
            rooms_used += 1;
        }

        let mut corridor_spawned = 0;
        for &point in corridor_points.iter() {
            if corridor_spawned >= corridor_quota {
                break;
            }
            if let Some(monster) = self.spawn_at(point, level, registry, depth, rng, false) {
                spawned.push(monster);
                corridor_spawned += 1;
            }
        }

        // Corridors ran out before the quota: spill into unused room points.
        for &point in room_points.iter().skip(rooms_used) {
            if spawned.len() >= target {
                break;
            }
            if let Some(monster) = self.spawn_at(point, level, registry, depth, rng, true) {
                spawned.push(monster);
            }
        }

        debug!(
            "initial spawn: {} monsters at depth {} ({} room points, {} corridor points)",
            spawned.len(),
            depth,
            room_points.len(),
            corridor_points.len()
        );

        spawned
    }

    /// Runs one game turn of dynamic spawning.
    ///
    /// No-op until `spawn_rate` turns have passed; then the counter resets
    /// and exactly one spawn is attempted, skipped entirely while the level
    /// holds `max_monsters` or more.
    pub fn update(
        &mut self,
        level: &Level,
        player: Option<&PlayerCharacter>,
        live_monster_count: usize,
        registry: &SpeciesRegistry,
        depth: i32,
        rng: &mut StdRng,
    ) -> Option<Monster> {
        self.turns_since_spawn += 1;
        if self.turns_since_spawn < self.spawn_rate {
            return None;
        }
        self.turns_since_spawn = 0;

        if live_monster_count >= self.max_monsters as usize {
            trace!("spawn skipped: population at cap ({})", live_monster_count);
            return None;
        }

        // Weighted coin flip for room versus corridor, with fallback to the
        // other pool when the chosen one is empty.
        let prefer_room = rng.gen_range(0.0f32..1.0) < self.room_spawn_percentage;
        let (mut points, mut in_room) = if prefer_room {
            (self.room_spawn_points(level, player), true)
        } else {
            (self.corridor_spawn_points(level, player), false)
        };
        if points.is_empty() {
            points = if prefer_room {
                in_room = false;
                self.corridor_spawn_points(level, player)
            } else {
                in_room = true;
                self.room_spawn_points(level, player)
            };
        }
        if points.is_empty() {
            return None;
        }

        let point = points[rng.gen_range(0..points.len())];
        self.spawn_at(point, level, registry, depth, rng, in_room)
    }

    /// Creates a depth-appropriate monster at a point, assigning the
    /// containing room as home territory when asked to.
    fn spawn_at(
        &self,
        point: Position,
        level: &Level,
        registry: &SpeciesRegistry,
        depth: i32,
        rng: &mut StdRng,
        assign_room: bool,
    ) -> Option<Monster> {
        let species = self.select_species(depth, rng)?.to_string();
        let mut monster = registry.create_monster(&species, point)?;

        if assign_room {
            if let Some(room_index) = level.room_index_at(point) {
                MonsterAi::assign_room(&mut monster, level, room_index);
            }
        }

        trace!("spawned {} at ({}, {})", monster.name, point.x, point.y);
        Some(monster)
    }

    /// All tiles where a monster may legally appear.
    pub fn get_valid_spawn_points(
        &self,
        level: &Level,
        player: Option<&PlayerCharacter>,
    ) -> Vec<Position> {
        let mut points = Vec::new();
        for y in 1..level.height as i32 - 1 {
            for x in 1..level.width as i32 - 1 {
                if self.is_valid_spawn_point(level, player, x, y) {
                    points.push(Position::new(x, y));
                }
            }
        }
        points
    }

    /// Valid spawn points covered by a registered room.
    fn room_spawn_points(&self, level: &Level, player: Option<&PlayerCharacter>) -> Vec<Position> {
        self.get_valid_spawn_points(level, player)
            .into_iter()
            .filter(|&pos| level.room_at(pos).is_some())
            .collect()
    }

    /// Valid spawn points not covered by any room.
    fn corridor_spawn_points(
        &self,
        level: &Level,
        player: Option<&PlayerCharacter>,
    ) -> Vec<Position> {
        self.get_valid_spawn_points(level, player)
            .into_iter()
            .filter(|&pos| level.room_at(pos).is_none())
            .collect()
    }

    /// Whether one tile qualifies as a spawn point.
    fn is_valid_spawn_point(
        &self,
        level: &Level,
        player: Option<&PlayerCharacter>,
        x: i32,
        y: i32,
    ) -> bool {
        if !level.is_walkable(x, y) {
            return false;
        }

        // Never spawn on the stairs.
        if let Some(tile) = level.get_tile(Position::new(x, y)) {
            if matches!(tile.tile_type, TileType::StairsUp | TileType::StairsDown) {
                return false;
            }
        }

        if let Some(player) = player {
            let dist = pathfinding::distance(Position::new(x, y), player.position);
            if dist < self.min_spawn_distance {
                return false;
            }
            // FOV is approximated by a flat radius here.
            if self.spawn_outside_fov && dist <= self.fov_radius as f32 {
                return false;
            }
        }

        true
    }

    /// Picks a species for the given depth by cumulative-weight roll over
    /// the depth-filtered spawn table.
    ///
    /// Returns `None` when no table entry covers the depth.
    pub fn select_species(&self, depth: i32, rng: &mut StdRng) -> Option<&str> {
        let candidates: Vec<&SpawnEntry> = self
            .spawn_table
            .iter()
            .filter(|entry| depth >= entry.min_depth && depth <= entry.max_depth)
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let total_weight: f32 = candidates.iter().map(|entry| entry.weight).sum();
        let roll = rng.gen_range(0.0..=total_weight);

        let mut cumulative = 0.0;
        for entry in &candidates {
            cumulative += entry.weight;
            if roll <= cumulative {
                return Some(&entry.species);
            }
        }

        // Floating-point edge: fall back to the first candidate.
        Some(&candidates[0].species)
    }

    /// Sums the threat values of all live monsters.
    ///
    /// Recomputed from scratch on every call; species missing from the
    /// spawn table contribute nothing.
    pub fn current_threat_level<'a>(&self, monsters: impl Iterator<Item = &'a Monster>) -> i32 {
        monsters
            .filter(|monster| monster.is_alive())
            .map(|monster| {
                self.spawn_table
                    .iter()
                    .find(|entry| entry.species == monster.species)
                    .map_or(0, |entry| entry.threat_value)
            })
            .sum()
    }

    /// The configured spawn table.
    pub fn spawn_table(&self) -> &[SpawnEntry] {
        &self.spawn_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tile;
    use crate::generation::Room;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn open_level_with_room(width: u32, height: u32) -> Level {
        let mut level = Level::new(0, width, height);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                level.set_tile(Position::new(x, y), Tile::floor()).unwrap();
            }
        }
        level.rooms.push(Room::new(0, 2, 2, 10, 10));
        level
    }

    fn manager() -> SpawnManager {
        SpawnManager::new(&GameConfig::default())
    }

    #[test]
    fn test_spawn_points_respect_min_distance() {
        let level = open_level_with_room(30, 30);
        let player = PlayerCharacter::new("Hero".to_string(), Position::new(15, 15));
        let manager = manager();

        for point in manager.get_valid_spawn_points(&level, Some(&player)) {
            let dist = pathfinding::distance(point, player.position);
            assert!(
                dist >= 5.0,
                "spawn point ({}, {}) too close to player",
                point.x,
                point.y
            );
        }
    }

    #[test]
    fn test_spawn_points_exclude_stairs() {
        let mut level = open_level_with_room(30, 30);
        let stairs = Position::new(5, 5);
        level
            .set_tile(stairs, Tile::new(TileType::StairsDown))
            .unwrap();
        let manager = manager();

        let points = manager.get_valid_spawn_points(&level, None);
        assert!(!points.contains(&stairs));
    }

    #[test]
    fn test_spawn_points_outside_fov_radius() {
        let level = open_level_with_room(40, 40);
        let player = PlayerCharacter::new("Hero".to_string(), Position::new(20, 20));
        let manager = manager();

        for point in manager.get_valid_spawn_points(&level, Some(&player)) {
            let dist = pathfinding::distance(point, player.position);
            assert!(dist > 10.0, "spawn point inside the player's FOV radius");
        }
    }

    #[test]
    fn test_species_selection_respects_depth() {
        let manager = manager();
        let mut rng = StdRng::seed_from_u64(99);

        // At depth 1 only the rat and the spider qualify.
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let species = manager.select_species(1, &mut rng).unwrap();
            seen.insert(species.to_string());
            assert!(
                species == "gutter_rat" || species == "cave_spider",
                "species {} should not appear at depth 1",
                species
            );
        }
        assert_eq!(seen.len(), 2, "both depth-1 species should appear");
    }

    #[test]
    fn test_species_selection_empty_for_uncovered_depth() {
        let manager = manager();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(manager.select_species(100, &mut rng).is_none());
        assert!(manager.select_species(0, &mut rng).is_none());
    }

    #[test]
    fn test_initial_spawn_hits_target_count() {
        let level = open_level_with_room(40, 40);
        let registry = SpeciesRegistry::builtin();
        let manager = manager();
        let mut rng = StdRng::seed_from_u64(4242);

        let monsters = manager.spawn_initial_monsters(&level, None, &registry, 1, &mut rng);
        assert_eq!(monsters.len(), 10);
    }

    #[test]
    fn test_initial_spawn_assigns_rooms_to_room_monsters() {
        let level = open_level_with_room(40, 40);
        let registry = SpeciesRegistry::builtin();
        let manager = manager();
        let mut rng = StdRng::seed_from_u64(7);

        let monsters = manager.spawn_initial_monsters(&level, None, &registry, 1, &mut rng);
        for monster in &monsters {
            let in_room = level.room_at(monster.position).is_some();
            let assigned = monster
                .ai
                .as_ref()
                .map_or(false, |memory| memory.assigned_room.is_some());
            assert_eq!(in_room, assigned);
        }
    }

    #[test]
    fn test_update_waits_for_spawn_rate() {
        let level = open_level_with_room(40, 40);
        let registry = SpeciesRegistry::builtin();
        let mut config = GameConfig::default();
        config.monster_spawn_rate = 5;
        let mut manager = SpawnManager::with_table(&config, default_spawn_table());
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..4 {
            assert!(manager
                .update(&level, None, 0, &registry, 1, &mut rng)
                .is_none());
        }
        let spawned = manager.update(&level, None, 0, &registry, 1, &mut rng);
        assert!(spawned.is_some());
    }

    #[test]
    fn test_update_respects_population_cap() {
        let level = open_level_with_room(40, 40);
        let registry = SpeciesRegistry::builtin();
        let mut config = GameConfig::default();
        config.monster_spawn_rate = 1;
        config.max_monsters_per_level = 3;
        let mut manager = SpawnManager::with_table(&config, default_spawn_table());
        let mut rng = StdRng::seed_from_u64(13);

        assert!(manager
            .update(&level, None, 3, &registry, 1, &mut rng)
            .is_none());
        assert!(manager
            .update(&level, None, 2, &registry, 1, &mut rng)
            .is_some());
    }

    #[test]
    fn test_threat_level_sums_table_values() {
        let registry = SpeciesRegistry::builtin();
        let manager = manager();

        let monsters = vec![
            registry
                .create_monster("gutter_rat", Position::new(1, 1))
                .unwrap(),
            registry
                .create_monster("cave_spider", Position::new(2, 2))
                .unwrap(),
            registry
                .create_monster("orc_rookling", Position::new(3, 3))
                .unwrap(),
        ];

        assert_eq!(manager.current_threat_level(monsters.iter()), 6);
    }

    #[test]
    fn test_threat_ignores_dead_and_unknown() {
        let registry = SpeciesRegistry::builtin();
        let manager = manager();

        let mut rat = registry
            .create_monster("gutter_rat", Position::new(1, 1))
            .unwrap();
        rat.hp = 0;
        // The orc is absent from the spawn table, so it contributes nothing.
        let orc = registry.create_monster("orc", Position::new(2, 2)).unwrap();

        let monsters = vec![rat, orc];
        assert_eq!(manager.current_threat_level(monsters.iter()), 0);
    }
}
