//! # Dungeon Generation
//!
//! Room-and-corridor layout carving.
//!
//! Rooms are dropped at random positions with rejection sampling, chained
//! together with L-shaped corridors, and finished with doors and stairs. A
//! final flood fill proves every carved room can be reached before the
//! level is handed to the game.

use crate::game::{Level, Position, Tile, TileType};
use crate::generation::{validate_level, GenerationConfig, Room};
use crate::{GloamError, GloamResult};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashSet;

/// Carves room-and-corridor levels.
#[derive(Debug, Clone)]
pub struct DungeonGenerator {
    /// Placement attempts per room before it is skipped
    pub room_attempts: u32,
}

impl DungeonGenerator {
    pub fn new() -> Self {
        Self { room_attempts: 100 }
    }

    /// Carves a level for the given depth out of solid wall.
    ///
    /// The player spawn lands in the first room placed; stairs down go in
    /// the last.
    pub fn generate(
        &self,
        depth: u32,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GloamResult<Level> {
        let mut level = Level::new(depth, config.level_width, config.level_height);

        let rooms = self.place_rooms(&mut level, config, rng)?;
        self.carve_corridors(&mut level, &rooms, config, rng)?;
        self.place_doors(&mut level, &rooms, config, rng)?;
        self.place_stairs(&mut level, &rooms, rng)?;
        self.check_connectivity(&level, &rooms)?;

        level.player_spawn = rooms[0].center();
        level.rooms = rooms;

        validate_level(&level)?;
        Ok(level)
    }

    /// Drops non-overlapping rooms, carving each interior as it lands.
    fn place_rooms(
        &self,
        level: &mut Level,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GloamResult<Vec<Room>> {
        let wanted = rng.gen_range(config.min_rooms..=config.max_rooms);
        let mut rooms: Vec<Room> = Vec::new();

        'rooms: for id in 0..wanted {
            for _ in 0..self.room_attempts {
                let w = rng.gen_range(config.min_room_size..=config.max_room_size) as i32;
                let h = rng.gen_range(config.min_room_size..=config.max_room_size) as i32;
                let max_x = level.width as i32 - w - 1;
                let max_y = level.height as i32 - h - 1;
                if max_x <= 1 || max_y <= 1 {
                    continue;
                }

                let candidate = Room::new(
                    id,
                    rng.gen_range(1..max_x),
                    rng.gen_range(1..max_y),
                    w as u32,
                    h as u32,
                );
                if rooms.iter().any(|placed| candidate.overlaps(placed)) {
                    continue;
                }

                for pos in candidate.floor_positions() {
                    level.set_tile(pos, Tile::floor())?;
                }
                rooms.push(candidate);
                continue 'rooms;
            }
            // This room never found a gap; move on without it.
        }

        if rooms.is_empty() {
            return Err(GloamError::GenerationFailed(
                "Failed to place any rooms".to_string(),
            ));
        }

        Ok(rooms)
    }

    /// Chains consecutive rooms with L corridors, then adds a few loops.
    fn carve_corridors(
        &self,
        level: &mut Level,
        rooms: &[Room],
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GloamResult<()> {
        for pair in rooms.windows(2) {
            self.carve_l_corridor(level, pair[0].center(), pair[1].center())?;
        }

        let loops = (rooms.len() as f64 * config.extra_connection_chance) as usize;
        for _ in 0..loops {
            let a = rng.gen_range(0..rooms.len());
            let b = rng.gen_range(0..rooms.len());
            if a != b {
                self.carve_l_corridor(level, rooms[a].center(), rooms[b].center())?;
            }
        }

        Ok(())
    }

    /// Carves an L between two points: horizontal leg along the start row,
    /// vertical leg along the end column.
    fn carve_l_corridor(
        &self,
        level: &mut Level,
        start: Position,
        end: Position,
    ) -> GloamResult<()> {
        for x in start.x.min(end.x)..=start.x.max(end.x) {
            let pos = Position::new(x, start.y);
            if level.is_valid_position(pos) {
                level.set_tile(pos, Tile::floor())?;
            }
        }
        for y in start.y.min(end.y)..=start.y.max(end.y) {
            let pos = Position::new(end.x, y);
            if level.is_valid_position(pos) {
                level.set_tile(pos, Tile::floor())?;
            }
        }
        Ok(())
    }

    /// Turns some corridor openings in room walls into closed doors.
    fn place_doors(
        &self,
        level: &mut Level,
        rooms: &[Room],
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GloamResult<()> {
        if config.door_chance <= 0.0 {
            return Ok(());
        }

        for room in rooms {
            for gap in room.wall_positions() {
                let pierced = level
                    .get_tile(gap)
                    .map_or(false, |tile| tile.tile_type == TileType::Floor);
                if pierced && rng.gen_bool(config.door_chance) {
                    level.set_tile(gap, Tile::new(TileType::Door { is_open: false }))?;
                }
            }
        }

        Ok(())
    }

    /// Puts stairs up in the first room and, when there is more than one
    /// room, stairs down in the last.
    fn place_stairs(&self, level: &mut Level, rooms: &[Room], rng: &mut StdRng) -> GloamResult<()> {
        let up_tiles = rooms[0].floor_positions();
        if let Some(&pos) = up_tiles.get(rng.gen_range(0..up_tiles.len().max(1))) {
            level.set_tile(pos, Tile::new(TileType::StairsUp))?;
            level.stairs_up_position = Some(pos);
        }

        if rooms.len() > 1 {
            let down_tiles = rooms[rooms.len() - 1].floor_positions();
            if let Some(&pos) = down_tiles.get(rng.gen_range(0..down_tiles.len().max(1))) {
                level.set_tile(pos, Tile::new(TileType::StairsDown))?;
                level.stairs_down_position = Some(pos);
            }
        }

        Ok(())
    }

    /// Flood fills from the first room and verifies every carved room tile
    /// was reached. Closed doors count as passable for this check.
    fn check_connectivity(&self, level: &Level, rooms: &[Room]) -> GloamResult<()> {
        let start = rooms[0].center();
        let mut reached = HashSet::from([start]);
        let mut frontier = vec![start];

        while let Some(pos) = frontier.pop() {
            for next in pos.cardinal_adjacent_positions() {
                if reached.contains(&next) {
                    continue;
                }
                let passable = level.get_tile(next).map_or(false, |tile| {
                    tile.tile_type.is_walkable() || matches!(tile.tile_type, TileType::Door { .. })
                });
                if passable {
                    reached.insert(next);
                    frontier.push(next);
                }
            }
        }

        for room in rooms {
            let cut_off = room.floor_positions().into_iter().any(|pos| {
                level
                    .get_tile(pos)
                    .map_or(false, |tile| tile.tile_type.is_walkable())
                    && !reached.contains(&pos)
            });
            if cut_off {
                return Err(GloamError::GenerationFailed(format!(
                    "Room {} is not connected to other rooms",
                    room.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for DungeonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generate(seed: u64) -> Level {
        let config = GenerationConfig::for_testing(seed);
        let mut rng = StdRng::seed_from_u64(config.seed);
        DungeonGenerator::new().generate(0, &config, &mut rng).unwrap()
    }

    #[test]
    fn generated_levels_have_rooms_and_floor() {
        for seed in [3, 1415, 92653] {
            let level = generate(seed);
            assert!(!level.rooms.is_empty());

            let floor = level
                .tiles
                .iter()
                .flatten()
                .filter(|tile| tile.tile_type == TileType::Floor)
                .count();
            assert!(floor > 0, "seed {} carved nothing", seed);
        }
    }

    #[test]
    fn player_spawn_is_inside_a_room() {
        let level = generate(58979);
        let spawn = level.player_spawn;
        assert!(level.is_walkable(spawn.x, spawn.y));
        assert!(level.room_at(spawn).is_some());
    }

    #[test]
    fn same_seed_carves_the_same_level() {
        let config = GenerationConfig::for_testing(31337);
        let generator = DungeonGenerator::new();

        let mut rng_a = StdRng::seed_from_u64(config.seed);
        let mut rng_b = StdRng::seed_from_u64(config.seed);
        let a = generator.generate(0, &config, &mut rng_a).unwrap();
        let b = generator.generate(0, &config, &mut rng_b).unwrap();

        assert_eq!(a.rooms, b.rooms);
        assert_eq!(a.player_spawn, b.player_spawn);
        assert_eq!(a.stairs_down_position, b.stairs_down_position);
    }

    #[test]
    fn l_corridor_includes_both_legs_and_the_elbow() {
        let generator = DungeonGenerator::new();
        let mut level = Level::new(0, 20, 20);

        let start = Position::new(4, 6);
        let end = Position::new(14, 16);
        generator.carve_l_corridor(&mut level, start, end).unwrap();

        for probe in [start, end, Position::new(14, 6)] {
            assert_eq!(level.get_tile(probe).unwrap().tile_type, TileType::Floor);
        }
        // The opposite elbow stays solid.
        assert_eq!(
            level.get_tile(Position::new(4, 16)).unwrap().tile_type,
            TileType::Wall
        );
    }

    #[test]
    fn stairs_are_placed_on_floor_tiles() {
        let level = generate(23846);
        let up = level.stairs_up_position.expect("stairs up always placed");
        assert_eq!(level.get_tile(up).unwrap().tile_type, TileType::StairsUp);

        if level.rooms.len() > 1 {
            let down = level.stairs_down_position.expect("multi-room level has stairs down");
            assert_eq!(level.get_tile(down).unwrap().tile_type, TileType::StairsDown);
        }
    }

    #[test]
    fn every_room_is_reachable_from_the_first() {
        // check_connectivity runs inside generate; a disconnected pair of
        // rooms built by hand must be rejected.
        let generator = DungeonGenerator::new();
        let mut level = Level::new(0, 30, 20);
        let rooms = vec![Room::new(0, 2, 2, 6, 6), Room::new(1, 20, 10, 6, 6)];
        for room in &rooms {
            for pos in room.floor_positions() {
                level.set_tile(pos, Tile::floor()).unwrap();
            }
        }

        assert!(generator.check_connectivity(&level, &rooms).is_err());
        generator
            .carve_l_corridor(&mut level, rooms[0].center(), rooms[1].center())
            .unwrap();
        assert!(generator.check_connectivity(&level, &rooms).is_ok());
    }
}
