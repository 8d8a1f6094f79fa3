//! # Generation Module
//!
//! Procedural dungeon layout generation.
//!
//! Levels are carved from solid rock as rectangular rooms joined by
//! corridors. The room list survives generation on the
//! [`Level`](crate::Level) itself so that spawning and monster AI can
//! reason about territory: a monster assigned to a room wanders inside it
//! and returns to it when it loses the player.

pub mod dungeon;

pub use dungeon::*;

use crate::game::{Level, Position, TileType};
use crate::{GloamError, GloamResult};
use serde::{Deserialize, Serialize};

/// Knobs controlling dungeon layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seed the layout is derived from
    pub seed: u64,
    pub level_width: u32,
    pub level_height: u32,
    /// Smallest room edge, walls included
    pub min_room_size: u32,
    /// Largest room edge, walls included
    pub max_room_size: u32,
    pub min_rooms: u32,
    pub max_rooms: u32,
    /// Chance of carving loop corridors beyond the spanning chain
    pub extra_connection_chance: f64,
    /// Chance of a door where a corridor pierces a room wall
    pub door_chance: f64,
}

impl GenerationConfig {
    /// The standard full-size layout for the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            level_width: 80,
            level_height: 40,
            min_room_size: 4,
            max_room_size: 12,
            min_rooms: 6,
            max_rooms: 15,
            extra_connection_chance: 0.15,
            door_chance: 0.15,
        }
    }

    /// A small doorless layout that keeps tests fast.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            level_width: 40,
            level_height: 24,
            min_room_size: 3,
            max_room_size: 6,
            min_rooms: 3,
            max_rooms: 6,
            extra_connection_chance: 0.1,
            door_chance: 0.0,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A rectangular room, wall ring included.
///
/// Rooms are owned by their level and referenced by index everywhere else;
/// the AI stores such an index as a monster's home territory.
///
/// ```
/// use gloam::{Position, Room};
///
/// let room = Room::new(0, 2, 3, 6, 5);
/// assert_eq!(room.center(), Position::new(5, 5));
/// assert!(room.contains(room.center()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Index of this room within its level
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Room {
    pub fn new(id: u32, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
        }
    }

    /// The room's center tile, rounding toward the top-left.
    pub fn center(&self) -> Position {
        Position::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// Whether a position falls within the room's rectangle, walls included.
    pub fn contains(&self, pos: Position) -> bool {
        let (x1, y1) = (self.x + self.width as i32, self.y + self.height as i32);
        pos.x >= self.x && pos.x < x1 && pos.y >= self.y && pos.y < y1
    }

    /// Whether this room's rectangle touches another's.
    pub fn overlaps(&self, other: &Room) -> bool {
        self.x < other.x + other.width as i32
            && other.x < self.x + self.width as i32
            && self.y < other.y + other.height as i32
            && other.y < self.y + self.height as i32
    }

    /// The carvable interior tiles, excluding the wall ring.
    pub fn floor_positions(&self) -> Vec<Position> {
        let xs = (self.x + 1)..(self.x + self.width as i32 - 1);
        let ys = (self.y + 1)..(self.y + self.height as i32 - 1);
        ys.flat_map(|y| xs.clone().map(move |x| Position::new(x, y)))
            .collect()
    }

    /// The tiles making up the wall ring.
    pub fn wall_positions(&self) -> Vec<Position> {
        let (x1, y1) = (self.x + self.width as i32 - 1, self.y + self.height as i32 - 1);
        let mut ring = Vec::new();
        for x in self.x..=x1 {
            ring.push(Position::new(x, self.y));
            ring.push(Position::new(x, y1));
        }
        for y in (self.y + 1)..y1 {
            ring.push(Position::new(self.x, y));
            ring.push(Position::new(x1, y));
        }
        ring
    }
}

/// Rejects a generated level that carved no floor at all.
pub fn validate_level(level: &Level) -> GloamResult<()> {
    let has_floor = level
        .tiles
        .iter()
        .flatten()
        .any(|tile| tile.tile_type == TileType::Floor);

    if !has_floor {
        return Err(GloamError::GenerationFailed(
            "Level has no floor tiles".to_string(),
        ));
    }

    Ok(())
}
