//! # World Module
//!
//! Level grids and the multi-level world container.
//!
//! A [`Level`] owns its tile grid and the list of generated rooms, and is
//! the read-only spatial collaborator every other system queries: bounds,
//! walkability, transparency, and room lookup. The [`World`] keeps levels
//! by id and tracks which one is active.

use crate::generation::Room;
use crate::{GloamError, GloamResult, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kinds of tile a level grid can contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    /// Solid wall, blocks movement and sight
    Wall,
    /// Open floor
    Floor,
    /// A door that can be open or closed
    Door { is_open: bool },
    /// Stairs leading up toward the surface
    StairsUp,
    /// Stairs leading down to the next depth
    StairsDown,
}

impl TileType {
    /// Whether entities can stand on this tile.
    pub fn is_walkable(&self) -> bool {
        match self {
            TileType::Wall => false,
            TileType::Floor => true,
            TileType::Door { is_open } => *is_open,
            TileType::StairsUp | TileType::StairsDown => true,
        }
    }

    /// Whether sight lines pass through this tile.
    pub fn is_transparent(&self) -> bool {
        match self {
            TileType::Wall => false,
            TileType::Floor => true,
            TileType::Door { is_open } => *is_open,
            TileType::StairsUp | TileType::StairsDown => true,
        }
    }
}

/// A single grid cell with its visibility bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    /// Currently inside the player's field of view
    pub visible: bool,
    /// Seen at least once this game
    pub explored: bool,
}

impl Tile {
    /// Creates a tile of the given type, unseen and unexplored.
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            visible: false,
            explored: false,
        }
    }

    /// Convenience constructor for a floor tile.
    pub fn floor() -> Self {
        Self::new(TileType::Floor)
    }

    /// Convenience constructor for a wall tile.
    pub fn wall() -> Self {
        Self::new(TileType::Wall)
    }

    /// Marks the tile visible; visible tiles are also explored.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.explored = true;
        }
    }
}

/// A single dungeon level: tile grid, rooms, and stair positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Level identifier, equal to its 0-based depth
    pub id: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major tile grid, indexed `tiles[y][x]`
    pub tiles: Vec<Vec<Tile>>,
    /// Rooms carved during generation; referenced by index elsewhere
    pub rooms: Vec<Room>,
    /// Where the player enters this level
    pub player_spawn: Position,
    pub stairs_up_position: Option<Position>,
    pub stairs_down_position: Option<Position>,
}

impl Level {
    /// Creates a new level filled entirely with wall tiles.
    pub fn new(id: u32, width: u32, height: u32) -> Self {
        let tiles = vec![vec![Tile::wall(); width as usize]; height as usize];
        Self {
            id,
            width,
            height,
            tiles,
            rooms: Vec::new(),
            player_spawn: Position::origin(),
            stairs_up_position: None,
            stairs_down_position: None,
        }
    }

    /// Checks whether a coordinate lies inside the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Checks whether a position lies inside the grid.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        self.in_bounds(pos.x, pos.y)
    }

    /// Whether the tile at a coordinate can be stood on.
    ///
    /// Out-of-bounds coordinates are not walkable.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get_tile(Position::new(x, y))
            .map_or(false, |tile| tile.tile_type.is_walkable())
    }

    /// Whether sight passes through the tile at a coordinate.
    ///
    /// Out-of-bounds coordinates are opaque.
    pub fn is_transparent(&self, x: i32, y: i32) -> bool {
        self.get_tile(Position::new(x, y))
            .map_or(false, |tile| tile.tile_type.is_transparent())
    }

    /// Gets the tile at a position, if it is in bounds.
    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(&self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Gets the tile at a position mutably, if it is in bounds.
    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(&mut self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Replaces the tile at a position.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> GloamResult<()> {
        if !self.is_valid_position(pos) {
            return Err(GloamError::InvalidState(format!(
                "Position ({}, {}) out of level bounds",
                pos.x, pos.y
            )));
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Finds the room covering a position, if any.
    pub fn room_at(&self, pos: Position) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(pos))
    }

    /// Finds the index of the room covering a position, if any.
    pub fn room_index_at(&self, pos: Position) -> Option<usize> {
        self.rooms.iter().position(|room| room.contains(pos))
    }

    /// Recomputes tile visibility around a center point.
    ///
    /// Visibility is a flat Euclidean radius; tiles leaving the radius keep
    /// their explored flag.
    pub fn update_visibility(&mut self, center: Position, radius: u32) {
        for row in &mut self.tiles {
            for tile in row {
                tile.visible = false;
            }
        }

        let r = radius as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                let pos = Position::new(center.x + dx, center.y + dy);
                if center.euclidean_distance(pos) <= radius as f64 {
                    if let Some(tile) = self.get_tile_mut(pos) {
                        tile.set_visible(true);
                    }
                }
            }
        }
    }
}

/// The game world: all generated levels, keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub levels: HashMap<u32, Level>,
    pub current_level_id: u32,
    /// World generation seed, used to derive per-level seeds
    pub seed: u64,
}

impl World {
    /// Creates an empty world with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            levels: HashMap::new(),
            current_level_id: 0,
            seed,
        }
    }

    /// Inserts a level, replacing any existing level with the same id.
    pub fn add_level(&mut self, level: Level) {
        self.levels.insert(level.id, level);
    }

    /// Gets a level by id.
    pub fn get_level(&self, id: u32) -> Option<&Level> {
        self.levels.get(&id)
    }

    /// Gets the active level.
    pub fn current_level(&self) -> Option<&Level> {
        self.levels.get(&self.current_level_id)
    }

    /// Gets the active level mutably.
    pub fn current_level_mut(&mut self) -> Option<&mut Level> {
        self.levels.get_mut(&self.current_level_id)
    }

    /// Switches the active level.
    pub fn change_level(&mut self, id: u32) -> GloamResult<()> {
        if !self.levels.contains_key(&id) {
            return Err(GloamError::InvalidState(format!(
                "Level {} does not exist",
                id
            )));
        }
        self.current_level_id = id;
        Ok(())
    }

    /// The 1-based dungeon depth of the active level.
    pub fn current_depth(&self) -> i32 {
        self.current_level_id as i32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_starts_walled() {
        let level = Level::new(0, 10, 8);
        assert_eq!(level.width, 10);
        assert_eq!(level.height, 8);
        for y in 0..8 {
            for x in 0..10 {
                assert!(!level.is_walkable(x, y));
                assert!(!level.is_transparent(x, y));
            }
        }
    }

    #[test]
    fn test_level_bounds() {
        let level = Level::new(0, 10, 8);
        assert!(level.in_bounds(0, 0));
        assert!(level.in_bounds(9, 7));
        assert!(!level.in_bounds(10, 7));
        assert!(!level.in_bounds(-1, 0));
        assert!(!level.is_walkable(-1, -1));
    }

    #[test]
    fn test_set_and_query_tiles() {
        let mut level = Level::new(0, 10, 8);
        let pos = Position::new(3, 3);
        level.set_tile(pos, Tile::floor()).unwrap();

        assert!(level.is_walkable(3, 3));
        assert!(level.is_transparent(3, 3));
        assert!(level.set_tile(Position::new(20, 20), Tile::floor()).is_err());
    }

    #[test]
    fn test_closed_door_blocks() {
        let mut level = Level::new(0, 10, 8);
        let pos = Position::new(4, 4);
        level
            .set_tile(pos, Tile::new(TileType::Door { is_open: false }))
            .unwrap();
        assert!(!level.is_walkable(4, 4));
        assert!(!level.is_transparent(4, 4));

        level
            .set_tile(pos, Tile::new(TileType::Door { is_open: true }))
            .unwrap();
        assert!(level.is_walkable(4, 4));
        assert!(level.is_transparent(4, 4));
    }

    #[test]
    fn test_visibility_radius() {
        let mut level = Level::new(0, 20, 20);
        for y in 1..19 {
            for x in 1..19 {
                level.set_tile(Position::new(x, y), Tile::floor()).unwrap();
            }
        }

        level.update_visibility(Position::new(10, 10), 3);

        assert!(level.get_tile(Position::new(10, 10)).unwrap().visible);
        assert!(level.get_tile(Position::new(12, 10)).unwrap().visible);
        assert!(!level.get_tile(Position::new(15, 10)).unwrap().visible);

        // Moving the center keeps old tiles explored but not visible.
        level.update_visibility(Position::new(3, 3), 3);
        let old = level.get_tile(Position::new(12, 10)).unwrap();
        assert!(!old.visible);
        assert!(old.explored);
    }

    #[test]
    fn test_world_level_management() {
        let mut world = World::new(42);
        world.add_level(Level::new(0, 10, 10));
        world.add_level(Level::new(1, 10, 10));

        assert_eq!(world.current_level_id, 0);
        assert_eq!(world.current_depth(), 1);

        world.change_level(1).unwrap();
        assert_eq!(world.current_depth(), 2);
        assert!(world.change_level(5).is_err());
    }
}
