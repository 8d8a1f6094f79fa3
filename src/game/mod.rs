//! # Game Module
//!
//! The core game types: coordinates, directions, entities, levels and the
//! central [`GameState`].
//!
//! Submodules:
//! - [`state`]: turn orchestration and persistence
//! - [`world`]: level grids and the multi-level world
//! - [`entities`]: the player, monsters and species templates
//! - [`messages`]: the bounded narration log
//! - [`config`]: runtime tunables

pub mod config;
pub mod entities;
pub mod messages;
pub mod state;
pub mod world;

pub use config::*;
pub use entities::*;
pub use messages::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};

/// A tile coordinate on the level grid.
///
/// Doubles as a relative delta when describing movement; adding a delta to
/// a position yields the destination tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Straight-line distance to another position, ignoring obstacles.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// The 4 cardinally adjacent positions, in compass order.
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        crate::utils::pathfinding::DIRECTIONS_4
            .iter()
            .map(|&d| self + d)
            .collect()
    }

    /// Whether `other` is exactly one 8-connected step away.
    ///
    /// A position is not adjacent to itself.
    pub fn is_adjacent(self, other: Position) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx != 0 || dy != 0)
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A compass direction of movement.
///
/// Screen coordinates: north is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// The one-tile delta this direction moves by.
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
            Direction::Northeast => Position::new(1, -1),
            Direction::Northwest => Position::new(-1, -1),
            Direction::Southeast => Position::new(1, 1),
            Direction::Southwest => Position::new(-1, 1),
        }
    }
}

/// Unique identifier for monster entities, handed out by the game state.
pub type EntityId = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_distance() {
        let a = Position::new(1, 1);
        assert_eq!(a.euclidean_distance(Position::new(4, 5)), 5.0);
        assert_eq!(a.euclidean_distance(a), 0.0);
    }

    #[test]
    fn position_delta_arithmetic() {
        let pos = Position::new(7, 3);
        let delta = Direction::Southwest.to_delta();
        assert_eq!(pos + delta, Position::new(6, 4));
        assert_eq!((pos + delta) - pos, delta);
    }

    #[test]
    fn cardinal_neighbors_exclude_diagonals() {
        let neighbors = Position::new(5, 5).cardinal_adjacent_positions();
        assert_eq!(neighbors.len(), 4);
        assert!(neighbors.contains(&Position::new(5, 4)));
        assert!(!neighbors.contains(&Position::new(6, 6)));
    }

    #[test]
    fn adjacency_is_one_step() {
        let pos = Position::new(5, 5);
        assert!(pos.is_adjacent(Position::new(6, 6)));
        assert!(pos.is_adjacent(Position::new(5, 6)));
        assert!(!pos.is_adjacent(pos));
        assert!(!pos.is_adjacent(Position::new(7, 6)));
    }

    #[test]
    fn every_direction_moves_one_tile() {
        for dir in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::Northeast,
            Direction::Northwest,
            Direction::Southeast,
            Direction::Southwest,
        ] {
            let delta = dir.to_delta();
            assert!(delta.x.abs() <= 1 && delta.y.abs() <= 1);
            assert!(delta != Position::origin());
        }
    }
}
