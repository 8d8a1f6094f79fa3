//! # Game Configuration
//!
//! Runtime tunables loaded at startup.

use crate::GloamResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Startup parameters for a game session.
///
/// All fields have sensible defaults; a JSON config file can override any
/// subset of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Monsters placed when a level is first populated
    pub initial_monster_count: u32,
    /// Hard cap on live monsters per level
    pub max_monsters_per_level: u32,
    /// Turns between dynamic spawn attempts
    pub monster_spawn_rate: u32,
    /// Minimum Euclidean distance from the player for a spawn point
    pub min_spawn_distance: f32,
    /// Whether spawns must land outside the player's field of view
    pub spawn_outside_fov: bool,
    /// Fraction of spawns placed inside rooms rather than corridors
    pub room_spawn_percentage: f32,
    /// Radius of the player's field of view
    pub fov_radius: u32,
    /// Player starting hit points
    pub player_starting_hp: i32,
    /// Player starting attack bonus
    pub player_starting_attack: i32,
    /// Player starting defense bonus
    pub player_starting_defense: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_monster_count: 10,
            max_monsters_per_level: 30,
            monster_spawn_rate: 100,
            min_spawn_distance: 5.0,
            spawn_outside_fov: true,
            room_spawn_percentage: 0.95,
            fov_radius: 10,
            player_starting_hp: 50,
            player_starting_attack: 2,
            player_starting_defense: 1,
        }
    }
}

impl GameConfig {
    /// Loads a configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> GloamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.initial_monster_count, 10);
        assert_eq!(config.max_monsters_per_level, 30);
        assert_eq!(config.monster_spawn_rate, 100);
        assert!(config.spawn_outside_fov);
    }

    #[test]
    fn test_partial_override() {
        let config: GameConfig =
            serde_json::from_str(r#"{"initial_monster_count": 3}"#).unwrap();
        assert_eq!(config.initial_monster_count, 3);
        // Untouched fields keep their defaults.
        assert_eq!(config.fov_radius, 10);
    }
}
