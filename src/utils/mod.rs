//! # Utility Module
//!
//! Spatial algorithms shared across the game systems.

pub mod pathfinding;

pub use pathfinding::*;
