//! # Gloam
//!
//! A turn-based terminal roguelike built around a territorial monster AI.
//!
//! ## Architecture Overview
//!
//! The crate is organized around a handful of cooperating systems:
//!
//! - **Game State**: Centralized state management for the world, the player
//!   and the live monster population
//! - **Generation System**: Procedural room-and-corridor dungeon layouts
//! - **Monster AI**: Per-monster finite state machines driving perception,
//!   pursuit, flight and territorial behavior
//! - **Combat Resolver**: d20-style attack resolution with structured outcomes
//! - **Spawn Manager**: Depth-weighted monster spawning and threat tracking
//! - **Rendering System**: Terminal rendering using crossterm
//!
//! Everything runs synchronously inside one game tick: the player acts,
//! every monster takes its AI turn, then the spawn manager may act.

pub mod ai;
pub mod combat;
pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod spawn;
pub mod utils;

// Core module re-exports
pub use ai::*;
pub use combat::*;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use spawn::*;
pub use utils::*;

/// Core error type for the Gloam game engine.
#[derive(thiserror::Error, Debug)]
pub enum GloamError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Gloam codebase.
pub type GloamResult<T> = Result<T, GloamError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
