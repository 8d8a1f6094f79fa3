//! # Rendering Module
//!
//! Terminal rendering of the game state.

pub mod display;

pub use display::*;
