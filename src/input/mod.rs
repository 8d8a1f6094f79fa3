//! # Input Module
//!
//! Keyboard handling for player commands.
//!
//! Keys are read from the terminal in raw mode via crossterm and mapped to
//! a small [`PlayerInput`] vocabulary; translating inputs into game effects
//! is the main loop's job.

use crate::game::{Direction, Position};
use crate::GloamResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Player input types produced by the input handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    /// Move one tile in a direction (relative delta)
    Move(Position),
    /// Wait/rest for one turn
    Wait,
    /// Use the stairs under the player
    UseStairs,
    /// Save the game
    Save,
    /// Show help information
    Help,
    /// Quit the game
    Quit,
}

/// Input handler for processing player commands.
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl + yubn diagonals)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Blocks until a key press arrives and maps it to a player input.
    ///
    /// Returns `None` for keys that don't mean anything.
    pub fn read_input(&self) -> GloamResult<Option<PlayerInput>> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.map_key(key));
                }
            }
        }
    }

    /// Maps a single key event to a player input.
    pub fn map_key(&self, key: KeyEvent) -> Option<PlayerInput> {
        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(PlayerInput::Quit);
        }

        if let Some(direction) = self.movement_direction(key.code) {
            return Some(PlayerInput::Move(direction.to_delta()));
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(PlayerInput::Quit),
            KeyCode::Char(' ') | KeyCode::Char('.') => Some(PlayerInput::Wait),
            KeyCode::Char('>') | KeyCode::Char('<') => Some(PlayerInput::UseStairs),
            KeyCode::Char('S') => Some(PlayerInput::Save),
            KeyCode::Char('?') => Some(PlayerInput::Help),
            _ => None,
        }
    }

    /// Maps a movement key to its compass direction.
    fn movement_direction(&self, code: KeyCode) -> Option<Direction> {
        match code {
            KeyCode::Up | KeyCode::Char('w') => Some(Direction::North),
            KeyCode::Down | KeyCode::Char('s') => Some(Direction::South),
            KeyCode::Left | KeyCode::Char('a') => Some(Direction::West),
            KeyCode::Right | KeyCode::Char('d') => Some(Direction::East),

            // Vi keys, including diagonals
            KeyCode::Char('h') if self.vi_keys_enabled => Some(Direction::West),
            KeyCode::Char('j') if self.vi_keys_enabled => Some(Direction::South),
            KeyCode::Char('k') if self.vi_keys_enabled => Some(Direction::North),
            KeyCode::Char('l') if self.vi_keys_enabled => Some(Direction::East),
            KeyCode::Char('y') if self.vi_keys_enabled => Some(Direction::Northwest),
            KeyCode::Char('u') if self.vi_keys_enabled => Some(Direction::Northeast),
            KeyCode::Char('b') if self.vi_keys_enabled => Some(Direction::Southwest),
            KeyCode::Char('n') if self.vi_keys_enabled => Some(Direction::Southeast),

            _ => None,
        }
    }
}
