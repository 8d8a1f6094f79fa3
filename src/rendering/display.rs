//! # Terminal Display
//!
//! crossterm-based rendering of the map, entities, status bar and message
//! log.
//!
//! The display owns the terminal for its lifetime: raw mode and the
//! alternate screen are entered on construction and restored on drop, so a
//! panic unwinds back to a usable shell.

use crate::game::{GameState, Position, TileType};
use crate::GloamResult;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{cursor, execute, queue};
use std::io::{Stdout, Write};

/// Number of message lines shown under the status bar.
const MESSAGE_LINES: usize = 4;

/// Terminal renderer.
pub struct TerminalDisplay {
    stdout: Stdout,
}

impl TerminalDisplay {
    /// Takes over the terminal: raw mode, alternate screen, hidden cursor.
    pub fn new() -> GloamResult<Self> {
        let mut stdout = std::io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        Ok(Self { stdout })
    }

    /// Draws one full frame of the game.
    pub fn render(&mut self, state: &GameState) -> GloamResult<()> {
        queue!(self.stdout, Clear(ClearType::All))?;

        self.draw_map(state)?;
        self.draw_entities(state)?;
        self.draw_status(state)?;
        self.draw_messages(state)?;

        self.stdout.flush()?;
        Ok(())
    }

    fn draw_map(&mut self, state: &GameState) -> GloamResult<()> {
        let level = match state.world.current_level() {
            Some(level) => level,
            None => return Ok(()),
        };

        for y in 0..level.height as i32 {
            queue!(self.stdout, cursor::MoveTo(0, y as u16))?;
            for x in 0..level.width as i32 {
                let tile = match level.get_tile(Position::new(x, y)) {
                    Some(tile) => tile,
                    None => continue,
                };

                if !tile.explored {
                    queue!(self.stdout, Print(' '))?;
                    continue;
                }

                let glyph = match tile.tile_type {
                    TileType::Wall => '#',
                    TileType::Floor => '.',
                    TileType::Door { is_open: false } => '+',
                    TileType::Door { is_open: true } => '\'',
                    TileType::StairsUp => '<',
                    TileType::StairsDown => '>',
                };

                // Remembered-but-unseen tiles are drawn dimmed.
                let color = if tile.visible {
                    Color::White
                } else {
                    Color::DarkGrey
                };
                queue!(self.stdout, SetForegroundColor(color), Print(glyph), ResetColor)?;
            }
        }

        Ok(())
    }

    fn draw_entities(&mut self, state: &GameState) -> GloamResult<()> {
        let level = match state.world.current_level() {
            Some(level) => level,
            None => return Ok(()),
        };

        // Monsters show only while inside the player's field of view.
        for monster in state.monsters.values() {
            let visible = level
                .get_tile(monster.position)
                .map_or(false, |tile| tile.visible);
            if !visible {
                continue;
            }
            queue!(
                self.stdout,
                cursor::MoveTo(monster.position.x as u16, monster.position.y as u16),
                SetForegroundColor(Color::Red),
                Print(monster.glyph),
                ResetColor
            )?;
        }

        queue!(
            self.stdout,
            cursor::MoveTo(state.player.position.x as u16, state.player.position.y as u16),
            SetForegroundColor(Color::Yellow),
            Print('@'),
            ResetColor
        )?;

        Ok(())
    }

    fn draw_status(&mut self, state: &GameState) -> GloamResult<()> {
        let row = state
            .world
            .current_level()
            .map_or(0, |level| level.height) as u16;

        let status = format!(
            "HP {}/{}  Depth {}  Turn {}  XP {}  Threat {}",
            state.player.hp,
            state.player.max_hp,
            state.world.current_depth(),
            state.turn_number,
            state.player.xp,
            state.current_threat_level(),
        );

        queue!(
            self.stdout,
            cursor::MoveTo(0, row),
            SetForegroundColor(Color::Cyan),
            Print(status),
            ResetColor
        )?;
        Ok(())
    }

    fn draw_messages(&mut self, state: &GameState) -> GloamResult<()> {
        let base = state
            .world
            .current_level()
            .map_or(0, |level| level.height) as u16
            + 1;

        for (i, message) in state.messages.recent(MESSAGE_LINES).enumerate() {
            queue!(
                self.stdout,
                cursor::MoveTo(0, base + i as u16),
                Print(message)
            )?;
        }
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, LeaveAlternateScreen, cursor::Show);
        let _ = disable_raw_mode();
    }
}
