//! # Gloam Main Entry Point
//!
//! Parses arguments, sets up logging, and runs the synchronous turn loop.

use clap::Parser;
use gloam::{
    GameConfig, GameState, GloamResult, InputHandler, PlayerInput, TerminalDisplay,
};
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Default path for quicksaves.
const SAVE_PATH: &str = "gloam_save.json";

/// Command line arguments for the Gloam roguelike.
#[derive(Parser, Debug)]
#[command(name = "gloam")]
#[command(about = "A turn-based terminal roguelike with territorial monster AI")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Load a saved game instead of starting fresh
    #[arg(long)]
    load: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a JSON bestiary merged over the built-in species
    #[arg(long)]
    monsters: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> GloamResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);
    info!("Starting Gloam v{}", gloam::VERSION);

    let config = match &args.config {
        Some(path) => GameConfig::load_from_file(path)?,
        None => GameConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut game_state = match &args.load {
        Some(path) => {
            info!("Loading saved game from {}", path.display());
            GameState::load_from_file(path)?
        }
        None => {
            info!("Generating dungeon with seed {}", seed);
            GameState::new(seed, config)?
        }
    };

    if let Some(path) = &args.monsters {
        let json = std::fs::read_to_string(path)?;
        game_state.species.load_from_json(&json)?;
        info!("Loaded extra species from {}", path.display());
    }

    // Gameplay randomness is separate from generation so replaying a seed
    // regenerates the same dungeon regardless of how the last run went.
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    game_state
        .messages
        .append("Welcome to Gloam. Arrows/hjkl move, > uses stairs, S saves, q quits.");

    run_game_loop(&mut game_state, &mut rng)?;

    info!("Game over after {} turns", game_state.turn_number);
    Ok(())
}

/// Initializes env_logger with the requested level.
///
/// `RUST_LOG` still wins when set, which is handy for turning on a single
/// module's trace output.
fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// The blocking turn loop: render, read input, act, advance.
fn run_game_loop(game_state: &mut GameState, rng: &mut StdRng) -> GloamResult<()> {
    let input_handler = InputHandler::new();
    let mut display = TerminalDisplay::new()?;

    loop {
        display.render(game_state)?;

        let input = match input_handler.read_input()? {
            Some(input) => input,
            None => continue,
        };

        let acted = match input {
            PlayerInput::Quit => break,

            PlayerInput::Help => {
                game_state.messages.append(
                    "Move: arrows/wasd/hjkl (yubn diagonals). Wait: '.'  Stairs: '>'  Save: 'S'  Quit: 'q'",
                );
                false
            }

            PlayerInput::Save => {
                match game_state.save_to_file(std::path::Path::new(SAVE_PATH)) {
                    Ok(()) => game_state
                        .messages
                        .append(format!("Game saved to {}.", SAVE_PATH)),
                    Err(e) => game_state.messages.append(format!("Save failed: {}", e)),
                }
                false
            }

            PlayerInput::Move(delta) => game_state.player_step(delta, rng)?,
            PlayerInput::Wait => true,
            PlayerInput::UseStairs => game_state.use_stairs(rng)?,
        };

        if acted {
            game_state.advance_turn(rng)?;
        }

        if game_state.is_game_ended() {
            // Show the final frame and wait for a key before leaving.
            display.render(game_state)?;
            let _ = input_handler.read_input()?;
            break;
        }
    }

    Ok(())
}
