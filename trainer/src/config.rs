//! Configuration for the chess trainer.
//!
//! Every tunable has a compile-time default and can be overridden through a
//! dedicated environment variable.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_DIR: &str = ".config/chess-trainer/data";
const DEV_DATA_DIR: &str = "./data";
const DEFAULT_ASSETS_DIR: &str = "./data";
const DEFAULT_LOG_DIR: &str = "logs";

pub const OPENINGS_FILE: &str = "best_chess_openings.json";
pub const DESCRIPTIONS_FILE: &str = "opening_descriptions.json";
pub const PUZZLES_FILE: &str = "puzzles.txt";

const DEFAULT_AUTO_MOVE_MS: u64 = 200;
const DEFAULT_ANIMATION_MS: u64 = 300;
const DEFAULT_REVIEW_REPEAT_MS: u64 = 1200;
const DEFAULT_MISTAKE_MS: u64 = 2000;
const DEFAULT_PUZZLE_REPLY_MS: u64 = 500;
const DEFAULT_PREMOVE_MS: u64 = 100;
const DEFAULT_WRONG_MOVE_UNDO_MS: u64 = 1000;
const DEFAULT_NEXT_PUZZLE_SECS: u64 = 5;

/// Get the directory progress is persisted in.
///
/// Priority:
/// 1. `CHESS_TRAINER_DATA_DIR` env variable if set
/// 2. `$HOME/.config/chess-trainer/data` if a home directory is known
/// 3. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESS_TRAINER_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the directory holding the opening, description and puzzle files.
///
/// Priority:
/// 1. `CHESS_TRAINER_ASSETS_DIR` env variable if set
/// 2. `./data` as fallback
pub fn get_assets_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESS_TRAINER_ASSETS_DIR") {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_ASSETS_DIR)
}

/// Get the rolling log directory (`CHESS_TRAINER_LOG_DIR`, default `logs`).
pub fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESS_TRAINER_LOG_DIR") {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_LOG_DIR)
}

/// `CHESS_TRAINER_FAST` set to anything but `0`/`false` disables cosmetic delays.
pub fn fast_mode() -> bool {
    match std::env::var("CHESS_TRAINER_FAST") {
        Ok(v) => !matches!(v.as_str(), "" | "0" | "false"),
        Err(_) => false,
    }
}

/// Places a static data file is looked for, in order: the assets directory,
/// the working directory, then its parent.
pub fn candidate_paths(assets_dir: &std::path::Path, file_name: &str) -> Vec<PathBuf> {
    vec![
        assets_dir.join(file_name),
        PathBuf::from(file_name),
        PathBuf::from("..").join(file_name),
    ]
}

/// Cosmetic delays between state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// After a scripted opening move, before the next step.
    pub auto_move: Duration,
    /// Move animation; the next choice waits for it.
    pub animation: Duration,
    /// After a first correct pick, before the ply is shown again.
    pub review_repeat: Duration,
    /// How long a wrong pick stays marked.
    pub mistake: Duration,
    /// Before the puzzle opponent replies.
    pub puzzle_reply: Duration,
    /// Before a queued premove is tried.
    pub premove: Duration,
    /// Before a wrong puzzle move is taken back.
    pub wrong_move_undo: Duration,
    /// Auto-advance countdown after a solved puzzle.
    pub next_puzzle: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            auto_move: Duration::from_millis(DEFAULT_AUTO_MOVE_MS),
            animation: Duration::from_millis(DEFAULT_ANIMATION_MS),
            review_repeat: Duration::from_millis(DEFAULT_REVIEW_REPEAT_MS),
            mistake: Duration::from_millis(DEFAULT_MISTAKE_MS),
            puzzle_reply: Duration::from_millis(DEFAULT_PUZZLE_REPLY_MS),
            premove: Duration::from_millis(DEFAULT_PREMOVE_MS),
            wrong_move_undo: Duration::from_millis(DEFAULT_WRONG_MOVE_UNDO_MS),
            next_puzzle: Duration::from_secs(DEFAULT_NEXT_PUZZLE_SECS),
        }
    }
}

impl Delays {
    pub fn zero() -> Self {
        Self {
            auto_move: Duration::ZERO,
            animation: Duration::ZERO,
            review_repeat: Duration::ZERO,
            mistake: Duration::ZERO,
            puzzle_reply: Duration::ZERO,
            premove: Duration::ZERO,
            wrong_move_undo: Duration::ZERO,
            next_puzzle: Duration::ZERO,
        }
    }

    pub fn from_env() -> Self {
        if fast_mode() {
            Self::zero()
        } else {
            Self::default()
        }
    }
}
