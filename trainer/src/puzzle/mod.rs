//! Rated tactical puzzles.

pub mod rating;
pub mod record;
pub mod selector;
pub mod session;
pub mod trainer;

pub use record::{load_puzzles, parse_puzzles, PuzzleRecord, PuzzleSource, EMBEDDED_PUZZLES};
pub use selector::{PuzzleSelector, Selection};
pub use session::{Fired, Hint, MoveOutcome, PuzzleSession, PuzzleState};
pub use trainer::{NextPuzzle, PuzzleTrainer};

use chess::GameError;

use crate::opening::LineError;
use crate::progress::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("Puzzle {id} is malformed: {source}")]
    Malformed { id: String, source: LineError },
    #[error("No puzzles loaded")]
    NoPuzzles,
    #[error("Progress store: {0}")]
    Store(#[from] StoreError),
    #[error("Position: {0}")]
    Game(#[from] GameError),
}
