//! Chess trainer core: opening lines taught through binary-choice quizzes,
//! and rated tactical puzzles.
//!
//! The interactive flows are explicit state machines. Cosmetic delays are
//! expressed through a [`schedule::Scheduler`] that the caller drives, either
//! with wall-clock sleeps or synchronously in tests.

pub mod config;
pub mod events;
pub mod opening;
pub mod progress;
pub mod puzzle;
pub mod schedule;
pub mod setup;

pub use config::Delays;
pub use events::{Event, Slot};
pub use opening::{
    Catalog, CatalogError, ChoiceOutcome, ControllerState, DecoyGenerator, Line, LineError,
    LineSelection, OpeningController, ResumeSource, SortOrder,
};
pub use progress::{
    ColorPreference, FileStore, KeyValueStore, MemoryStore, OpeningProgress, ProgressStore,
    PuzzleProgress, StoreError,
};
pub use puzzle::{PuzzleError, PuzzleRecord, PuzzleSession, PuzzleTrainer};
pub use schedule::Scheduler;
pub use setup::{SetupResult, SetupTest};
