mod legacy;
pub mod schema;
pub mod store;
pub mod summary;

pub use schema::{
    move_key, ColorPreference, MoveStats, OpeningProgress, OpeningRecord, PuzzleProgress,
    SessionState, VariationRecord, REQUIRED_COMPLETIONS, SCHEMA_VERSION,
};
pub use store::{
    FileStore, KeyValueStore, MemoryStore, ProgressStore, StoreError, OPENING_PROGRESS_KEY,
    PUZZLE_PROGRESS_KEY,
};
pub use summary::{line_percent, opening_status, overall_percent, OpeningStatus};
