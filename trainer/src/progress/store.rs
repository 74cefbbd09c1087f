//! Durable key/value persistence of progress.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use super::legacy::LegacyProgress;
use super::schema::{OpeningProgress, PuzzleProgress, SCHEMA_VERSION};

pub const OPENING_PROGRESS_KEY: &str = "opening_progress";
pub const PUZZLE_PROGRESS_KEY: &str = "puzzle_progress";

/// String key/value storage. Writes are synchronous: once `set` returns, the
/// value survives a crash.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One JSON file per key in a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.file_path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.file_path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// In-memory store. Clones share the same entries, so a second handle can
/// stand in for "after a restart" in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// How a stored opening-progress value was interpreted.
#[derive(Debug)]
enum Decoded {
    Current(OpeningProgress),
    Migrated(OpeningProgress),
    Malformed(String),
}

fn decode_openings(raw: &str) -> Decoded {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Decoded::Malformed(e.to_string()),
    };
    if !value.is_object() {
        return Decoded::Malformed("not an object".to_string());
    }

    match value.get("schema_version").and_then(Value::as_u64) {
        Some(v) if v == u64::from(SCHEMA_VERSION) => match serde_json::from_value(value) {
            Ok(progress) => Decoded::Current(progress),
            Err(e) => Decoded::Malformed(e.to_string()),
        },
        Some(v) => Decoded::Malformed(format!("unknown schema version {v}")),
        None => match serde_json::from_value::<LegacyProgress>(value) {
            Ok(legacy) => Decoded::Migrated(legacy.migrate()),
            Err(e) => Decoded::Malformed(e.to_string()),
        },
    }
}

/// Typed access to the progress records.
pub struct ProgressStore {
    kv: Box<dyn KeyValueStore>,
}

impl ProgressStore {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn file(dir: PathBuf) -> Self {
        Self::new(Box::new(FileStore::new(dir)))
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self::new(Box::new(store))
    }

    /// Load opening progress. Missing or malformed data is replaced by
    /// defaults, and legacy data by its migration; either is written back
    /// right away.
    pub fn load_openings(&self) -> Result<OpeningProgress, StoreError> {
        let progress = match self.kv.get(OPENING_PROGRESS_KEY)? {
            None => {
                tracing::info!("No opening progress stored, starting fresh");
                OpeningProgress::default()
            }
            Some(raw) => match decode_openings(&raw) {
                Decoded::Current(progress) => return Ok(progress),
                Decoded::Migrated(progress) => {
                    tracing::info!("Migrated legacy opening progress");
                    progress
                }
                Decoded::Malformed(reason) => {
                    tracing::warn!("Discarding malformed opening progress: {}", reason);
                    OpeningProgress::default()
                }
            },
        };
        self.save_openings(&progress)?;
        Ok(progress)
    }

    pub fn save_openings(&self, progress: &OpeningProgress) -> Result<(), StoreError> {
        let mut progress = progress.clone();
        progress.updated_at = now_timestamp();
        let json = serde_json::to_string_pretty(&progress)?;
        self.kv.set(OPENING_PROGRESS_KEY, &json)
    }

    /// Load puzzle progress, with the same defaulting rules as openings.
    pub fn load_puzzles(&self) -> Result<PuzzleProgress, StoreError> {
        let progress = match self.kv.get(PUZZLE_PROGRESS_KEY)? {
            None => PuzzleProgress::default(),
            Some(raw) => match serde_json::from_str::<PuzzleProgress>(&raw) {
                Ok(progress) if progress.schema_version == SCHEMA_VERSION => return Ok(progress),
                Ok(progress) => {
                    tracing::warn!(
                        "Discarding puzzle progress with schema version {}",
                        progress.schema_version
                    );
                    PuzzleProgress::default()
                }
                Err(e) => {
                    tracing::warn!("Discarding malformed puzzle progress: {}", e);
                    PuzzleProgress::default()
                }
            },
        };
        self.save_puzzles(&progress)?;
        Ok(progress)
    }

    pub fn save_puzzles(&self, progress: &PuzzleProgress) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(progress)?;
        self.kv.set(PUZZLE_PROGRESS_KEY, &json)
    }

    /// Explicit user reset.
    pub fn reset_openings(&self) -> Result<(), StoreError> {
        tracing::info!("Resetting opening progress");
        self.kv.remove(OPENING_PROGRESS_KEY)
    }

    /// Explicit user reset of rating, solved count and completed puzzles.
    pub fn reset_puzzles(&self) -> Result<(), StoreError> {
        tracing::info!("Resetting puzzle progress");
        self.kv.remove(PUZZLE_PROGRESS_KEY)
    }
}

fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Errors from the progress store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
