//! Persisted progress records.
//!
//! Opening progress is versioned through `schema_version`; see
//! [`super::legacy`] for the unversioned shape it replaces.

use std::collections::{BTreeMap, BTreeSet};

use chess::{position_key, PieceColor};
use serde::{Deserialize, Serialize};

use crate::puzzle::rating::DEFAULT_RATING;

pub const SCHEMA_VERSION: u32 = 2;

/// Correct picks needed before a ply counts as learned.
pub const REQUIRED_COMPLETIONS: u32 = 2;

/// Which side(s) the user answers for; the other side is played automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    White,
    Black,
    #[default]
    Both,
}

impl ColorPreference {
    /// Whether the user answers for `side`.
    pub fn includes(self, side: PieceColor) -> bool {
        match self {
            Self::Both => true,
            Self::White => side == PieceColor::White,
            Self::Black => side == PieceColor::Black,
        }
    }
}

impl std::str::FromStr for ColorPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Self::White),
            "black" | "b" => Ok(Self::Black),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown color preference: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStats {
    pub attempts: u32,
    pub completions: u32,
    pub learned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationRecord {
    /// Keyed by [`move_key`].
    #[serde(default)]
    pub moves: BTreeMap<String, MoveStats>,
    /// Ply indices learned in this line.
    #[serde(default)]
    pub learned_plies: BTreeSet<usize>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRecord {
    #[serde(default)]
    pub variations: BTreeMap<String, VariationRecord>,
    #[serde(default)]
    pub mastered: bool,
}

impl OpeningRecord {
    pub fn completed_lines(&self) -> usize {
        self.variations.values().filter(|v| v.completed).count()
    }
}

/// Where the user is, so a restart resumes mid-line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub opening: String,
    pub variation: String,
    pub move_index: usize,
    /// The ply at `move_index` was answered correctly once already.
    #[serde(default)]
    pub review: bool,
    /// Position at `move_index`.
    #[serde(default)]
    pub fen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningProgress {
    pub schema_version: u32,
    #[serde(default)]
    pub color_preference: ColorPreference,
    #[serde(default)]
    pub openings: BTreeMap<String, OpeningRecord>,
    #[serde(default)]
    pub mastered_openings: Vec<String>,
    #[serde(default)]
    pub session: Option<SessionState>,
    #[serde(default)]
    pub updated_at: u64,
}

impl Default for OpeningProgress {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            color_preference: ColorPreference::default(),
            openings: BTreeMap::new(),
            mastered_openings: Vec::new(),
            session: None,
            updated_at: 0,
        }
    }
}

impl OpeningProgress {
    pub fn opening(&self, name: &str) -> Option<&OpeningRecord> {
        self.openings.get(name)
    }

    pub fn variation(&self, opening: &str, variation: &str) -> Option<&VariationRecord> {
        self.openings.get(opening)?.variations.get(variation)
    }

    /// Created lazily on first use.
    pub fn variation_mut(&mut self, opening: &str, variation: &str) -> &mut VariationRecord {
        self.openings
            .entry(opening.to_string())
            .or_default()
            .variations
            .entry(variation.to_string())
            .or_default()
    }

    pub fn move_stats(&self, opening: &str, variation: &str, key: &str) -> MoveStats {
        self.variation(opening, variation)
            .and_then(|v| v.moves.get(key))
            .copied()
            .unwrap_or_default()
    }

    /// Count one presentation of a ply, and a completion if it was answered
    /// correctly. Returns the updated stats.
    pub fn record_attempt(
        &mut self,
        opening: &str,
        variation: &str,
        key: &str,
        correct: bool,
    ) -> MoveStats {
        let stats = self
            .variation_mut(opening, variation)
            .moves
            .entry(key.to_string())
            .or_default();
        stats.attempts += 1;
        if correct {
            stats.completions += 1;
        }
        *stats
    }

    pub fn mark_learned(&mut self, opening: &str, variation: &str, key: &str, ply: usize) {
        let record = self.variation_mut(opening, variation);
        record.moves.entry(key.to_string()).or_default().learned = true;
        record.learned_plies.insert(ply);
    }

    /// Mark a line completed. When every line of the opening is completed the
    /// opening becomes mastered; returns `true` only the first time.
    pub fn complete_line(&mut self, opening: &str, variation: &str, line_count: usize) -> bool {
        self.variation_mut(opening, variation).completed = true;

        let record = self.openings.entry(opening.to_string()).or_default();
        if line_count == 0 || record.completed_lines() < line_count {
            return false;
        }
        record.mastered = true;

        if self.mastered_openings.iter().any(|m| m == opening) {
            return false;
        }
        self.mastered_openings.push(opening.to_string());
        true
    }

    pub fn is_mastered(&self, opening: &str) -> bool {
        self.mastered_openings.iter().any(|m| m == opening)
    }
}

/// Key of a move-position pair: the position part of the FEN before the
/// move, and the move in SAN.
pub fn move_key(fen_before: &str, san: &str) -> String {
    format!("{}|{}", position_key(fen_before), san)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleProgress {
    pub schema_version: u32,
    pub rating: u32,
    #[serde(default)]
    pub puzzles_solved: u32,
    #[serde(default)]
    pub completed: BTreeSet<String>,
}

impl Default for PuzzleProgress {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            rating: DEFAULT_RATING,
            puzzles_solved: 0,
            completed: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::STARTING_FEN;

    #[test]
    fn test_color_preference() {
        assert!(ColorPreference::Both.includes(PieceColor::Black));
        assert!(ColorPreference::White.includes(PieceColor::White));
        assert!(!ColorPreference::White.includes(PieceColor::Black));
        assert_eq!("Black".parse::<ColorPreference>(), Ok(ColorPreference::Black));
        assert!("purple".parse::<ColorPreference>().is_err());
        assert_eq!(serde_json::to_string(&ColorPreference::Both).unwrap(), "\"both\"");
    }

    #[test]
    fn test_record_attempts() {
        let mut p = OpeningProgress::default();
        let key = move_key(STARTING_FEN, "e4");
        p.record_attempt("Italian Game", "Main Line", &key, false);
        let stats = p.record_attempt("Italian Game", "Main Line", &key, true);
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.completions, 1);
        assert!(!stats.learned);

        p.mark_learned("Italian Game", "Main Line", &key, 0);
        assert!(p.move_stats("Italian Game", "Main Line", &key).learned);
        assert!(p
            .variation("Italian Game", "Main Line")
            .unwrap()
            .learned_plies
            .contains(&0));
    }

    #[test]
    fn test_move_key_ignores_counters() {
        let a = move_key(STARTING_FEN, "e4");
        let b = move_key(&STARTING_FEN.replace("0 1", "3 9"), "e4");
        assert_eq!(a, b);
        assert_ne!(a, move_key(STARTING_FEN, "d4"));
    }

    #[test]
    fn test_mastery_is_idempotent() {
        let mut p = OpeningProgress::default();
        assert!(!p.complete_line("Italian Game", "Main Line", 2));
        assert!(!p.is_mastered("Italian Game"));
        assert!(p.complete_line("Italian Game", "Giuoco Piano", 2));
        assert!(p.is_mastered("Italian Game"));
        assert!(p.opening("Italian Game").unwrap().mastered);

        // Completing again neither re-announces nor duplicates
        assert!(!p.complete_line("Italian Game", "Main Line", 2));
        assert_eq!(p.mastered_openings, vec!["Italian Game".to_string()]);
    }

    #[test]
    fn test_defaults() {
        let p = PuzzleProgress::default();
        assert_eq!(p.rating, 650);
        assert_eq!(p.schema_version, SCHEMA_VERSION);
        assert_eq!(OpeningProgress::default().color_preference, ColorPreference::Both);
    }
}
