//! Opening library loaded from static JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chess::{tokenize_moves, MoveToken};
use serde::Deserialize;

use super::line::{Line, LineError};

/// Variation name used for an opening's main line.
pub const MAIN_LINE: &str = "Main Line";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningEntry {
    #[serde(default)]
    pub total_plays: u64,
    #[serde(default)]
    pub plays: u64,
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub variations: BTreeMap<String, VariationEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct VariationEntry {
    #[serde(default)]
    pub plays: u64,
    #[serde(default)]
    pub moves: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Descriptions {
    #[serde(default)]
    openings: BTreeMap<String, OpeningDescription>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OpeningDescription {
    #[serde(default)]
    description: String,
    #[serde(default)]
    variations: BTreeMap<String, String>,
}

impl Descriptions {
    /// First candidate that parses wins. A missing or unreadable file just
    /// means no descriptions.
    pub fn load(paths: &[PathBuf]) -> Self {
        for path in paths {
            let Ok(contents) = std::fs::read_to_string(path) else {
                continue;
            };
            match serde_json::from_str(&contents) {
                Ok(descriptions) => {
                    tracing::debug!("Loaded opening descriptions from {:?}", path);
                    return descriptions;
                }
                Err(e) => tracing::warn!("Failed to parse descriptions {:?}: {}", path, e),
            }
        }
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Popularity,
    Alphabetical,
}

/// A validated line plus what the controller needs alongside it.
#[derive(Debug, Clone)]
pub struct LineSelection {
    pub opening: String,
    pub variation: String,
    pub line: Line,
    /// Move lists of every line outside this opening, for decoys.
    pub decoy_pool: Vec<Vec<MoveToken>>,
    /// Main line plus named variations of the opening.
    pub line_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    openings: BTreeMap<String, OpeningEntry>,
    descriptions: Descriptions,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut openings: BTreeMap<String, OpeningEntry> = serde_json::from_str(json)?;
        if openings.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (name, entry) in openings.iter_mut() {
            fold_main_line_variation(name, entry);
        }
        Ok(Self {
            openings,
            descriptions: Descriptions::default(),
        })
    }

    /// Try each path in order; the first that reads and parses wins.
    pub fn load(paths: &[PathBuf]) -> Result<Self, CatalogError> {
        for path in paths {
            match Self::load_file(path) {
                Ok(catalog) => {
                    tracing::info!(
                        "Loaded {} openings from {:?}",
                        catalog.openings.len(),
                        path
                    );
                    return Ok(catalog);
                }
                Err(e) => tracing::debug!("Opening data not usable at {:?}: {}", path, e),
            }
        }
        Err(CatalogError::NotFound {
            tried: paths.to_vec(),
        })
    }

    fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn with_descriptions(mut self, descriptions: Descriptions) -> Self {
        self.descriptions = descriptions;
        self
    }

    pub fn len(&self) -> usize {
        self.openings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.openings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.openings.keys().map(String::as_str)
    }

    pub fn opening(&self, name: &str) -> Option<&OpeningEntry> {
        self.openings.get(name)
    }

    /// The `n` most played openings.
    pub fn top_openings(&self, n: usize) -> Vec<&str> {
        let mut names = self.search("", SortOrder::Popularity);
        names.truncate(n);
        names
    }

    /// Openings whose name contains `term` (case-insensitive).
    pub fn search(&self, term: &str, order: SortOrder) -> Vec<&str> {
        let term = term.to_lowercase();
        let mut found: Vec<(&str, u64)> = self
            .openings
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&term))
            .map(|(name, entry)| (name.as_str(), entry.total_plays))
            .collect();

        match order {
            SortOrder::Popularity => found.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0))),
            SortOrder::Alphabetical => {
                found.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
            }
        }

        found.into_iter().map(|(name, _)| name).collect()
    }

    /// The main line followed by named variations, most played first.
    pub fn variations(&self, opening: &str) -> Vec<&str> {
        let Some(entry) = self.openings.get(opening) else {
            return Vec::new();
        };
        let mut named: Vec<(&str, u64)> = entry
            .variations
            .iter()
            .map(|(name, v)| (name.as_str(), v.plays))
            .collect();
        named.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        std::iter::once(MAIN_LINE)
            .chain(named.into_iter().map(|(name, _)| name))
            .collect()
    }

    /// Main line plus named variations; 0 for an unknown opening.
    pub fn line_count(&self, opening: &str) -> usize {
        self.openings
            .get(opening)
            .map_or(0, |entry| 1 + entry.variations.len())
    }

    pub fn total_lines(&self) -> usize {
        self.openings
            .values()
            .map(|entry| 1 + entry.variations.len())
            .sum()
    }

    /// Raw move text of a line.
    pub fn line_moves(&self, opening: &str, variation: &str) -> Option<&str> {
        let entry = self.openings.get(opening)?;
        if variation == MAIN_LINE {
            return Some(&entry.moves);
        }
        entry.variations.get(variation).map(|v| v.moves.as_str())
    }

    pub fn description(&self, opening: &str, variation: Option<&str>) -> Option<&str> {
        let desc = self.descriptions.openings.get(opening)?;
        match variation {
            None => Some(desc.description.as_str()).filter(|d| !d.is_empty()),
            Some(MAIN_LINE) => Some(desc.description.as_str()).filter(|d| !d.is_empty()),
            Some(v) => desc.variations.get(v).map(String::as_str),
        }
    }

    /// Load and validate a line, together with the decoy pool for it.
    pub fn select(&self, opening: &str, variation: &str) -> Result<LineSelection, CatalogError> {
        let moves = self
            .line_moves(opening, variation)
            .ok_or_else(|| CatalogError::UnknownLine {
                opening: opening.to_string(),
                variation: variation.to_string(),
            })?;
        let line = Line::from_tokens(tokenize_moves(moves)).map_err(|source| {
            CatalogError::MalformedLine {
                opening: opening.to_string(),
                variation: variation.to_string(),
                source,
            }
        })?;

        Ok(LineSelection {
            opening: opening.to_string(),
            variation: variation.to_string(),
            line,
            decoy_pool: self.decoy_pool(opening),
            line_count: self.line_count(opening),
        })
    }

    /// The requested line, or the next playable line of the same opening
    /// when it can't be loaded. Lines passed over are returned with the reason.
    pub fn select_or_next(
        &self,
        opening: &str,
        variation: &str,
    ) -> (Option<LineSelection>, Vec<CatalogError>) {
        match self.select(opening, variation) {
            Ok(selection) => (Some(selection), Vec::new()),
            Err(e) => {
                let (next, mut skipped) = self.next_line(opening, variation);
                skipped.insert(0, e);
                (next, skipped)
            }
        }
    }

    /// The first playable line after `after` in [`variations`](Self::variations)
    /// order, wrapping around and never returning `after` itself.
    pub fn next_line(
        &self,
        opening: &str,
        after: &str,
    ) -> (Option<LineSelection>, Vec<CatalogError>) {
        let names = self.variations(opening);
        let start = names
            .iter()
            .position(|name| *name == after)
            .map_or(0, |i| i + 1);
        let mut skipped = Vec::new();
        for name in names.iter().cycle().skip(start).take(names.len()) {
            if *name == after {
                continue;
            }
            match self.select(opening, name) {
                Ok(selection) => return (Some(selection), skipped),
                Err(e) => {
                    tracing::warn!("Skipping {} / {}: {}", opening, name, e);
                    skipped.push(e);
                }
            }
        }
        (None, skipped)
    }

    fn decoy_pool(&self, excluded: &str) -> Vec<Vec<MoveToken>> {
        self.openings
            .iter()
            .filter(|(name, _)| name.as_str() != excluded)
            .flat_map(|(_, entry)| {
                std::iter::once(entry.moves.as_str())
                    .chain(entry.variations.values().map(|v| v.moves.as_str()))
            })
            .map(tokenize_moves)
            .filter(|tokens| !tokens.is_empty())
            .collect()
    }
}

/// A variation keyed [`MAIN_LINE`] would shadow the main line. It fills an
/// empty main line, is dropped when it repeats it, and is renamed otherwise.
fn fold_main_line_variation(opening: &str, entry: &mut OpeningEntry) {
    let Some(dup) = entry.variations.remove(MAIN_LINE) else {
        return;
    };
    if entry.moves.trim().is_empty() {
        tracing::warn!("{}: variation {:?} used as the main line", opening, MAIN_LINE);
        entry.moves = dup.moves;
    } else if tokenize_moves(&dup.moves) == tokenize_moves(&entry.moves) {
        tracing::warn!("{}: dropping variation {:?}, it repeats the main line", opening, MAIN_LINE);
    } else {
        let renamed = format!("{} (variation)", MAIN_LINE);
        tracing::warn!("{}: variation {:?} renamed to {:?}", opening, MAIN_LINE, renamed);
        entry.variations.insert(renamed, dup);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Opening data not found (tried {tried:?})")]
    NotFound { tried: Vec<PathBuf> },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Opening data contains no openings")]
    Empty,
    #[error("Unknown line: {opening} / {variation}")]
    UnknownLine { opening: String, variation: String },
    #[error("Malformed line {opening} / {variation}: {source}")]
    MalformedLine {
        opening: String,
        variation: String,
        source: LineError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Italian Game": {
            "totalPlays": 900,
            "plays": 500,
            "moves": "1. e4 e5 2. Nf3 Nc6 3. Bc4",
            "variations": {
                "Giuoco Piano": { "plays": 300, "moves": "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5" },
                "Two Knights": { "plays": 100, "moves": "1. e4 e5 2. Nf3 Nc6 3. Bc4 Nf6" }
            }
        },
        "Sicilian Defense": { "totalPlays": 1200, "plays": 1200, "moves": "1. e4 c5" },
        "Queen's Gambit": {
            "totalPlays": 700,
            "moves": "1. d4 d5 2. c4",
            "variations": { "Broken": { "plays": 1, "moves": "1. d4 d5 2. Ke3" } }
        }
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_top_openings_by_popularity() {
        let c = catalog();
        assert_eq!(c.top_openings(2), vec!["Sicilian Defense", "Italian Game"]);
        assert_eq!(c.top_openings(10).len(), 3);
    }

    #[test]
    fn test_search_and_sort() {
        let c = catalog();
        assert_eq!(c.search("GAM", SortOrder::Alphabetical), vec!["Italian Game", "Queen's Gambit"]);
        assert_eq!(c.search("gam", SortOrder::Popularity), vec!["Italian Game", "Queen's Gambit"]);
        assert!(c.search("dutch", SortOrder::Popularity).is_empty());
    }

    #[test]
    fn test_variations_main_line_first() {
        let c = catalog();
        assert_eq!(
            c.variations("Italian Game"),
            vec![MAIN_LINE, "Giuoco Piano", "Two Knights"]
        );
        assert_eq!(c.line_count("Italian Game"), 3);
        assert_eq!(c.line_count("Sicilian Defense"), 1);
        assert_eq!(c.line_count("Nope"), 0);
        assert_eq!(c.total_lines(), 6);
    }

    #[test]
    fn test_select_line() {
        let c = catalog();
        let selection = c.select("Italian Game", "Giuoco Piano").unwrap();
        assert_eq!(selection.line.len(), 6);
        assert_eq!(selection.line_count, 3);
        // Sicilian main line plus Queen's Gambit main line and variation
        assert_eq!(selection.decoy_pool.len(), 3);
    }

    #[test]
    fn test_select_malformed_and_unknown() {
        let c = catalog();
        assert!(matches!(
            c.select("Queen's Gambit", "Broken"),
            Err(CatalogError::MalformedLine { .. })
        ));
        assert!(matches!(
            c.select("Italian Game", "Nope"),
            Err(CatalogError::UnknownLine { .. })
        ));
    }

    #[test]
    fn test_select_or_next_moves_past_broken_line() {
        let c = catalog();
        let (selection, skipped) = c.select_or_next("Queen's Gambit", "Broken");
        let selection = selection.unwrap();
        assert_eq!(selection.variation, MAIN_LINE);
        assert_eq!(selection.line.len(), 3);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0], CatalogError::MalformedLine { .. }));

        let (selection, skipped) = c.select_or_next("Italian Game", "Nope");
        assert_eq!(selection.unwrap().variation, MAIN_LINE);
        assert!(matches!(skipped[0], CatalogError::UnknownLine { .. }));
    }

    #[test]
    fn test_next_line_wraps_and_skips_current() {
        let c = catalog();
        let (next, _) = c.next_line("Italian Game", "Two Knights");
        assert_eq!(next.unwrap().variation, MAIN_LINE);
        let (next, _) = c.next_line("Italian Game", MAIN_LINE);
        assert_eq!(next.unwrap().variation, "Giuoco Piano");

        // Only the broken variation is left after the main line
        let (next, skipped) = c.next_line("Queen's Gambit", MAIN_LINE);
        assert!(next.is_none());
        assert_eq!(skipped.len(), 1);

        let (next, skipped) = c.next_line("Sicilian Defense", MAIN_LINE);
        assert!(next.is_none());
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_variation_named_main_line_is_folded() {
        let c = Catalog::from_json(
            r#"{
                "Repeat": {
                    "moves": "1. e4 e5",
                    "variations": { "Main Line": { "moves": "1. e4 e5" } }
                },
                "Different": {
                    "moves": "1. d4 d5",
                    "variations": { "Main Line": { "plays": 5, "moves": "1. d4 Nf6" } }
                },
                "Empty": {
                    "variations": { "Main Line": { "moves": "1. c4" } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(c.variations("Repeat"), vec![MAIN_LINE]);
        assert_eq!(c.line_count("Repeat"), 1);

        assert_eq!(c.variations("Different"), vec![MAIN_LINE, "Main Line (variation)"]);
        assert_eq!(c.line_count("Different"), 2);
        assert_eq!(c.line_moves("Different", MAIN_LINE), Some("1. d4 d5"));
        assert_eq!(c.line_moves("Different", "Main Line (variation)"), Some("1. d4 Nf6"));

        assert_eq!(c.variations("Empty"), vec![MAIN_LINE]);
        assert_eq!(c.select("Empty", MAIN_LINE).unwrap().line.len(), 1);
    }

    #[test]
    fn test_load_tries_paths_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        let good = dir.path().join("good.json");
        std::fs::write(&bad, "not json").unwrap();
        std::fs::write(&good, SAMPLE).unwrap();

        let missing = dir.path().join("missing.json");
        let c = Catalog::load(&[missing.clone(), bad.clone(), good]).unwrap();
        assert_eq!(c.len(), 3);

        let err = Catalog::load(&[missing, bad]).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { tried } if tried.len() == 2));
    }

    #[test]
    fn test_descriptions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descriptions.json");
        std::fs::write(
            &path,
            r#"{"openings": {"Italian Game": {"description": "Classical development.",
                "variations": {"Giuoco Piano": "The quiet game."}}}}"#,
        )
        .unwrap();

        let c = catalog().with_descriptions(Descriptions::load(&[path]));
        assert_eq!(c.description("Italian Game", None), Some("Classical development."));
        assert_eq!(c.description("Italian Game", Some(MAIN_LINE)), Some("Classical development."));
        assert_eq!(c.description("Italian Game", Some("Giuoco Piano")), Some("The quiet game."));
        assert_eq!(c.description("Sicilian Defense", None), None);

        let c = catalog().with_descriptions(Descriptions::load(&[dir.path().join("nope.json")]));
        assert_eq!(c.description("Italian Game", None), None);
    }
}
