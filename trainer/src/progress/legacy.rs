//! The unversioned progress shape written by earlier releases, and its
//! migration to the current schema.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::schema::{ColorPreference, OpeningProgress, SessionState};
use crate::opening::MAIN_LINE;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyProgress {
    #[serde(default)]
    current_opening: Option<String>,
    #[serde(default)]
    current_variation: Option<String>,
    #[serde(default)]
    color_preference: Option<ColorPreference>,
    #[serde(default)]
    learned_moves: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
    #[serde(default)]
    completed_lines: BTreeMap<String, BTreeMap<String, bool>>,
    #[serde(default)]
    mastered_openings: Vec<String>,
}

fn variation_name(name: &str) -> String {
    if name.is_empty() {
        MAIN_LINE.to_string()
    } else {
        name.to_string()
    }
}

impl LegacyProgress {
    pub(crate) fn migrate(self) -> OpeningProgress {
        let mut progress = OpeningProgress {
            color_preference: self.color_preference.unwrap_or_default(),
            ..OpeningProgress::default()
        };

        for (opening, variations) in self.learned_moves {
            for (variation, plies) in variations {
                progress
                    .variation_mut(&opening, &variation_name(&variation))
                    .learned_plies
                    .extend(plies);
            }
        }

        for (opening, variations) in self.completed_lines {
            for (variation, done) in variations {
                if done {
                    progress
                        .variation_mut(&opening, &variation_name(&variation))
                        .completed = true;
                }
            }
        }

        for opening in self.mastered_openings {
            if !progress.is_mastered(&opening) {
                progress.openings.entry(opening.clone()).or_default().mastered = true;
                progress.mastered_openings.push(opening);
            }
        }

        progress.session = self
            .current_opening
            .filter(|o| !o.is_empty())
            .map(|opening| SessionState {
                opening,
                variation: variation_name(self.current_variation.as_deref().unwrap_or("")),
                move_index: 0,
                review: false,
                fen: None,
            });

        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::schema::SCHEMA_VERSION;

    #[test]
    fn test_migrate_full_record() {
        let raw = r#"{
            "currentOpening": "Italian Game",
            "currentVariation": "",
            "currentLine": "1. e4 e5",
            "colorPreference": "white",
            "learnedMoves": {"Italian Game": {"Main Line": [0, 2], "Two Knights": [0]}},
            "completedLines": {"Italian Game": {"Main Line": true}},
            "masteredOpenings": ["Sicilian Defense", "Sicilian Defense"],
            "lastVisit": "2024-01-01T00:00:00.000Z"
        }"#;
        let legacy: LegacyProgress = serde_json::from_str(raw).unwrap();
        let p = legacy.migrate();

        assert_eq!(p.schema_version, SCHEMA_VERSION);
        assert_eq!(p.color_preference, ColorPreference::White);
        let main = p.variation("Italian Game", MAIN_LINE).unwrap();
        assert!(main.completed);
        assert_eq!(main.learned_plies.iter().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert!(!p.variation("Italian Game", "Two Knights").unwrap().completed);
        assert_eq!(p.mastered_openings, vec!["Sicilian Defense".to_string()]);

        let session = p.session.unwrap();
        assert_eq!(session.opening, "Italian Game");
        assert_eq!(session.variation, MAIN_LINE);
        assert_eq!(session.move_index, 0);
        assert_eq!(session.fen, None);
    }

    #[test]
    fn test_migrate_empty_record() {
        let legacy: LegacyProgress = serde_json::from_str("{}").unwrap();
        assert_eq!(legacy.migrate(), OpeningProgress::default());
    }
}
