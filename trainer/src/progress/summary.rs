//! Progress figures shown alongside the opening library.

use super::schema::OpeningProgress;
use crate::opening::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningStatus {
    NotStarted,
    /// Some moves tried, no line completed yet.
    Started { moves_tried: usize },
    InProgress { completed: usize, total: usize },
    Mastered,
}

/// Rounded percentage of a line's plies that are learned.
pub fn line_percent(
    progress: &OpeningProgress,
    opening: &str,
    variation: &str,
    line_len: usize,
) -> u32 {
    let learned = progress
        .variation(opening, variation)
        .map_or(0, |v| v.learned_plies.iter().filter(|&&i| i < line_len).count());
    percent(learned, line_len)
}

/// Rounded percentage of all catalog lines that are completed.
pub fn overall_percent(progress: &OpeningProgress, catalog: &Catalog) -> u32 {
    let completed: usize = catalog
        .names()
        .filter_map(|name| progress.opening(name))
        .map(|record| record.completed_lines())
        .sum();
    percent(completed, catalog.total_lines())
}

pub fn opening_status(progress: &OpeningProgress, catalog: &Catalog, opening: &str) -> OpeningStatus {
    if progress.is_mastered(opening) {
        return OpeningStatus::Mastered;
    }
    let Some(record) = progress.opening(opening) else {
        return OpeningStatus::NotStarted;
    };

    let completed = record.completed_lines();
    if completed > 0 {
        return OpeningStatus::InProgress {
            completed,
            total: catalog.line_count(opening),
        };
    }

    let moves_tried: usize = record.variations.values().map(|v| v.moves.len()).sum();
    if moves_tried == 0 {
        OpeningStatus::NotStarted
    } else {
        OpeningStatus::Started { moves_tried }
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{
                "Italian Game": {"totalPlays": 2, "moves": "e4 e5 Nf3",
                    "variations": {"Two Knights": {"plays": 1, "moves": "e4 e5 Nf3 Nc6 Bc4 Nf6"}}},
                "Sicilian Defense": {"totalPlays": 1, "moves": "e4 c5"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_line_percent() {
        let mut p = OpeningProgress::default();
        assert_eq!(line_percent(&p, "Italian Game", "Main Line", 3), 0);
        p.mark_learned("Italian Game", "Main Line", "a", 0);
        p.mark_learned("Italian Game", "Main Line", "b", 2);
        assert_eq!(line_percent(&p, "Italian Game", "Main Line", 3), 67);
        assert_eq!(line_percent(&p, "Italian Game", "Main Line", 0), 0);
    }

    #[test]
    fn test_overall_percent() {
        let c = catalog();
        let mut p = OpeningProgress::default();
        assert_eq!(overall_percent(&p, &c), 0);
        p.complete_line("Sicilian Defense", "Main Line", 1);
        assert_eq!(overall_percent(&p, &c), 33);
    }

    #[test]
    fn test_opening_status() {
        let c = catalog();
        let mut p = OpeningProgress::default();
        assert_eq!(opening_status(&p, &c, "Italian Game"), OpeningStatus::NotStarted);

        p.record_attempt("Italian Game", "Main Line", "k", false);
        assert_eq!(
            opening_status(&p, &c, "Italian Game"),
            OpeningStatus::Started { moves_tried: 1 }
        );

        p.complete_line("Italian Game", "Main Line", 2);
        assert_eq!(
            opening_status(&p, &c, "Italian Game"),
            OpeningStatus::InProgress { completed: 1, total: 2 }
        );

        p.complete_line("Italian Game", "Two Knights", 2);
        assert_eq!(opening_status(&p, &c, "Italian Game"), OpeningStatus::Mastered);
    }
}
