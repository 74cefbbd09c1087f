//! Picks the next puzzle near the user's rating.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::rating::in_range;
use super::record::PuzzleRecord;

/// At most this many in-range candidates are gathered per pick.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index into the puzzle list.
    Puzzle(usize),
    /// Every puzzle is in the completed set.
    Exhausted,
}

/// Walks the puzzle list with a cursor that only moves forward and wraps,
/// so a pass visits each puzzle before any repeats.
#[derive(Debug, Clone, Default)]
pub struct PuzzleSelector {
    cursor: usize,
}

impl PuzzleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Scan at most one full pass from the cursor, skipping completed
    /// puzzles. A random pick among the first in-range candidates wins;
    /// otherwise the first uncompleted puzzle seen.
    pub fn select<R: Rng>(
        &mut self,
        puzzles: &[PuzzleRecord],
        completed: &BTreeSet<String>,
        rating: u32,
        rng: &mut R,
    ) -> Selection {
        if puzzles.is_empty() {
            return Selection::Exhausted;
        }

        let mut candidates = Vec::with_capacity(MAX_CANDIDATES);
        let mut fallback = None;
        for _ in 0..puzzles.len() {
            let index = self.cursor % puzzles.len();
            self.cursor = (index + 1) % puzzles.len();

            let puzzle = &puzzles[index];
            if completed.contains(&puzzle.id) {
                continue;
            }
            fallback.get_or_insert(index);
            if in_range(rating, puzzle.rating) {
                candidates.push(index);
                if candidates.len() == MAX_CANDIDATES {
                    break;
                }
            }
        }

        match candidates.choose(rng).copied().or(fallback) {
            Some(index) => Selection::Puzzle(index),
            None => Selection::Exhausted,
        }
    }

    /// Any puzzle, ignoring completion.
    pub fn random_any<R: Rng>(&self, puzzles: &[PuzzleRecord], rng: &mut R) -> Option<usize> {
        if puzzles.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..puzzles.len()))
        }
    }
}
