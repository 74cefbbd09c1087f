//! Position setup test: rebuild a line's final position piece by piece.

use chess::{ColoredPiece, Placement, PlacementDiff, PlacementError, Square};

/// Differences listed back to the user; the rest are only counted.
pub const MAX_REPORTED_DIFFERENCES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupResult {
    Correct,
    Incorrect {
        differences: Vec<PlacementDiff>,
        total: usize,
    },
}

impl SetupResult {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }

    /// One line per reported difference.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Correct => Vec::new(),
            Self::Incorrect { differences, .. } => {
                differences.iter().map(ToString::to_string).collect()
            }
        }
    }
}

/// Compares piece placement only; side to move, castling rights and clocks
/// are not part of the test.
#[derive(Debug, Clone)]
pub struct SetupTest {
    target: Placement,
    attempt: Placement,
}

impl SetupTest {
    /// Test against `target_fen`, starting from an empty board.
    pub fn new(target_fen: &str) -> Result<Self, PlacementError> {
        Ok(Self {
            target: Placement::from_fen(target_fen)?,
            attempt: Placement::empty(),
        })
    }

    /// Start the attempt from `fen` instead of an empty board.
    pub fn with_attempt(mut self, fen: &str) -> Result<Self, PlacementError> {
        self.attempt = Placement::from_fen(fen)?;
        Ok(self)
    }

    pub fn attempt(&self) -> &Placement {
        &self.attempt
    }

    pub fn target(&self) -> &Placement {
        &self.target
    }

    pub fn put(&mut self, square: Square, piece: ColoredPiece) {
        self.attempt.put(square, piece);
    }

    pub fn remove(&mut self, square: Square) -> Option<ColoredPiece> {
        self.attempt.remove(square)
    }

    pub fn clear(&mut self) {
        self.attempt.clear();
    }

    pub fn check(&self) -> SetupResult {
        let mut differences = self.attempt.diff(&self.target);
        if differences.is_empty() {
            return SetupResult::Correct;
        }
        let total = differences.len();
        differences.truncate(MAX_REPORTED_DIFFERENCES);
        tracing::debug!("Setup attempt has {} differences", total);
        SetupResult::Incorrect { differences, total }
    }
}
