use chess::Square;

/// One of the two choice buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Who made a move; drives which sound/indicator a front end shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    User,
    Script,
}

/// Notifications for the presentation layer, drained after each call into a
/// trainer. Every position change is announced so the board can be synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The board should show this position.
    PositionChanged { fen: String, animate: bool },
    /// A move was played.
    MovePlayed { san: String, by: Mover },
    /// Both choice slots are assigned and may be shown.
    ChoicesRevealed { labels: [String; 2] },
    ChoicesHidden,
    /// A wrong pick: mark the chosen slot and the correct one.
    ChoiceMarked { chosen: Slot, correct: Slot },
    /// First correct pick of a ply; it will be asked once more.
    ReviewRepeat { san: String },
    ErrorSound,
    LineCompleted {
        opening: String,
        variation: String,
        newly_mastered: bool,
    },
    /// Authored data turned out to be unplayable.
    DataError { message: String },
    PremoveQueued { from: Square, to: Square },
    PremoveCleared,
    /// An illegal drop; the piece goes back.
    Snapback,
    MoveIndicator { square: Square, correct: bool },
    HintShown { square: Square },
    RatingChanged { rating: u32, change: i32 },
    PuzzleStarted { id: String, rating: u32 },
    PuzzleSolved { id: String },
    PuzzleFailed { id: String },
    CountdownStarted { seconds: u64 },
    /// Every puzzle has been completed; a reset or a random pick is needed.
    PuzzlesExhausted,
}
