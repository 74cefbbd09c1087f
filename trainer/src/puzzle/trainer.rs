//! The puzzle mode: selection, sessions, rating and the next-puzzle countdown.

use std::collections::BTreeSet;
use std::time::Duration;

use chess::{PieceKind, Square};
use rand::rngs::SmallRng;

use super::rating::{self, HINT_PENALTY};
use super::record::PuzzleRecord;
use super::selector::{PuzzleSelector, Selection};
use super::session::{Fired, MoveOutcome, PuzzleSession, PuzzleState};
use super::PuzzleError;
use crate::config::Delays;
use crate::events::Event;
use crate::progress::{ProgressStore, PuzzleProgress};
use crate::schedule::Scheduler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPuzzle {
    Started { id: String },
    /// Every puzzle is completed; reset the completed set or pick at random.
    Exhausted,
}

pub struct PuzzleTrainer {
    puzzles: Vec<PuzzleRecord>,
    /// Ids that failed validation; never offered again this run.
    invalid: BTreeSet<String>,
    selector: PuzzleSelector,
    store: ProgressStore,
    progress: PuzzleProgress,
    session: Option<PuzzleSession>,
    countdown: Scheduler<()>,
    delays: Delays,
    rng: SmallRng,
    events: Vec<Event>,
}

impl PuzzleTrainer {
    pub fn new(
        puzzles: Vec<PuzzleRecord>,
        store: ProgressStore,
        delays: Delays,
        rng: SmallRng,
    ) -> Result<Self, PuzzleError> {
        if puzzles.is_empty() {
            return Err(PuzzleError::NoPuzzles);
        }
        let progress = store.load_puzzles()?;
        tracing::info!(
            "Puzzle trainer ready: {} puzzles, rating {}, {} completed",
            puzzles.len(),
            progress.rating,
            progress.completed.len()
        );
        Ok(Self {
            puzzles,
            invalid: BTreeSet::new(),
            selector: PuzzleSelector::new(),
            store,
            progress,
            session: None,
            countdown: Scheduler::new(),
            delays,
            rng,
            events: Vec::new(),
        })
    }

    pub fn rating(&self) -> u32 {
        self.progress.rating
    }

    pub fn puzzles_solved(&self) -> u32 {
        self.progress.puzzles_solved
    }

    pub fn progress(&self) -> &PuzzleProgress {
        &self.progress
    }

    pub fn puzzles(&self) -> &[PuzzleRecord] {
        &self.puzzles
    }

    pub fn session(&self) -> Option<&PuzzleSession> {
        self.session.as_ref()
    }

    pub fn countdown_running(&self) -> bool {
        !self.countdown.is_idle()
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.session
            .as_ref()
            .and_then(PuzzleSession::pending_delay)
            .or_else(|| self.countdown.remaining())
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.collect_session_events();
        std::mem::take(&mut self.events)
    }

    /// Start the next puzzle near the user's rating. Puzzles whose moves
    /// don't replay are reported and skipped.
    pub fn next_puzzle(&mut self) -> Result<NextPuzzle, PuzzleError> {
        self.countdown.cancel();
        loop {
            let skip: BTreeSet<String> = self
                .progress
                .completed
                .union(&self.invalid)
                .cloned()
                .collect();
            let index = match self.selector.select(
                &self.puzzles,
                &skip,
                self.progress.rating,
                &mut self.rng,
            ) {
                Selection::Puzzle(index) => index,
                Selection::Exhausted => {
                    tracing::info!("All puzzles completed");
                    self.collect_session_events();
                    self.session = None;
                    self.events.push(Event::PuzzlesExhausted);
                    return Ok(NextPuzzle::Exhausted);
                }
            };
            if let Some(id) = self.start(index) {
                return Ok(NextPuzzle::Started { id });
            }
        }
    }

    /// Forget completed puzzles, keeping the rating, and pick again.
    pub fn reset_completed(&mut self) -> Result<NextPuzzle, PuzzleError> {
        tracing::info!("Clearing {} completed puzzles", self.progress.completed.len());
        self.progress.completed.clear();
        self.store.save_puzzles(&self.progress)?;
        self.next_puzzle()
    }

    /// Any valid puzzle, completed or not.
    pub fn random_puzzle(&mut self) -> Result<NextPuzzle, PuzzleError> {
        self.countdown.cancel();
        for _ in 0..self.puzzles.len() {
            let Some(index) = self.selector.random_any(&self.puzzles, &mut self.rng) else {
                break;
            };
            if self.invalid.contains(&self.puzzles[index].id) {
                continue;
            }
            if let Some(id) = self.start(index) {
                return Ok(NextPuzzle::Started { id });
            }
        }
        Err(PuzzleError::NoPuzzles)
    }

    pub fn try_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<MoveOutcome, PuzzleError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(MoveOutcome::Ignored);
        };
        let outcome = session.try_move(from, to, promotion);
        self.collect_session_events();
        self.settle(outcome)?;
        Ok(outcome)
    }

    /// Show where the next move starts from. The first hint of a puzzle
    /// costs rating.
    pub fn hint(&mut self) -> Result<Option<Square>, PuzzleError> {
        let Some(hint) = self.session.as_mut().and_then(PuzzleSession::hint) else {
            return Ok(None);
        };
        self.collect_session_events();
        if hint.first {
            self.change_rating(-HINT_PENALTY)?;
        }
        Ok(Some(hint.square))
    }

    /// Run the pending transition now: a session step if one is scheduled,
    /// otherwise the end of the countdown.
    pub fn advance(&mut self) -> Result<bool, PuzzleError> {
        if let Some(session) = self.session.as_mut() {
            match session.advance() {
                Fired::Nothing => {}
                fired => return self.after_fired(fired),
            }
        }
        if self.countdown.fire_now().is_some() {
            self.next_puzzle()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn tick(&mut self, elapsed: Duration) -> Result<(), PuzzleError> {
        if let Some(session) = self.session.as_mut() {
            match session.tick(elapsed) {
                Fired::Nothing => {}
                fired => {
                    self.after_fired(fired)?;
                    return Ok(());
                }
            }
        }
        if self.countdown.tick_with_elapsed(elapsed).is_some() {
            self.next_puzzle()?;
        }
        Ok(())
    }

    /// Cancel the countdown and go to the next puzzle now.
    pub fn skip_countdown(&mut self) -> Result<Option<NextPuzzle>, PuzzleError> {
        match self.countdown.cancel() {
            Some(()) => self.next_puzzle().map(Some),
            None => Ok(None),
        }
    }

    /// Move on from the current puzzle, solved or not.
    pub fn skip_puzzle(&mut self) -> Result<NextPuzzle, PuzzleError> {
        self.next_puzzle()
    }

    /// Back to the default rating with nothing solved or completed.
    pub fn reset_progress(&mut self) -> Result<(), PuzzleError> {
        self.store.reset_puzzles()?;
        self.progress = PuzzleProgress::default();
        self.store.save_puzzles(&self.progress)?;
        self.events.push(Event::RatingChanged {
            rating: self.progress.rating,
            change: 0,
        });
        Ok(())
    }

    fn after_fired(&mut self, fired: Fired) -> Result<bool, PuzzleError> {
        self.collect_session_events();
        if let Fired::Premove(outcome) = fired {
            self.settle(outcome)?;
        }
        if self.session.as_ref().map(PuzzleSession::state) == Some(PuzzleState::Solved)
            && self.countdown.is_idle()
        {
            // Ended on a scripted move
            self.settle(MoveOutcome::Solved {
                clean: self.session.as_ref().is_some_and(|s| !s.has_failed()),
            })?;
        }
        Ok(true)
    }

    fn start(&mut self, index: usize) -> Option<String> {
        let record = self.puzzles[index].clone();
        match PuzzleSession::new(record, self.delays) {
            Ok(session) => {
                self.collect_session_events();
                let id = session.record().id.clone();
                self.session = Some(session);
                Some(id)
            }
            Err(e) => {
                let id = self.puzzles[index].id.clone();
                tracing::warn!("Skipping puzzle {}: {}", id, e);
                self.events.push(Event::DataError {
                    message: e.to_string(),
                });
                self.invalid.insert(id);
                None
            }
        }
    }

    fn settle(&mut self, outcome: MoveOutcome) -> Result<(), PuzzleError> {
        let Some((id, puzzle_rating)) = self
            .session
            .as_ref()
            .map(|s| (s.record().id.clone(), s.record().rating))
        else {
            return Ok(());
        };
        match outcome {
            MoveOutcome::Wrong {
                first_failure: true,
            } => {
                self.progress.completed.insert(id);
                let delta = rating::failure_delta(self.progress.rating, puzzle_rating);
                self.change_rating(delta)?;
            }
            MoveOutcome::Solved { clean } => {
                self.progress.completed.insert(id);
                self.progress.puzzles_solved += 1;
                if clean {
                    let delta = rating::success_delta(self.progress.rating, puzzle_rating);
                    self.change_rating(delta)?;
                } else {
                    self.store.save_puzzles(&self.progress)?;
                }
                self.countdown.schedule(self.delays.next_puzzle, ());
                self.events.push(Event::CountdownStarted {
                    seconds: self.delays.next_puzzle.as_secs(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn change_rating(&mut self, delta: i32) -> Result<(), PuzzleError> {
        let (rating, change) = rating::apply(self.progress.rating, delta);
        tracing::debug!("Rating {} -> {} ({:+})", self.progress.rating, rating, change);
        self.progress.rating = rating;
        self.store.save_puzzles(&self.progress)?;
        self.events.push(Event::RatingChanged { rating, change });
        Ok(())
    }

    fn collect_session_events(&mut self) {
        if let Some(session) = self.session.as_mut() {
            self.events.extend(session.drain_events());
        }
    }
}
