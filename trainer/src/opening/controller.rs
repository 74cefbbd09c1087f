//! The opening progression state machine.
//!
//! Walks a line one ply at a time. Plies of the side the user does not
//! answer for are played automatically; every other ply is asked as a
//! two-button choice between the line's move and a decoy. A ply has to be
//! answered correctly twice in a row before the line moves on: after the
//! first correct pick the move is taken back and asked again.
//!
//! Timed transitions go through a [`Scheduler`]; the caller either sleeps
//! for [`OpeningController::pending_delay`] and calls
//! [`OpeningController::advance`], or ticks it with elapsed time.

use std::time::Duration;

use chess::{Game, GameError, Move};
use rand::rngs::SmallRng;
use rand::Rng;

use super::catalog::{Catalog, LineSelection};
use super::decoy::DecoyGenerator;
use super::line::Line;
use crate::config::Delays;
use crate::events::{Event, Mover, Slot};
use crate::progress::{
    line_percent, move_key, ColorPreference, OpeningProgress, ProgressStore, SessionState,
    StoreError, REQUIRED_COMPLETIONS,
};
use crate::schedule::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No line loaded.
    Idle,
    /// A move was just played; the next step is scheduled.
    AnimatingMove,
    AwaitingChoice,
    /// A wrong pick is marked; the same choice comes back after a delay.
    ShowingMistake,
    /// First correct pick; the move is taken back and asked again.
    ReviewRepeat,
    LineComplete,
    /// The line's data could not be played.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    RepresentAfterReview,
    RepresentAfterMistake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// No choice was on offer.
    Ignored,
    Incorrect,
    /// Correct, and the same ply will be asked once more.
    ReviewRepeat,
    /// Correct for the second time; the line moves on.
    Advanced,
}

/// How a saved session's position was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    Fen,
    Replay,
}

/// The two moves on offer for one ply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub ply: usize,
    pub correct: Move,
    pub decoy: Move,
    pub correct_san: String,
    pub decoy_san: String,
    pub correct_slot: Slot,
}

impl Choice {
    pub fn labels(&self) -> [String; 2] {
        match self.correct_slot {
            Slot::A => [self.correct_san.clone(), self.decoy_san.clone()],
            Slot::B => [self.decoy_san.clone(), self.correct_san.clone()],
        }
    }

    pub fn move_in(&self, slot: Slot) -> Move {
        if slot == self.correct_slot {
            self.correct
        } else {
            self.decoy
        }
    }
}

/// The line being trained and the position within it.
struct ActiveLine {
    opening: String,
    variation: String,
    line: Line,
    line_count: usize,
    game: Game,
    move_index: usize,
    /// Correct picks of the current ply in this session.
    successes: u32,
    decoys: DecoyGenerator,
    choice: Option<Choice>,
}

impl ActiveLine {
    fn snapshot(&self) -> SessionState {
        SessionState {
            opening: self.opening.clone(),
            variation: self.variation.clone(),
            move_index: self.move_index,
            review: self.successes > 0,
            fen: self.line.fen_at(self.move_index).map(str::to_string),
        }
    }
}

pub struct OpeningController {
    store: ProgressStore,
    progress: OpeningProgress,
    delays: Delays,
    rng: SmallRng,
    scheduler: Scheduler<Step>,
    events: Vec<Event>,
    state: ControllerState,
    active: Option<ActiveLine>,
}

impl OpeningController {
    /// Load progress from `store` and wait for a line.
    pub fn new(store: ProgressStore, delays: Delays, rng: SmallRng) -> Result<Self, ControllerError> {
        let progress = store.load_openings()?;
        Ok(Self {
            store,
            progress,
            delays,
            rng,
            scheduler: Scheduler::new(),
            events: Vec::new(),
            state: ControllerState::Idle,
            active: None,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn progress(&self) -> &OpeningProgress {
        &self.progress
    }

    pub fn color_preference(&self) -> ColorPreference {
        self.progress.color_preference
    }

    /// Takes effect from the next ply on.
    pub fn set_color_preference(&mut self, preference: ColorPreference) -> Result<(), ControllerError> {
        self.progress.color_preference = preference;
        self.persist()
    }

    pub fn current_choice(&self) -> Option<&Choice> {
        self.active.as_ref()?.choice.as_ref()
    }

    pub fn move_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.move_index)
    }

    pub fn line(&self) -> Option<&Line> {
        self.active.as_ref().map(|a| &a.line)
    }

    /// `(opening, variation)` of the loaded line.
    pub fn line_name(&self) -> Option<(&str, &str)> {
        self.active
            .as_ref()
            .map(|a| (a.opening.as_str(), a.variation.as_str()))
    }

    pub fn fen(&self) -> Option<String> {
        self.active.as_ref().map(|a| a.game.to_fen())
    }

    /// Numbered list of the line's moves up to the current ply.
    pub fn move_list(&self) -> String {
        self.active
            .as_ref()
            .map(|a| a.line.numbered_prefix(a.move_index))
            .unwrap_or_default()
    }

    pub fn line_percent(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| {
            line_percent(&self.progress, &a.opening, &a.variation, a.line.len())
        })
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.scheduler.remaining()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Start `selection` from its first ply.
    pub fn start_line(&mut self, selection: LineSelection) -> Result<(), ControllerError> {
        self.scheduler.cancel();
        let game = Game::from_fen(selection.line.start_fen())?;
        tracing::info!(
            "Starting line {} / {} ({} plies)",
            selection.opening,
            selection.variation,
            selection.line.len()
        );

        self.events.push(Event::PositionChanged {
            fen: game.to_fen(),
            animate: false,
        });
        self.active = Some(ActiveLine {
            opening: selection.opening,
            variation: selection.variation,
            line: selection.line,
            line_count: selection.line_count,
            game,
            move_index: 0,
            successes: 0,
            decoys: DecoyGenerator::new(selection.decoy_pool),
            choice: None,
        });
        self.persist()?;
        self.prepare_next_choice()
    }

    /// Resume the saved session, if any. The position is loaded from the
    /// saved FEN when it matches the line, otherwise rebuilt by replaying the
    /// line up to the saved ply.
    pub fn resume(&mut self, catalog: &Catalog) -> Result<Option<ResumeSource>, ControllerError> {
        let Some(saved) = self.progress.session.clone() else {
            return Ok(None);
        };

        let selection = match catalog.select(&saved.opening, &saved.variation) {
            Ok(selection) => selection,
            Err(e) => {
                tracing::warn!("Saved session can't be resumed: {}", e);
                self.events.push(Event::DataError {
                    message: e.to_string(),
                });
                self.progress.session = None;
                self.store.save_openings(&self.progress)?;
                return Ok(None);
            }
        };

        let move_index = saved.move_index.min(selection.line.len());
        let (game, source) = restore_position(&selection.line, move_index, saved.fen.as_deref())?;
        tracing::info!(
            "Resuming {} / {} at ply {} ({:?})",
            saved.opening,
            saved.variation,
            move_index,
            source
        );

        self.scheduler.cancel();
        self.events.push(Event::PositionChanged {
            fen: game.to_fen(),
            animate: false,
        });
        self.active = Some(ActiveLine {
            opening: selection.opening,
            variation: selection.variation,
            line: selection.line,
            line_count: selection.line_count,
            game,
            move_index,
            successes: u32::from(saved.review),
            decoys: DecoyGenerator::new(selection.decoy_pool),
            choice: None,
        });
        self.prepare_next_choice()?;
        Ok(Some(source))
    }

    /// Answer the current choice.
    pub fn choose(&mut self, slot: Slot) -> Result<ChoiceOutcome, ControllerError> {
        if self.state != ControllerState::AwaitingChoice {
            return Ok(ChoiceOutcome::Ignored);
        }
        let Some(active) = self.active.as_mut() else {
            return Ok(ChoiceOutcome::Ignored);
        };
        let Some(choice) = active.choice.clone() else {
            return Ok(ChoiceOutcome::Ignored);
        };
        let Some(ply) = active.line.ply(active.move_index) else {
            return Ok(ChoiceOutcome::Ignored);
        };
        let key = move_key(&ply.fen_before, &ply.san);
        self.events.push(Event::ChoicesHidden);

        if choice.move_in(slot) != choice.correct {
            self.progress
                .record_attempt(&active.opening, &active.variation, &key, false);
            tracing::debug!("Wrong pick at ply {}", active.move_index);
            self.events.push(Event::ChoiceMarked {
                chosen: slot,
                correct: choice.correct_slot,
            });
            self.events.push(Event::ErrorSound);
            self.state = ControllerState::ShowingMistake;
            self.persist()?;
            self.scheduler
                .schedule(self.delays.mistake, Step::RepresentAfterMistake);
            return Ok(ChoiceOutcome::Incorrect);
        }

        self.progress
            .record_attempt(&active.opening, &active.variation, &key, true);
        let entry = match active.game.make_move(choice.correct) {
            Ok(entry) => entry,
            Err(e) => {
                self.abort(format!("Line move {} is not playable: {}", choice.correct_san, e))?;
                return Ok(ChoiceOutcome::Ignored);
            }
        };
        self.events.push(Event::MovePlayed {
            san: entry.san.clone(),
            by: Mover::User,
        });
        self.events.push(Event::PositionChanged {
            fen: entry.fen_after,
            animate: true,
        });
        active.successes += 1;

        if active.successes < REQUIRED_COMPLETIONS {
            tracing::debug!("Ply {} correct once, repeating", active.move_index);
            self.events.push(Event::ReviewRepeat { san: entry.san });
            self.state = ControllerState::ReviewRepeat;
            self.persist()?;
            self.scheduler
                .schedule(self.delays.review_repeat, Step::RepresentAfterReview);
            return Ok(ChoiceOutcome::ReviewRepeat);
        }

        self.progress
            .mark_learned(&active.opening, &active.variation, &key, active.move_index);
        active.move_index += 1;
        active.successes = 0;
        active.choice = None;
        self.state = ControllerState::AnimatingMove;
        self.persist()?;
        self.scheduler.schedule(self.delays.animation, Step::Continue);
        Ok(ChoiceOutcome::Advanced)
    }

    /// Play the next line move for the user, without credit.
    pub fn play_next_move(&mut self) -> Result<bool, ControllerError> {
        match self.state {
            ControllerState::AwaitingChoice | ControllerState::ShowingMistake => {
                self.scheduler.cancel();
                self.events.push(Event::ChoicesHidden);
                self.play_scripted()?;
                Ok(true)
            }
            ControllerState::ReviewRepeat => {
                // The move is already on the board
                self.scheduler.cancel();
                if let Some(active) = self.active.as_mut() {
                    active.move_index += 1;
                    active.successes = 0;
                    active.choice = None;
                }
                self.state = ControllerState::AnimatingMove;
                self.persist()?;
                self.scheduler.schedule(self.delays.animation, Step::Continue);
                Ok(true)
            }
            ControllerState::AnimatingMove => self.advance(),
            _ => Ok(false),
        }
    }

    /// Back to the first ply of the current line.
    pub fn restart_line(&mut self) -> Result<(), ControllerError> {
        let Some(active) = self.active.as_mut() else {
            return Err(ControllerError::NoActiveLine);
        };
        self.scheduler.cancel();
        active.game = Game::from_fen(active.line.start_fen())?;
        active.move_index = 0;
        active.successes = 0;
        active.choice = None;
        active.decoys.clear_cache();
        tracing::info!("Restarting line {} / {}", active.opening, active.variation);

        self.events.push(Event::PositionChanged {
            fen: active.game.to_fen(),
            animate: false,
        });
        self.persist()?;
        self.prepare_next_choice()
    }

    /// Run the pending transition now. Returns `false` if nothing was pending.
    pub fn advance(&mut self) -> Result<bool, ControllerError> {
        match self.scheduler.fire_now() {
            Some(step) => {
                self.run(step)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Let `elapsed` pass, running the pending transition if it came due.
    pub fn tick(&mut self, elapsed: Duration) -> Result<(), ControllerError> {
        if let Some(step) = self.scheduler.tick_with_elapsed(elapsed) {
            self.run(step)?;
        }
        Ok(())
    }

    /// Run transitions until the controller waits for the user.
    pub fn run_until_idle(&mut self) -> Result<(), ControllerError> {
        while self.advance()? {}
        Ok(())
    }

    fn run(&mut self, step: Step) -> Result<(), ControllerError> {
        match step {
            Step::Continue => self.prepare_next_choice(),
            Step::RepresentAfterMistake => {
                if let Some(choice) = self.current_choice() {
                    let labels = choice.labels();
                    self.state = ControllerState::AwaitingChoice;
                    self.events.push(Event::ChoicesRevealed { labels });
                }
                Ok(())
            }
            Step::RepresentAfterReview => self.represent_after_review(),
        }
    }

    fn represent_after_review(&mut self) -> Result<(), ControllerError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        if active.game.undo().is_err() {
            // Loaded from a FEN with no history to undo
            let fen = active
                .line
                .fen_at(active.move_index)
                .unwrap_or(active.line.start_fen());
            active.game.load_fen(fen)?;
        }
        self.events.push(Event::PositionChanged {
            fen: active.game.to_fen(),
            animate: true,
        });

        if let Some(choice) = active.choice.as_mut() {
            if self.rng.gen_bool(0.5) {
                choice.correct_slot = choice.correct_slot.other();
            }
            self.events.push(Event::ChoicesRevealed {
                labels: choice.labels(),
            });
            self.state = ControllerState::AwaitingChoice;
            Ok(())
        } else {
            self.prepare_next_choice()
        }
    }

    fn prepare_next_choice(&mut self) -> Result<(), ControllerError> {
        let preference = self.progress.color_preference;
        let Some(active) = self.active.as_mut() else {
            self.state = ControllerState::Idle;
            return Ok(());
        };

        if active.move_index >= active.line.len() {
            return self.complete_line();
        }

        let index = active.move_index;
        if !preference.includes(active.line.side_at(index)) {
            return self.play_scripted();
        }

        let Some(ply) = active.line.ply(index) else {
            return self.complete_line();
        };
        let correct = ply.mv;
        let correct_san = ply.san.clone();
        let Some(decoy) = active
            .decoys
            .decoy(active.game.position(), index, correct, &mut self.rng)
        else {
            tracing::debug!("Ply {} is forced, playing it", index);
            return self.play_scripted();
        };

        let correct_slot = if self.rng.gen_bool(0.5) {
            Slot::A
        } else {
            Slot::B
        };
        let choice = Choice {
            ply: index,
            correct,
            decoy,
            correct_san,
            decoy_san: active.game.san(decoy),
            correct_slot,
        };
        let labels = choice.labels();
        active.choice = Some(choice);

        self.state = ControllerState::AwaitingChoice;
        self.events.push(Event::ChoicesRevealed { labels });
        Ok(())
    }

    /// Play the ply at `move_index` on the user's behalf and schedule the next step.
    fn play_scripted(&mut self) -> Result<(), ControllerError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        let Some(ply) = active.line.ply(active.move_index) else {
            return self.complete_line();
        };

        let entry = match active.game.make_move(ply.mv) {
            Ok(entry) => entry,
            Err(e) => {
                let message = format!("Line move {} is not playable: {}", ply.san, e);
                return self.abort(message);
            }
        };
        active.move_index += 1;
        active.successes = 0;
        active.choice = None;

        self.events.push(Event::MovePlayed {
            san: entry.san,
            by: Mover::Script,
        });
        self.events.push(Event::PositionChanged {
            fen: entry.fen_after,
            animate: true,
        });
        self.state = ControllerState::AnimatingMove;
        self.persist()?;
        self.scheduler.schedule(self.delays.auto_move, Step::Continue);
        Ok(())
    }

    fn complete_line(&mut self) -> Result<(), ControllerError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        active.choice = None;
        active.successes = 0;

        let newly_mastered =
            self.progress
                .complete_line(&active.opening, &active.variation, active.line_count);
        tracing::info!(
            "Completed line {} / {}{}",
            active.opening,
            active.variation,
            if newly_mastered { ", opening mastered" } else { "" }
        );
        self.events.push(Event::LineCompleted {
            opening: active.opening.clone(),
            variation: active.variation.clone(),
            newly_mastered,
        });

        self.state = ControllerState::LineComplete;
        self.progress.session = None;
        self.store.save_openings(&self.progress)?;
        Ok(())
    }

    fn abort(&mut self, message: String) -> Result<(), ControllerError> {
        tracing::warn!("{}", message);
        self.scheduler.cancel();
        self.events.push(Event::DataError { message });
        self.state = ControllerState::Aborted;
        self.progress.session = None;
        self.store.save_openings(&self.progress)?;
        Ok(())
    }

    /// Write progress, including where the user is in the line.
    fn persist(&mut self) -> Result<(), ControllerError> {
        if let Some(active) = &self.active {
            self.progress.session = Some(active.snapshot());
        }
        self.store.save_openings(&self.progress)?;
        Ok(())
    }
}

fn restore_position(
    line: &Line,
    move_index: usize,
    saved_fen: Option<&str>,
) -> Result<(Game, ResumeSource), ControllerError> {
    let expected = line.fen_at(move_index).map(chess::position_key);
    if let Some(fen) = saved_fen {
        match Game::from_fen(fen) {
            Ok(game) if Some(chess::position_key(&game.to_fen())) == expected => {
                return Ok((game, ResumeSource::Fen));
            }
            Ok(_) => tracing::warn!("Saved position does not match the line, replaying"),
            Err(e) => tracing::warn!("Saved position unreadable ({}), replaying", e),
        }
    }

    let mut game = Game::from_fen(line.start_fen())?;
    for ply in line.plies().iter().take(move_index) {
        game.make_move(ply.mv)?;
    }
    Ok((game, ResumeSource::Replay))
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Progress store: {0}")]
    Store(#[from] StoreError),
    #[error("Position: {0}")]
    Game(#[from] GameError),
    #[error("No line is loaded")]
    NoActiveLine,
}
