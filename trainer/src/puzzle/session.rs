//! One puzzle in play.
//!
//! The scripted moves alternate between the opponent and the user, starting
//! with the opponent. The user's move counts as correct when its from and to
//! squares match the script. A move attempted while the opponent is still to
//! reply is held as a premove and tried once the reply has been played.

use std::time::Duration;

use chess::{Game, Move, MoveToken, PieceColor, PieceKind, Square};

use super::record::PuzzleRecord;
use super::PuzzleError;
use crate::config::Delays;
use crate::events::{Event, Mover};
use crate::opening::Line;
use crate::schedule::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleState {
    /// The opponent's scripted move is scheduled.
    OpponentToMove,
    AwaitingMove,
    /// A wrong move is on the board and will be taken back.
    UndoingWrongMove,
    Solved,
    /// The puzzle's moves could not be played.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    OpponentReply,
    UndoWrongMove,
    ExecutePremove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing to do in the current state.
    Ignored,
    /// Held until the opponent has replied.
    Premoved,
    /// Not a legal move; the piece goes back.
    Snapback,
    /// Matches the script; the opponent replies next.
    Correct,
    /// Off script. `first_failure` is set the first time this puzzle is failed.
    Wrong { first_failure: bool },
    /// Last scripted move found. `clean` when the puzzle was never failed.
    Solved { clean: bool },
}

/// What running a scheduled transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Nothing,
    Step,
    /// A premove was tried.
    Premove(MoveOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Premove {
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub square: Square,
    /// Only the first hint of a puzzle costs rating.
    pub first: bool,
}

pub struct PuzzleSession {
    record: PuzzleRecord,
    line: Line,
    game: Game,
    player: PieceColor,
    move_index: usize,
    state: PuzzleState,
    scheduler: Scheduler<Step>,
    premove: Option<Premove>,
    failed: bool,
    hint_used: bool,
    delays: Delays,
    events: Vec<Event>,
}

impl PuzzleSession {
    /// Validate `record` and schedule the opponent's first move.
    pub fn new(record: PuzzleRecord, delays: Delays) -> Result<Self, PuzzleError> {
        let line = record.validate()?;
        let game = Game::from_fen(line.start_fen())?;
        let player = record.player_color();
        tracing::info!(
            "Starting puzzle {} (rating {}, {} moves)",
            record.id,
            record.rating,
            line.len()
        );

        let mut session = Self {
            events: vec![
                Event::PuzzleStarted {
                    id: record.id.clone(),
                    rating: record.rating,
                },
                Event::PositionChanged {
                    fen: game.to_fen(),
                    animate: false,
                },
            ],
            record,
            line,
            game,
            player,
            move_index: 0,
            state: PuzzleState::OpponentToMove,
            scheduler: Scheduler::new(),
            premove: None,
            failed: false,
            hint_used: false,
            delays,
        };
        session
            .scheduler
            .schedule(session.delays.puzzle_reply, Step::OpponentReply);
        Ok(session)
    }

    pub fn record(&self) -> &PuzzleRecord {
        &self.record
    }

    pub fn state(&self) -> PuzzleState {
        self.state
    }

    /// The side the user plays; the board is oriented for it.
    pub fn player(&self) -> PieceColor {
        self.player
    }

    pub fn fen(&self) -> String {
        self.game.to_fen()
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    pub fn move_list(&self) -> String {
        self.game.move_list()
    }

    pub fn piece_on(&self, square: Square) -> Option<(PieceKind, PieceColor)> {
        self.game.piece_on(square)
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn has_premove(&self) -> bool {
        self.premove.is_some()
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.scheduler.remaining()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// The user moved a piece from `from` to `to`. Pawns reaching the last
    /// rank promote to a queen unless `promotion` says otherwise.
    pub fn try_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> MoveOutcome {
        match self.state {
            PuzzleState::AwaitingMove => self.check_move(from, to, promotion),
            PuzzleState::OpponentToMove => self.queue_premove(from, to, promotion),
            _ => MoveOutcome::Ignored,
        }
    }

    /// Point at the piece the next scripted move starts from.
    pub fn hint(&mut self) -> Option<Hint> {
        if self.state != PuzzleState::AwaitingMove {
            return None;
        }
        let square = self.line.ply(self.move_index)?.mv.from;
        let first = !self.hint_used;
        self.hint_used = true;
        self.events.push(Event::HintShown { square });
        Some(Hint { square, first })
    }

    /// Run the pending transition now.
    pub fn advance(&mut self) -> Fired {
        match self.scheduler.fire_now() {
            Some(step) => self.run(step),
            None => Fired::Nothing,
        }
    }

    pub fn tick(&mut self, elapsed: Duration) -> Fired {
        match self.scheduler.tick_with_elapsed(elapsed) {
            Some(step) => self.run(step),
            None => Fired::Nothing,
        }
    }

    fn run(&mut self, step: Step) -> Fired {
        match step {
            Step::OpponentReply => {
                self.play_opponent();
                Fired::Step
            }
            Step::UndoWrongMove => {
                self.undo_wrong_move();
                Fired::Step
            }
            Step::ExecutePremove => match self.premove.take() {
                Some(premove) => {
                    self.events.push(Event::PremoveCleared);
                    Fired::Premove(self.try_move(premove.from, premove.to, premove.promotion))
                }
                None => Fired::Step,
            },
        }
    }

    fn queue_premove(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> MoveOutcome {
        match self.game.piece_on(from) {
            Some((_, color)) if color == self.player && from != to => {
                tracing::debug!("Premove {}{} queued", from, to);
                self.premove = Some(Premove {
                    from,
                    to,
                    promotion,
                });
                self.events.push(Event::PremoveQueued { from, to });
                MoveOutcome::Premoved
            }
            _ => {
                self.events.push(Event::Snapback);
                MoveOutcome::Snapback
            }
        }
    }

    fn check_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> MoveOutcome {
        let attempted = MoveToken::Coordinate(Move {
            from,
            to,
            promotion: promotion.map(Into::into),
        });
        let Ok(mv) = attempted.resolve(self.game.position()) else {
            tracing::debug!("Illegal puzzle move {}", attempted);
            self.events.push(Event::Snapback);
            return MoveOutcome::Snapback;
        };
        let Some(expected) = self.line.ply(self.move_index).map(|ply| ply.mv) else {
            return MoveOutcome::Ignored;
        };

        if mv.from == expected.from && mv.to == expected.to {
            self.play_correct(expected)
        } else {
            self.play_wrong(mv)
        }
    }

    fn play_correct(&mut self, expected: Move) -> MoveOutcome {
        let entry = match self.game.make_move(expected) {
            Ok(entry) => entry,
            Err(e) => {
                self.abort(format!("Puzzle {} move is not playable: {}", self.record.id, e));
                return MoveOutcome::Ignored;
            }
        };
        self.move_index += 1;
        self.events.push(Event::MovePlayed {
            san: entry.san,
            by: Mover::User,
        });
        self.events.push(Event::PositionChanged {
            fen: entry.fen_after,
            animate: false,
        });
        self.events.push(Event::MoveIndicator {
            square: expected.to,
            correct: true,
        });

        if self.move_index >= self.line.len() {
            return self.solve();
        }
        self.state = PuzzleState::OpponentToMove;
        self.scheduler
            .schedule(self.delays.puzzle_reply, Step::OpponentReply);
        MoveOutcome::Correct
    }

    fn play_wrong(&mut self, mv: Move) -> MoveOutcome {
        let entry = match self.game.make_move(mv) {
            Ok(entry) => entry,
            Err(_) => {
                self.events.push(Event::Snapback);
                return MoveOutcome::Snapback;
            }
        };
        let first_failure = !self.failed;
        self.failed = true;
        tracing::debug!("Wrong move {} in puzzle {}", entry.san, self.record.id);

        self.events.push(Event::MovePlayed {
            san: entry.san,
            by: Mover::User,
        });
        self.events.push(Event::PositionChanged {
            fen: entry.fen_after,
            animate: false,
        });
        self.events.push(Event::MoveIndicator {
            square: mv.to,
            correct: false,
        });
        self.events.push(Event::ErrorSound);
        if first_failure {
            self.events.push(Event::PuzzleFailed {
                id: self.record.id.clone(),
            });
        }

        self.state = PuzzleState::UndoingWrongMove;
        self.scheduler
            .schedule(self.delays.wrong_move_undo, Step::UndoWrongMove);
        MoveOutcome::Wrong { first_failure }
    }

    fn play_opponent(&mut self) {
        let Some(ply) = self.line.ply(self.move_index) else {
            self.solve();
            return;
        };
        let entry = match self.game.make_move(ply.mv) {
            Ok(entry) => entry,
            Err(e) => {
                let message = format!("Puzzle {} move {} is not playable: {}", self.record.id, ply.san, e);
                self.abort(message);
                return;
            }
        };
        self.move_index += 1;
        self.events.push(Event::MovePlayed {
            san: entry.san,
            by: Mover::Script,
        });
        self.events.push(Event::PositionChanged {
            fen: entry.fen_after,
            animate: true,
        });

        if self.move_index >= self.line.len() {
            self.solve();
            return;
        }
        self.state = PuzzleState::AwaitingMove;
        if self.premove.is_some() {
            self.scheduler
                .schedule(self.delays.premove, Step::ExecutePremove);
        }
    }

    fn undo_wrong_move(&mut self) {
        if let Err(e) = self.game.undo() {
            tracing::warn!("Could not take back wrong move: {}", e);
        }
        self.events.push(Event::PositionChanged {
            fen: self.game.to_fen(),
            animate: true,
        });
        self.state = PuzzleState::AwaitingMove;
    }

    fn solve(&mut self) -> MoveOutcome {
        tracing::info!("Puzzle {} solved", self.record.id);
        self.state = PuzzleState::Solved;
        self.premove = None;
        self.events.push(Event::PuzzleSolved {
            id: self.record.id.clone(),
        });
        MoveOutcome::Solved {
            clean: !self.failed,
        }
    }

    fn abort(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.scheduler.cancel();
        self.premove = None;
        self.state = PuzzleState::Aborted;
        self.events.push(Event::DataError { message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(line: &str) -> PuzzleSession {
        PuzzleSession::new(PuzzleRecord::parse(line).unwrap(), Delays::zero()).unwrap()
    }

    const FORK: &str = "p003,4k3/8/q7/1N6/8/8/8/4K3 b - - 0 1,a6a8 b5c7 e8d8 c7a8,1000";

    #[test]
    fn test_opponent_moves_first() {
        let mut s = session(FORK);
        assert_eq!(s.state(), PuzzleState::OpponentToMove);
        assert_eq!(s.player(), PieceColor::White);
        assert_eq!(s.advance(), Fired::Step);
        assert_eq!(s.state(), PuzzleState::AwaitingMove);
        assert_eq!(s.move_index(), 1);
        assert_eq!(s.piece_on(Square::A8), Some((PieceKind::Queen, PieceColor::Black)));
    }

    #[test]
    fn test_full_solve() {
        let mut s = session(FORK);
        s.advance();
        assert_eq!(s.try_move(Square::B5, Square::C7, None), MoveOutcome::Correct);
        assert_eq!(s.state(), PuzzleState::OpponentToMove);
        s.advance();
        assert_eq!(
            s.try_move(Square::C7, Square::A8, None),
            MoveOutcome::Solved { clean: true }
        );
        assert_eq!(s.state(), PuzzleState::Solved);
        assert!(s.drain_events().contains(&Event::PuzzleSolved { id: "p003".into() }));
        assert_eq!(s.try_move(Square::E1, Square::E2, None), MoveOutcome::Ignored);
    }

    #[test]
    fn test_wrong_move_is_undone() {
        let mut s = session(FORK);
        s.advance();
        let before = s.fen();
        assert_eq!(
            s.try_move(Square::B5, Square::D6, None),
            MoveOutcome::Wrong { first_failure: true }
        );
        assert_eq!(s.state(), PuzzleState::UndoingWrongMove);
        assert_ne!(s.fen(), before);
        s.advance();
        assert_eq!(s.fen(), before);
        assert_eq!(s.state(), PuzzleState::AwaitingMove);

        assert_eq!(
            s.try_move(Square::E1, Square::E2, None),
            MoveOutcome::Wrong { first_failure: false }
        );
        s.advance();
        s.try_move(Square::B5, Square::C7, None);
        s.advance();
        assert_eq!(
            s.try_move(Square::C7, Square::A8, None),
            MoveOutcome::Solved { clean: false }
        );
    }

    #[test]
    fn test_illegal_move_snaps_back() {
        let mut s = session(FORK);
        s.advance();
        s.drain_events();
        assert_eq!(s.try_move(Square::B5, Square::B6, None), MoveOutcome::Snapback);
        assert_eq!(s.drain_events(), vec![Event::Snapback]);
        assert!(!s.has_failed());
    }

    #[test]
    fn test_premove_runs_after_reply() {
        let mut s = session(FORK);
        s.advance();
        s.try_move(Square::B5, Square::C7, None);
        // Opponent still to reply
        assert_eq!(s.try_move(Square::C7, Square::A8, None), MoveOutcome::Premoved);
        assert!(s.has_premove());
        assert_eq!(s.advance(), Fired::Step);
        assert_eq!(
            s.advance(),
            Fired::Premove(MoveOutcome::Solved { clean: true })
        );
        assert!(!s.has_premove());
    }

    #[test]
    fn test_premove_needs_own_piece() {
        let mut s = session(FORK);
        assert_eq!(s.try_move(Square::E8, Square::D8, None), MoveOutcome::Snapback);
        assert_eq!(s.try_move(Square::C4, Square::C5, None), MoveOutcome::Snapback);
        assert!(!s.has_premove());
    }

    #[test]
    fn test_illegal_premove_is_discarded() {
        let mut s = session(FORK);
        // Not a knight move
        assert_eq!(s.try_move(Square::B5, Square::B7, None), MoveOutcome::Premoved);
        s.advance();
        assert_eq!(s.advance(), Fired::Premove(MoveOutcome::Snapback));
        assert_eq!(s.state(), PuzzleState::AwaitingMove);
    }

    #[test]
    fn test_hint_first_only_once() {
        let mut s = session(FORK);
        assert_eq!(s.hint(), None);
        s.advance();
        assert_eq!(
            s.hint(),
            Some(Hint {
                square: Square::B5,
                first: true
            })
        );
        assert!(!s.hint().unwrap().first);
    }

    #[test]
    fn test_default_queen_promotion() {
        let mut s = session("p004,8/P6k/8/8/8/8/6K1/8 b - - 0 1,h7g6 a7a8q,500");
        s.advance();
        assert_eq!(
            s.try_move(Square::A7, Square::A8, None),
            MoveOutcome::Solved { clean: true }
        );
        assert_eq!(s.piece_on(Square::A8), Some((PieceKind::Queen, PieceColor::White)));
    }

    #[test]
    fn test_invalid_record_is_rejected() {
        let record = PuzzleRecord::parse("bad,8/P6k/8/8/8/8/6K1/8 b - - 0 1,h7g6 h7h6,500").unwrap();
        assert!(matches!(
            PuzzleSession::new(record, Delays::zero()),
            Err(PuzzleError::Malformed { .. })
        ));
    }
}
