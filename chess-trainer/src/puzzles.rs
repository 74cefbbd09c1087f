//! Interactive puzzle trainer.

use tokio::io::{AsyncBufReadExt, BufReader};
use trainer::puzzle::{load_puzzles, MoveOutcome, NextPuzzle, PuzzleSource};
use trainer::{Event, PuzzleTrainer};

use crate::clock::Stopwatch;
use crate::input::{self, Command, PUZZLES_HELP};
use crate::render;
use crate::Context;

pub async fn run(ctx: &Context) -> anyhow::Result<()> {
    let (puzzles, source) = load_puzzles(&ctx.puzzle_paths());
    if source == PuzzleSource::Embedded {
        println!("No puzzle file found, using the built-in puzzles.");
    }
    let mut trainer = PuzzleTrainer::new(puzzles, ctx.store(), ctx.delays, ctx.rng())?;
    println!(
        "Rating {}, {} puzzles solved. Type ? for help.\n",
        trainer.rating(),
        trainer.puzzles_solved()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next = trainer.next_puzzle()?;
    let mut watch = Stopwatch::start();
    loop {
        if next == NextPuzzle::Exhausted {
            flush(&mut trainer);
            println!("Start over with the same rating? [y/N]");
            let Some(answer) = lines.next_line().await? else {
                break;
            };
            next = if answer.trim().eq_ignore_ascii_case("y") {
                trainer.reset_completed()?
            } else {
                trainer.random_puzzle()?
            };
            watch.lap();
            continue;
        }
        flush(&mut trainer);

        let delay = trainer.pending_delay();
        tokio::select! {
            _ = tokio::time::sleep(delay.unwrap_or_default()), if delay.is_some() => {
                watch.lap();
                let was_counting = trainer.countdown_running();
                trainer.advance()?;
                if was_counting {
                    next = current(&trainer);
                }
            }
            line = lines.next_line() => {
                let was_counting = trainer.countdown_running();
                // Count the wait against the pending delay so it isn't restarted
                trainer.tick(watch.lap())?;
                let Some(line) = line? else { break };
                if was_counting {
                    // Any input ends the countdown early
                    next = match trainer.skip_countdown()? {
                        Some(skipped) => skipped,
                        None => current(&trainer),
                    };
                    if input::parse(&line) == Some(Command::Quit) {
                        break;
                    }
                    continue;
                }
                match input::parse(&line) {
                    Some(Command::Move { from, to, promotion }) => {
                        if trainer.try_move(from, to, promotion)? == MoveOutcome::Ignored {
                            println!("Wait for your turn");
                        }
                    }
                    Some(Command::Hint) => {
                        if trainer.hint()?.is_none() {
                            println!("No hint right now");
                        }
                    }
                    Some(Command::Skip) => next = trainer.skip_puzzle()?,
                    Some(Command::Board) => print_board(&trainer),
                    Some(Command::Help) => println!("{}", PUZZLES_HELP),
                    Some(Command::Quit) => break,
                    Some(Command::Empty) => {}
                    _ => println!("Unknown command, type ? for help"),
                }
            }
        }
    }

    println!(
        "\nRating {}, {} puzzles solved.",
        trainer.rating(),
        trainer.puzzles_solved()
    );
    Ok(())
}

fn current(trainer: &PuzzleTrainer) -> NextPuzzle {
    match trainer.session() {
        Some(session) => NextPuzzle::Started {
            id: session.record().id.clone(),
        },
        None => NextPuzzle::Exhausted,
    }
}

fn print_board(trainer: &PuzzleTrainer) {
    if let Some(session) = trainer.session() {
        print!("\n{}", render::board(&session.fen(), session.player()));
        let moves = session.move_list();
        if !moves.is_empty() {
            println!("{}", moves);
        }
    }
}

/// Print pending events; the board is redrawn once after the batch when any
/// position changed.
fn flush(trainer: &mut PuzzleTrainer) {
    let mut redraw = false;
    for event in trainer.drain_events() {
        if let Event::PuzzleStarted { .. } = event {
            println!();
        }
        redraw |= matches!(event, Event::PositionChanged { .. });
        if let Some(text) = render::describe(&event) {
            println!("{}", text);
        }
    }
    if redraw {
        print_board(trainer);
        if let Some(session) = trainer.session() {
            println!("You play {}", session.player().name());
        }
    }
}
