//! Interactive opening trainer.

use std::collections::BTreeSet;

use chess::PieceColor;
use tokio::io::{AsyncBufReadExt, BufReader};
use trainer::{
    Catalog, CatalogError, ColorPreference, ControllerState, Event, LineSelection,
    OpeningController, ResumeSource, SetupResult, SetupTest, SortOrder,
};

use crate::clock::Stopwatch;
use crate::input::{self, Command, OPENINGS_HELP};
use crate::render;
use crate::Context;

const LISTED_OPENINGS: usize = 10;

pub async fn run(
    ctx: &Context,
    opening: Option<String>,
    variation: Option<String>,
    color: Option<ColorPreference>,
) -> anyhow::Result<()> {
    let catalog = ctx.catalog()?;
    let mut controller = OpeningController::new(ctx.store(), ctx.delays, ctx.rng())?;
    if let Some(color) = color {
        controller.set_color_preference(color)?;
    }

    match opening {
        Some(name) => {
            let Some(name) = resolve_opening(&catalog, &name) else {
                println!("No opening matches \"{}\".", name);
                return Ok(());
            };
            let variation = variation.unwrap_or_else(|| trainer::opening::MAIN_LINE.to_string());
            let (selection, skipped) = catalog.select_or_next(&name, &variation);
            report_skipped(&skipped);
            let Some(selection) = selection else {
                println!("No playable line in {}.\n", name);
                list_openings(&catalog);
                return Ok(());
            };
            if selection.variation != variation {
                println!("Playing {} / {} instead.", selection.opening, selection.variation);
            }
            if let Some(text) = catalog.description(&name, Some(selection.variation.as_str())) {
                println!("{}\n", text);
            }
            controller.start_line(selection)?;
        }
        None => match controller.resume(&catalog)? {
            Some(source) => {
                if let Some((opening, variation)) = controller.line_name() {
                    println!("Resuming {} / {}", opening, variation);
                }
                if source == ResumeSource::Replay {
                    tracing::debug!("Saved position replaced by replaying the line");
                }
            }
            None => {
                list_openings(&catalog);
                flush_events(&mut controller);
                return Ok(());
            }
        },
    }

    let orientation = match controller.color_preference() {
        ColorPreference::Black => PieceColor::Black,
        _ => PieceColor::White,
    };
    println!("Type ? for help.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut aborted = BTreeSet::new();
    let mut watch = Stopwatch::start();
    loop {
        flush_events_with_board(&mut controller, orientation);
        match controller.state() {
            ControllerState::LineComplete => {
                offer_setup_test(&mut controller, &mut lines).await?;
                break;
            }
            ControllerState::Aborted => {
                let Some(selection) = next_after_abort(&controller, &catalog, &mut aborted) else {
                    list_openings(&catalog);
                    break;
                };
                println!("Moving on to {} / {}\n", selection.opening, selection.variation);
                controller.start_line(selection)?;
                continue;
            }
            ControllerState::Idle => break,
            _ => {}
        }

        let delay = controller.pending_delay();
        tokio::select! {
            _ = tokio::time::sleep(delay.unwrap_or_default()), if delay.is_some() => {
                watch.lap();
                controller.advance()?;
            }
            line = lines.next_line() => {
                // Count the wait against the pending delay so it isn't restarted
                controller.tick(watch.lap())?;
                let Some(line) = line? else { break };
                match input::parse(&line) {
                    Some(Command::Choose(slot)) => {
                        controller.choose(slot)?;
                    }
                    Some(Command::Next) => {
                        controller.play_next_move()?;
                    }
                    Some(Command::Restart) => controller.restart_line()?,
                    Some(Command::Board) => {
                        if let Some(fen) = controller.fen() {
                            print!("{}", render::board(&fen, orientation));
                            println!(
                                "{}  ({}% learned)",
                                controller.move_list(),
                                controller.line_percent()
                            );
                        }
                    }
                    Some(Command::Help) => println!("{}", OPENINGS_HELP),
                    Some(Command::Quit) => break,
                    Some(Command::Empty) => {}
                    _ => println!("Unknown command, type ? for help"),
                }
            }
        }
    }
    Ok(())
}

/// The next line of the aborted line's opening that hasn't aborted yet.
fn next_after_abort(
    controller: &OpeningController,
    catalog: &Catalog,
    aborted: &mut BTreeSet<String>,
) -> Option<LineSelection> {
    let (opening, variation) = controller.line_name()?;
    aborted.insert(variation.to_string());
    let (next, skipped) = catalog.next_line(opening, variation);
    report_skipped(&skipped);
    match next {
        Some(selection) if !aborted.contains(&selection.variation) => Some(selection),
        _ => {
            println!("No other playable line in {}.\n", opening);
            None
        }
    }
}

fn report_skipped(skipped: &[CatalogError]) {
    for e in skipped {
        println!("Data problem: {}", e);
    }
}

/// Exact name first, then the most played opening containing `term`.
fn resolve_opening(catalog: &Catalog, term: &str) -> Option<String> {
    if catalog.opening(term).is_some() {
        return Some(term.to_string());
    }
    catalog
        .search(term, SortOrder::Popularity)
        .first()
        .map(|name| name.to_string())
}

fn list_openings(catalog: &Catalog) {
    println!("Most played openings:");
    for name in catalog.top_openings(LISTED_OPENINGS) {
        let variations = catalog.variations(name);
        println!("  {} ({} lines)", name, variations.len());
    }
    println!("\nStart one with: chess-trainer openings \"<name>\" [--variation <name>]");
}

fn flush_events(controller: &mut OpeningController) {
    for event in controller.drain_events() {
        if let Some(text) = render::describe(&event) {
            println!("{}", text);
        }
    }
}

/// Print events, redrawing the board whenever a choice is about to be asked.
fn flush_events_with_board(controller: &mut OpeningController, orientation: PieceColor) {
    for event in controller.drain_events() {
        if matches!(event, Event::ChoicesRevealed { .. }) {
            if let Some(fen) = controller.fen() {
                print!("\n{}", render::board(&fen, orientation));
                println!("{}", controller.move_list());
            }
        }
        if let Some(text) = render::describe(&event) {
            println!("{}", text);
        }
    }
}

/// Ask the user to place the final position of the finished line from an
/// empty board, one `<piece><square>` token at a time (`Ke1`, `pe4`).
async fn offer_setup_test<R>(
    controller: &mut OpeningController,
    lines: &mut tokio::io::Lines<R>,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let Some(fen) = controller.line().map(|line| line.final_fen().to_string()) else {
        return Ok(());
    };
    println!("\nSet up the final position from an empty board.");
    println!("Enter pieces like \"Ke1 pe5\" (uppercase for White), then \"done\". An empty line skips.");

    let mut test = SetupTest::new(&fen)?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        if line.eq_ignore_ascii_case("done") {
            let result = test.check();
            if result.is_correct() {
                println!("Perfect, that's the position.");
            }
            for message in result.messages() {
                println!("  {}", message);
            }
            if let SetupResult::Incorrect { differences, total } = &result {
                if *total > differences.len() {
                    println!("  ...and {} more", total - differences.len());
                }
            }
            print!("{}", render::board(&fen, PieceColor::White));
            return Ok(());
        }
        for token in line.split_whitespace() {
            if !place(&mut test, token) {
                println!("Can't read \"{}\"", token);
            }
        }
    }
    Ok(())
}

fn place(test: &mut SetupTest, token: &str) -> bool {
    let mut chars = token.chars();
    let Some(piece) = chars.next() else {
        return false;
    };
    let Some(square) = chess::parse_square(chars.as_str()) else {
        return false;
    };
    let Some(kind) = chess::PieceKind::from_char(piece) else {
        return false;
    };
    let color = if piece.is_ascii_uppercase() {
        PieceColor::White
    } else {
        PieceColor::Black
    };
    test.put(square, (kind, color));
    true
}
