//! `progress` and `reset` subcommands.

use trainer::progress::{opening_status, overall_percent, OpeningStatus};

use crate::Context;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.store();
    let openings = store.load_openings()?;
    let puzzles = store.load_puzzles()?;

    println!(
        "Puzzles: rating {}, {} solved, {} completed",
        puzzles.rating,
        puzzles.puzzles_solved,
        puzzles.completed.len()
    );
    println!(
        "Openings: {} mastered, answering for {:?}",
        openings.mastered_openings.len(),
        openings.color_preference
    );

    // The catalog is optional here; without it only the counts above are known
    let catalog = match ctx.catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!("Opening data unavailable: {}", e);
            return Ok(());
        }
    };
    println!(
        "Overall: {}% of lines completed\n",
        overall_percent(&openings, &catalog)
    );

    for name in catalog.names() {
        let status = match opening_status(&openings, &catalog, name) {
            OpeningStatus::NotStarted => continue,
            OpeningStatus::Started { moves_tried } => {
                format!("started, {} moves tried", moves_tried)
            }
            OpeningStatus::InProgress { completed, total } => {
                format!("{}/{} lines completed", completed, total)
            }
            OpeningStatus::Mastered => "mastered".to_string(),
        };
        println!("  {}: {}", name, status);
    }

    if let Some(session) = &openings.session {
        println!(
            "\nIn progress: {} / {} at ply {}",
            session.opening,
            session.variation,
            session.move_index + 1
        );
    }
    Ok(())
}

/// With neither flag both kinds of progress are cleared.
pub fn reset(ctx: &Context, openings: bool, puzzles: bool) -> anyhow::Result<()> {
    let store = ctx.store();
    let both = !openings && !puzzles;
    if openings || both {
        store.reset_openings()?;
        println!("Opening progress cleared.");
    }
    if puzzles || both {
        store.reset_puzzles()?;
        println!("Puzzle progress cleared.");
    }
    Ok(())
}
