//! Terminal front end for the chess trainer.
//!
//! `openings` teaches opening lines through two-button choices, `puzzles`
//! serves rated tactics, `progress` prints what has been learned and `reset`
//! clears stored progress. Cosmetic delays run in real time unless
//! `--fast` (or `CHESS_TRAINER_FAST`) is given.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trainer::config::{self, DESCRIPTIONS_FILE, OPENINGS_FILE, PUZZLES_FILE};
use trainer::opening::Descriptions;
use trainer::{Catalog, ColorPreference, Delays, ProgressStore};

mod clock;
mod input;
mod openings;
mod progress;
mod puzzles;
mod render;

#[derive(Parser)]
#[command(name = "chess-trainer", about = "Learn openings and solve rated puzzles")]
struct Cli {
    /// Where progress is stored (overrides CHESS_TRAINER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Where opening and puzzle files are looked up (overrides CHESS_TRAINER_ASSETS_DIR)
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    /// Skip all animation and review delays
    #[arg(long, global = true)]
    fast: bool,

    /// Seed for choice placement, decoys and puzzle picks
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train opening lines. Without an opening, resumes the saved session or
    /// lists the most played openings.
    Openings {
        opening: Option<String>,

        /// Variation name; the main line when omitted
        #[arg(short, long)]
        variation: Option<String>,

        /// Side(s) to answer for: white, black or both
        #[arg(short, long)]
        color: Option<ColorPreference>,
    },
    /// Solve puzzles near your rating.
    Puzzles,
    /// Show opening and puzzle progress.
    Progress,
    /// Clear stored progress.
    Reset {
        #[arg(long)]
        openings: bool,
        #[arg(long)]
        puzzles: bool,
    },
}

/// Paths and knobs shared by every subcommand.
pub struct Context {
    pub data_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub delays: Delays,
    seed: Option<u64>,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        let delays = if cli.fast {
            Delays::zero()
        } else {
            Delays::from_env()
        };
        Self {
            data_dir: cli.data_dir.clone().unwrap_or_else(config::get_data_dir),
            assets_dir: cli.assets_dir.clone().unwrap_or_else(config::get_assets_dir),
            delays,
            seed: cli.seed,
        }
    }

    pub fn store(&self) -> ProgressStore {
        ProgressStore::file(self.data_dir.clone())
    }

    pub fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    pub fn catalog(&self) -> anyhow::Result<Catalog> {
        let catalog = Catalog::load(&config::candidate_paths(&self.assets_dir, OPENINGS_FILE))?;
        let descriptions =
            Descriptions::load(&config::candidate_paths(&self.assets_dir, DESCRIPTIONS_FILE));
        Ok(catalog.with_descriptions(descriptions))
    }

    pub fn puzzle_paths(&self) -> Vec<PathBuf> {
        config::candidate_paths(&self.assets_dir, PUZZLES_FILE)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = config::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "chess-trainer");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = Context::from_cli(&cli);
    tracing::info!(
        "chess-trainer starting (data {:?}, assets {:?})",
        ctx.data_dir,
        ctx.assets_dir
    );

    match cli.command {
        Some(Commands::Openings {
            opening,
            variation,
            color,
        }) => openings::run(&ctx, opening, variation, color).await?,
        Some(Commands::Puzzles) => puzzles::run(&ctx).await?,
        Some(Commands::Progress) => progress::run(&ctx)?,
        Some(Commands::Reset { openings, puzzles }) => {
            progress::reset(&ctx, openings, puzzles)?
        }
        None => openings::run(&ctx, None, None, None).await?,
    }

    tracing::info!("chess-trainer shutting down");
    Ok(())
}
