//! Puzzle records: `id,fen,moves,rating,ratingDeviation,plays,themes,gameUrl`.

use std::path::{Path, PathBuf};

use chess::{tokenize_moves, MoveToken, PieceColor};

use super::PuzzleError;
use crate::opening::Line;

/// Used when no puzzle file can be read.
pub const EMBEDDED_PUZZLES: &str = "\
p001,r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 3 3,g8f6 h5f7,600,75,1200,mate mateIn1 opening,
p002,r5k1/5ppp/8/8/8/8/5PPP/3R2K1 b - - 0 1,a8a2 d1d8,800,75,900,backRankMate mate mateIn1 endgame,
p003,4k3/8/q7/1N6/8/8/8/4K3 b - - 0 1,a6a8 b5c7 e8d8 c7a8,1000,80,700,fork crushing endgame,
p004,8/P6k/8/8/8/8/6K1/8 b - - 0 1,h7g6 a7a8q,500,90,400,promotion advancedPawn endgame,
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleRecord {
    pub id: String,
    pub fen: String,
    /// The first move is the opponent's; the user answers from the second on.
    pub moves: Vec<MoveToken>,
    pub rating: u32,
    pub rating_deviation: Option<u32>,
    pub plays: Option<u32>,
    pub themes: Vec<String>,
    pub game_url: Option<String>,
}

impl PuzzleRecord {
    /// Parse one record line. `None` for lines that aren't records.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 4 || parts[0].is_empty() {
            return None;
        }
        let rating = parts[3].parse().ok()?;
        let moves = tokenize_moves(parts[2]);
        if moves.is_empty() {
            return None;
        }

        let optional = |i: usize| parts.get(i).filter(|s| !s.is_empty());
        Some(Self {
            id: parts[0].to_string(),
            fen: parts[1].to_string(),
            moves,
            rating,
            rating_deviation: optional(4).and_then(|s| s.parse().ok()),
            plays: optional(5).and_then(|s| s.parse().ok()),
            themes: optional(6)
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            game_url: optional(7).map(|s| s.to_string()),
        })
    }

    /// Replay every move from the puzzle position.
    pub fn validate(&self) -> Result<Line, PuzzleError> {
        Line::from_fen_tokens(&self.fen, self.moves.clone()).map_err(|source| {
            PuzzleError::Malformed {
                id: self.id.clone(),
                source,
            }
        })
    }

    /// The user plays the side that does not move first.
    pub fn player_color(&self) -> PieceColor {
        if self.fen.split_whitespace().nth(1) == Some("b") {
            PieceColor::White
        } else {
            PieceColor::Black
        }
    }
}

/// Parse a puzzle file. Blank lines, `//` comments, array brackets and a
/// `const puzzles` header are skipped; quoted lines are unwrapped and
/// trailing commas dropped.
pub fn parse_puzzles(text: &str) -> Vec<PuzzleRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("//")
                && !line.contains("const puzzles")
                && *line != "]"
                && *line != "];"
        })
        .map(unquote)
        .filter_map(|line| {
            let record = PuzzleRecord::parse(line);
            if record.is_none() {
                tracing::debug!("Skipping puzzle line: {}", line);
            }
            record
        })
        .collect()
}

fn unquote(line: &str) -> &str {
    let inner = match (line.find('"'), line.rfind('"')) {
        (Some(start), Some(end)) if end > start + 1 => line[start + 1..end].trim(),
        _ => line,
    };
    inner.strip_suffix(',').unwrap_or(inner)
}

/// Where the loaded puzzles came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleSource {
    File(PathBuf),
    Embedded,
}

/// Read the first candidate file that yields puzzles; otherwise use the
/// embedded set.
pub fn load_puzzles(paths: &[PathBuf]) -> (Vec<PuzzleRecord>, PuzzleSource) {
    for path in paths {
        match read_file(path) {
            Ok(puzzles) if !puzzles.is_empty() => {
                tracing::info!("Loaded {} puzzles from {:?}", puzzles.len(), path);
                return (puzzles, PuzzleSource::File(path.clone()));
            }
            Ok(_) => tracing::warn!("No puzzles in {:?}", path),
            Err(e) => tracing::debug!("Puzzle file not usable at {:?}: {}", path, e),
        }
    }
    let puzzles = parse_puzzles(EMBEDDED_PUZZLES);
    tracing::info!("Using {} embedded puzzles", puzzles.len());
    (puzzles, PuzzleSource::Embedded)
}

fn read_file(path: &Path) -> std::io::Result<Vec<PuzzleRecord>> {
    Ok(parse_puzzles(&std::fs::read_to_string(path)?))
}
