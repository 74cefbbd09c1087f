//! Parsing of typed commands.

use chess::{parse_square, PieceKind, Square};
use trainer::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Choose(Slot),
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    },
    /// Play the next line move without credit.
    Next,
    Restart,
    Hint,
    /// Skip the current puzzle or countdown.
    Skip,
    Board,
    Help,
    Quit,
    /// Nothing typed; cancels a running countdown.
    Empty,
}

pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim().to_ascii_lowercase();
    let command = match line.as_str() {
        "" => Command::Empty,
        "1" | "a" => Command::Choose(Slot::A),
        "2" | "b" => Command::Choose(Slot::B),
        "n" | "next" => Command::Next,
        "r" | "restart" => Command::Restart,
        "h" | "hint" => Command::Hint,
        "s" | "skip" => Command::Skip,
        "board" => Command::Board,
        "?" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return parse_move(other),
    };
    Some(command)
}

/// `e2e4`, `e2-e4` or `e7e8n`.
fn parse_move(text: &str) -> Option<Command> {
    let text: String = text.chars().filter(|c| *c != '-').collect();
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return None;
    }
    let from = parse_square(&text[0..2])?;
    let to = parse_square(&text[2..4])?;
    let promotion = match text.chars().nth(4) {
        None => None,
        Some(c) => match PieceKind::from_char(c)? {
            PieceKind::Pawn | PieceKind::King => return None,
            kind => Some(kind),
        },
    };
    Some(Command::Move {
        from,
        to,
        promotion,
    })
}

pub const OPENINGS_HELP: &str = "\
  1 / 2      pick the first or second move
  n          play the next move for me
  r          restart the line
  board      show the board again
  q          quit";

pub const PUZZLES_HELP: &str = "\
  e2e4       move a piece (e7e8n to underpromote)
  h          hint (costs rating once per puzzle)
  s          skip to the next puzzle
  Enter      continue now during the countdown
  board      show the board again
  q          quit";
