//! Text rendering of boards and trainer events.

use chess::{Placement, PieceColor, Square};
use trainer::events::Mover;
use trainer::Event;

/// ASCII board from `fen`, with `bottom`'s pieces nearest the player.
pub fn board(fen: &str, bottom: PieceColor) -> String {
    let Ok(placement) = Placement::from_fen(fen) else {
        return format!("(unreadable position: {})\n", fen);
    };

    let ranks: Vec<usize> = match bottom {
        PieceColor::White => (0..8).rev().collect(),
        PieceColor::Black => (0..8).collect(),
    };
    let files: Vec<usize> = match bottom {
        PieceColor::White => (0..8).collect(),
        PieceColor::Black => (0..8).rev().collect(),
    };

    let mut out = String::new();
    for &rank in &ranks {
        out.push_str(&format!("{} ", rank + 1));
        for &file in &files {
            let c = match placement.get(Square::index(rank * 8 + file)) {
                Some((kind, PieceColor::White)) => kind.to_char_upper(),
                Some((kind, PieceColor::Black)) => kind.to_char_lower(),
                None => '.',
            };
            out.push(' ');
            out.push(c);
        }
        out.push('\n');
    }
    out.push_str("  ");
    for &file in &files {
        out.push(' ');
        out.push((b'a' + file as u8) as char);
    }
    out.push('\n');
    out
}

/// One line for events worth printing; board refreshes are handled by the
/// callers.
pub fn describe(event: &Event) -> Option<String> {
    let text = match event {
        Event::MovePlayed { san, by: Mover::Script } => format!("Played {}", san),
        Event::MovePlayed { san, by: Mover::User } => format!("You played {}", san),
        Event::ChoicesRevealed { labels } => {
            format!("Which move?  [1] {}   [2] {}", labels[0], labels[1])
        }
        Event::ChoiceMarked { chosen, correct } => format!(
            "Not quite: [{}] was wrong, [{}] is the line move",
            chosen.index() + 1,
            correct.index() + 1
        ),
        Event::ReviewRepeat { san } => format!("Correct, {}! Once more...", san),
        Event::LineCompleted {
            opening,
            variation,
            newly_mastered,
        } => {
            let mut text = format!("Line complete: {} / {}", opening, variation);
            if *newly_mastered {
                text.push_str(&format!("\nCongratulations, you have mastered the {}!", opening));
            }
            text
        }
        Event::DataError { message } => format!("Data problem: {}", message),
        Event::PremoveQueued { from, to } => format!("Premove {}{} queued", from, to),
        Event::Snapback => "That move isn't legal here".to_string(),
        Event::MoveIndicator { correct: true, .. } => "Correct!".to_string(),
        Event::MoveIndicator { correct: false, .. } => "Wrong move".to_string(),
        Event::HintShown { square } => format!("Hint: move the piece on {}", square),
        Event::RatingChanged { rating, change } => format!("Rating {} ({:+})", rating, change),
        Event::PuzzleStarted { id, rating } => format!("Puzzle {} (rated {})", id, rating),
        Event::PuzzleSolved { .. } => "Puzzle solved!".to_string(),
        Event::CountdownStarted { seconds } => {
            format!("Next puzzle in {}s, press Enter to continue now", seconds)
        }
        Event::PuzzlesExhausted => "You've completed every puzzle.".to_string(),
        Event::PositionChanged { .. }
        | Event::ChoicesHidden
        | Event::ErrorSound
        | Event::PremoveCleared
        | Event::PuzzleFailed { .. } => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::STARTING_FEN;
    use trainer::Slot;

    #[test]
    fn test_board_orientation() {
        let white = board(STARTING_FEN, PieceColor::White);
        let lines: Vec<&str> = white.lines().collect();
        assert_eq!(lines[0], "8  r n b q k b n r");
        assert_eq!(lines[7], "1  R N B Q K B N R");
        assert_eq!(lines[8], "   a b c d e f g h");

        let black = board(STARTING_FEN, PieceColor::Black);
        let lines: Vec<&str> = black.lines().collect();
        assert_eq!(lines[0], "1  R N B K Q B N R");
        assert_eq!(lines[8], "   h g f e d c b a");
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&Event::ChoicesRevealed {
                labels: ["e4".into(), "d4".into()]
            })
            .unwrap(),
            "Which move?  [1] e4   [2] d4"
        );
        assert_eq!(
            describe(&Event::ChoiceMarked {
                chosen: Slot::B,
                correct: Slot::A
            })
            .unwrap(),
            "Not quite: [2] was wrong, [1] is the line move"
        );
        assert_eq!(
            describe(&Event::RatingChanged {
                rating: 645,
                change: -5
            })
            .unwrap(),
            "Rating 645 (-5)"
        );
        assert!(describe(&Event::ChoicesHidden).is_none());
    }
}
