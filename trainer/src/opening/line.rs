//! A line: a fixed move sequence from a starting position, checked for
//! legality once when it is loaded.

use chess::{Game, GameError, Move, MoveToken, PieceColor, STARTING_FEN};

/// One half-move of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ply {
    pub token: MoveToken,
    pub mv: Move,
    pub san: String,
    pub fen_before: String,
    pub fen_after: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    start_fen: String,
    plies: Vec<Ply>,
}

impl Line {
    /// Build a line from the standard starting position.
    pub fn from_tokens(tokens: Vec<MoveToken>) -> Result<Self, LineError> {
        Self::from_fen_tokens(STARTING_FEN, tokens)
    }

    /// Build a line starting at `fen`, replaying every token to resolve it.
    pub fn from_fen_tokens(fen: &str, tokens: Vec<MoveToken>) -> Result<Self, LineError> {
        let mut game = Game::from_fen(fen).map_err(LineError::StartPosition)?;
        let start_fen = game.to_fen();

        let mut plies = Vec::with_capacity(tokens.len());
        for (index, token) in tokens.into_iter().enumerate() {
            let entry = game
                .play_token(&token)
                .map_err(|source| LineError::IllegalPly {
                    index,
                    token: token.to_string(),
                    source,
                })?;
            plies.push(Ply {
                token,
                mv: entry.mv,
                san: entry.san,
                fen_before: entry.fen_before,
                fen_after: entry.fen_after,
            });
        }

        if plies.is_empty() {
            return Err(LineError::Empty);
        }

        Ok(Self { start_fen, plies })
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    pub fn ply(&self, index: usize) -> Option<&Ply> {
        self.plies.get(index)
    }

    pub fn plies(&self) -> &[Ply] {
        &self.plies
    }

    /// Position before ply `index`; `len()` gives the final position.
    pub fn fen_at(&self, index: usize) -> Option<&str> {
        if index == self.plies.len() {
            return self.plies.last().map(|p| p.fen_after.as_str());
        }
        self.plies.get(index).map(|p| p.fen_before.as_str())
    }

    pub fn final_fen(&self) -> &str {
        self.fen_at(self.plies.len()).unwrap_or(&self.start_fen)
    }

    /// Side that plays ply `index`.
    pub fn side_at(&self, index: usize) -> PieceColor {
        let first = if self.start_fen.split_whitespace().nth(1) == Some("b") {
            PieceColor::Black
        } else {
            PieceColor::White
        };
        if index % 2 == 0 {
            first
        } else {
            first.opposite()
        }
    }

    /// SAN of every ply, e.g. for listing the line.
    pub fn sans(&self) -> Vec<&str> {
        self.plies.iter().map(|p| p.san.as_str()).collect()
    }

    /// Numbered display form: `1. e4 e5 2. Nf3`.
    pub fn numbered(&self) -> String {
        self.numbered_prefix(self.plies.len())
    }

    /// Numbered display form of the first `count` plies.
    pub fn numbered_prefix(&self, count: usize) -> String {
        let mut game = match Game::from_fen(&self.start_fen) {
            Ok(game) => game,
            Err(_) => return self.sans().join(" "),
        };
        for ply in self.plies.iter().take(count) {
            if game.make_move(ply.mv).is_err() {
                break;
            }
        }
        game.move_list()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("Line has no moves")]
    Empty,
    #[error("Invalid starting position: {0}")]
    StartPosition(GameError),
    #[error("Move {token} at ply {index} is not playable: {source}")]
    IllegalPly {
        index: usize,
        token: String,
        source: GameError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::tokenize_moves;

    #[test]
    fn test_italian_line() {
        let line = Line::from_tokens(tokenize_moves("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5")).unwrap();
        assert_eq!(line.len(), 6);
        assert_eq!(line.sans(), vec!["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]);
        assert_eq!(line.fen_at(0), Some(STARTING_FEN));
        assert_eq!(line.fen_at(6), Some(line.final_fen()));
        assert_eq!(line.fen_at(7), None);
        assert_eq!(line.side_at(0), PieceColor::White);
        assert_eq!(line.side_at(5), PieceColor::Black);
        assert_eq!(line.numbered(), "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5");
        assert_eq!(line.numbered_prefix(3), "1. e4 e5 2. Nf3");
        assert_eq!(line.numbered_prefix(0), "");
    }

    #[test]
    fn test_mixed_notation_line() {
        let line = Line::from_tokens(tokenize_moves("e2e4 c5 g1f3")).unwrap();
        assert_eq!(line.sans(), vec!["e4", "c5", "Nf3"]);
    }

    #[test]
    fn test_illegal_ply_reports_index() {
        let err = Line::from_tokens(tokenize_moves("e4 e5 Ke3")).unwrap_err();
        match err {
            LineError::IllegalPly { index, token, .. } => {
                assert_eq!(index, 2);
                assert_eq!(token, "Ke3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_line() {
        assert!(matches!(Line::from_tokens(Vec::new()), Err(LineError::Empty)));
    }

    #[test]
    fn test_line_from_black_to_move() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 3 3";
        let line = Line::from_fen_tokens(fen, tokenize_moves("g8f6 h5f7")).unwrap();
        assert_eq!(line.side_at(0), PieceColor::Black);
        assert_eq!(line.side_at(1), PieceColor::White);
        assert_eq!(line.sans(), vec!["Nf6", "Qxf7#"]);
    }
}
