//! Move tokens as they appear in authored line data.

use std::fmt;

use chess_common::{convert_uci_castling_to_cozy, format_uci_move, parse_uci_move};
use cozy_chess::{Board, Move, Piece, Rank};

use crate::san::{parse_san, SanError};

/// A move token from line data, classified once when the line is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveToken {
    /// `e2e4`, `e7e8q`, castling as `e1g1`
    Coordinate(Move),
    /// `Nf3`, `exd5`, `O-O`
    Algebraic(String),
}

impl MoveToken {
    pub fn classify(token: &str) -> Self {
        let token = token.trim();
        match parse_uci_move(token) {
            Some(mv) => Self::Coordinate(mv),
            None => Self::Algebraic(token.to_string()),
        }
    }

    /// Resolve the token to a legal move in `board`.
    ///
    /// Coordinate pawn moves to the last rank without a promotion piece
    /// promote to a queen.
    pub fn resolve(&self, board: &Board) -> Result<Move, NotationError> {
        match self {
            Self::Algebraic(san) => Ok(parse_san(board, san)?),
            Self::Coordinate(mv) => {
                let mut legal = Vec::new();
                board.generate_moves(|mvs| {
                    legal.extend(mvs);
                    false
                });

                let mut mv = convert_uci_castling_to_cozy(*mv, &legal);
                if mv.promotion.is_none()
                    && board.piece_on(mv.from) == Some(Piece::Pawn)
                    && matches!(mv.to.rank(), Rank::First | Rank::Eighth)
                {
                    mv.promotion = Some(Piece::Queen);
                }

                if legal.contains(&mv) {
                    Ok(mv)
                } else {
                    Err(NotationError::Illegal(self.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinate(mv) => write!(f, "{}", format_uci_move(*mv)),
            Self::Algebraic(san) => write!(f, "{}", san),
        }
    }
}

/// Split a space separated move list, dropping move numbers (`1.`, `12...`)
/// and game results (`1-0`, `0-1`, `1/2-1/2`).
pub fn tokenize_moves(moves: &str) -> Vec<MoveToken> {
    moves
        .split_whitespace()
        .filter(|t| !t.contains('.'))
        .filter(|t| !t.starts_with("1-") && !t.starts_with("0-1") && !t.starts_with("1/2"))
        .filter(|t| *t != "*")
        .map(MoveToken::classify)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("Illegal move in this position: {0}")]
    Illegal(String),
    #[error(transparent)]
    San(#[from] SanError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Square;

    #[test]
    fn test_classify() {
        assert!(matches!(MoveToken::classify("e2e4"), MoveToken::Coordinate(_)));
        assert!(matches!(MoveToken::classify("e7e8q"), MoveToken::Coordinate(_)));
        assert_eq!(
            MoveToken::classify("Nf3"),
            MoveToken::Algebraic("Nf3".to_string())
        );
        assert_eq!(MoveToken::classify("O-O"), MoveToken::Algebraic("O-O".to_string()));
    }

    #[test]
    fn test_resolve_both_forms_agree() {
        let board = Board::default();
        let a = MoveToken::classify("g1f3").resolve(&board).unwrap();
        let b = MoveToken::classify("Nf3").resolve(&board).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_coordinate_castling() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1".parse().unwrap();
        let mv = MoveToken::classify("e8c8").resolve(&board).unwrap();
        assert_eq!(mv.to, Square::A8);
    }

    #[test]
    fn test_resolve_default_promotion() {
        let board: Board = "8/P6k/8/8/8/8/6K1/8 w - - 0 1".parse().unwrap();
        let mv = MoveToken::classify("a7a8").resolve(&board).unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
    }

    #[test]
    fn test_resolve_illegal() {
        let board = Board::default();
        assert!(matches!(
            MoveToken::classify("e2e5").resolve(&board),
            Err(NotationError::Illegal(_))
        ));
        assert!(matches!(
            MoveToken::classify("Ke2").resolve(&board),
            Err(NotationError::San(_))
        ));
    }

    #[test]
    fn test_tokenize_moves() {
        let tokens = tokenize_moves("1. e4 e5 2. Nf3 Nc6 3... Bb5 1-0");
        let text: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        assert_eq!(text, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert!(tokenize_moves("   ").is_empty());
    }
}
