//! Piece placement boards, used to check a position the user set up by hand
//! against a target position.

use std::fmt;

use chess_common::format_square;
use cozy_chess::{File, Rank, Square};

use crate::types::{PieceColor, PieceKind};

pub type ColoredPiece = (PieceKind, PieceColor);

/// An 8x8 board holding only piece placement (no side to move, castling, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    squares: [[Option<ColoredPiece>; 8]; 8],
}

impl Placement {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the board placement from a FEN string. Only the first field is read.
    pub fn from_fen(fen: &str) -> Result<Self, PlacementError> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or(PlacementError::InvalidFen)?;

        let mut squares = [[None; 8]; 8];
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(PlacementError::InvalidFen);
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if file > 7 {
                    return Err(PlacementError::InvalidFen);
                }
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let color = if c.is_uppercase() {
                        PieceColor::White
                    } else {
                        PieceColor::Black
                    };
                    let kind = PieceKind::from_char(c).ok_or(PlacementError::InvalidPiece(c))?;
                    squares[rank][file] = Some((kind, color));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(PlacementError::InvalidFen);
            }
        }

        Ok(Placement { squares })
    }

    pub fn get(&self, sq: Square) -> Option<ColoredPiece> {
        self.squares[sq.rank() as usize][sq.file() as usize]
    }

    pub fn put(&mut self, sq: Square, piece: ColoredPiece) {
        self.squares[sq.rank() as usize][sq.file() as usize] = Some(piece);
    }

    pub fn remove(&mut self, sq: Square) -> Option<ColoredPiece> {
        self.squares[sq.rank() as usize][sq.file() as usize].take()
    }

    pub fn clear(&mut self) {
        self.squares = [[None; 8]; 8];
    }

    /// Number of occupied squares.
    pub fn piece_count(&self) -> usize {
        self.squares.iter().flatten().filter(|p| p.is_some()).count()
    }

    /// The FEN placement field for this board.
    pub fn to_fen_placement(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.squares[rank][file] {
                    Some((kind, color)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(match color {
                            PieceColor::White => kind.to_char_upper(),
                            PieceColor::Black => kind.to_char_lower(),
                        });
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    /// Differences between `self` (the attempt) and `target`, scanning
    /// a1..h8 rank by rank.
    pub fn diff(&self, target: &Placement) -> Vec<PlacementDiff> {
        let mut diffs = Vec::new();
        for rank in Rank::ALL {
            for file in File::ALL {
                let sq = Square::new(file, rank);
                match (target.get(sq), self.get(sq)) {
                    (Some(expected), None) => diffs.push(PlacementDiff::Missing {
                        square: sq,
                        piece: expected,
                    }),
                    (Some(expected), Some(actual)) if expected != actual => {
                        diffs.push(PlacementDiff::Wrong {
                            square: sq,
                            expected,
                            actual,
                        })
                    }
                    (None, Some(actual)) => diffs.push(PlacementDiff::Extra {
                        square: sq,
                        piece: actual,
                    }),
                    _ => {}
                }
            }
        }
        diffs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementDiff {
    Missing {
        square: Square,
        piece: ColoredPiece,
    },
    Wrong {
        square: Square,
        expected: ColoredPiece,
        actual: ColoredPiece,
    },
    Extra {
        square: Square,
        piece: ColoredPiece,
    },
}

fn piece_name((kind, color): ColoredPiece) -> String {
    format!("{} {}", color.name(), kind.name())
}

impl fmt::Display for PlacementDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Missing { square, piece } => {
                write!(f, "Missing {} on {}", piece_name(piece), format_square(square))
            }
            Self::Wrong {
                square,
                expected,
                actual,
            } => write!(
                f,
                "Wrong piece on {}. Should be {}, not {}",
                format_square(square),
                piece_name(expected),
                piece_name(actual)
            ),
            Self::Extra { square, piece } => {
                write!(f, "Extra {} on {}", piece_name(piece), format_square(square))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("Invalid FEN string")]
    InvalidFen,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STARTING_FEN;

    #[test]
    fn test_starting_position() {
        let board = Placement::from_fen(STARTING_FEN).unwrap();
        assert_eq!(
            board.get(Square::A1),
            Some((PieceKind::Rook, PieceColor::White))
        );
        assert_eq!(
            board.get(Square::E1),
            Some((PieceKind::King, PieceColor::White))
        );
        assert_eq!(
            board.get(Square::D8),
            Some((PieceKind::Queen, PieceColor::Black))
        );
        assert_eq!(board.get(Square::E5), None);
        assert_eq!(board.piece_count(), 32);
        assert_eq!(
            board.to_fen_placement(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
    }

    #[test]
    fn test_empty_board() {
        let board = Placement::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(board, Placement::empty());
        assert_eq!(board.to_fen_placement(), "8/8/8/8/8/8/8/8");
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(
            Placement::from_fen("8/8/8"),
            Err(PlacementError::InvalidFen)
        ));
        assert!(matches!(
            Placement::from_fen("7x/8/8/8/8/8/8/8"),
            Err(PlacementError::InvalidPiece('x'))
        ));
        assert!(Placement::from_fen("9/8/8/8/8/8/8/8").is_err());
    }

    #[test]
    fn test_diff_reports_each_kind() {
        let target = Placement::from_fen(STARTING_FEN).unwrap();
        let mut attempt = target.clone();
        attempt.remove(Square::G1);
        attempt.put(Square::E2, (PieceKind::Pawn, PieceColor::Black));
        attempt.put(Square::E4, (PieceKind::Queen, PieceColor::Black));

        let diffs: Vec<String> = attempt.diff(&target).iter().map(ToString::to_string).collect();
        assert_eq!(
            diffs,
            vec![
                "Missing White Knight on g1",
                "Wrong piece on e2. Should be White Pawn, not Black Pawn",
                "Extra Black Queen on e4",
            ]
        );
        assert!(target.diff(&target).is_empty());
    }
}
