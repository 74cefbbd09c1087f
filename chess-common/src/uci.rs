//! UCI (Universal Chess Interface) coordinate move utilities

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::converters::{format_piece, format_square, parse_piece, parse_square};

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The converted move is only returned if it is in `legal_moves`.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Convert a cozy_chess king-to-rook castling move back to the
/// king-moves-two-squares form. Other moves are returned unchanged.
pub fn convert_cozy_castling_to_uci(board: &Board, mv: Move) -> Move {
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move());
    if !is_castle {
        return mv;
    }
    let king_file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(king_file, mv.from.rank()),
        promotion: None,
    }
}

/// Parse a 4 or 5 character coordinate move ("e2e4", "e7e8q").
pub fn parse_uci_move(s: &str) -> Option<Move> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return None;
    }
    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;
    let promotion = match s[4..].chars().next() {
        Some(c) => match parse_piece(c)? {
            p @ (Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen) => Some(p),
            _ => return None,
        },
        None => None,
    };
    Some(Move {
        from,
        to,
        promotion,
    })
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal_moves(board: &Board) -> Vec<Move> {
        let mut moves = Vec::new();
        board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    #[test]
    fn test_format_uci_move() {
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_parse_uci_move() {
        let mv = parse_uci_move("e7e8q").unwrap();
        assert_eq!(mv.from, Square::E7);
        assert_eq!(mv.to, Square::E8);
        assert_eq!(mv.promotion, Some(Piece::Queen));

        assert!(parse_uci_move("e2e4").unwrap().promotion.is_none());
        assert!(parse_uci_move("e7e8k").is_none());
        assert!(parse_uci_move("e2").is_none());
        assert!(parse_uci_move("Nf3").is_none());
        assert!(parse_uci_move("e2e4e5").is_none());
    }

    #[test]
    fn test_castling_round_trip() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let legal = legal_moves(&board);

        let uci = parse_uci_move("e1g1").unwrap();
        let cozy = convert_uci_castling_to_cozy(uci, &legal);
        assert_eq!(cozy.to, Square::H1);
        assert_eq!(convert_cozy_castling_to_uci(&board, cozy), uci);

        let uci = parse_uci_move("e1c1").unwrap();
        let cozy = convert_uci_castling_to_cozy(uci, &legal);
        assert_eq!(cozy.to, Square::A1);
        assert_eq!(convert_cozy_castling_to_uci(&board, cozy), uci);
    }

    #[test]
    fn test_non_castling_move_unchanged() {
        let board = Board::default();
        let legal = legal_moves(&board);
        let mv = parse_uci_move("e2e4").unwrap();
        assert_eq!(convert_uci_castling_to_cozy(mv, &legal), mv);
        assert_eq!(convert_cozy_castling_to_uci(&board, mv), mv);
    }
}
