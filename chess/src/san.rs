//! Standard Algebraic Notation (SAN) parsing and formatting.

use chess_common::{
    format_file, format_piece_upper, format_rank, format_square, format_uci_move, parse_file,
    parse_piece, parse_rank, parse_square,
};
use cozy_chess::{Board, GameStatus, Move, Piece, Rank, Square};

/// Parse a SAN move (`Nf3`, `exd5`, `e8=Q+`, `O-O`, `Rad1`) against a position.
///
/// Check/mate suffixes and `!`/`?` annotations are ignored. `0-0` spellings
/// of castling are accepted, as is a missing `=` before a promotion piece. A
/// pawn reaching the last rank without a promotion piece promotes to a queen.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let trimmed = san
        .trim()
        .trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
    if trimmed.is_empty() || !trimmed.is_ascii() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let legal = legal_moves(board);

    if let Some(kingside) = castle_side(trimmed) {
        return legal
            .into_iter()
            .find(|&mv| is_castle(board, mv) && is_kingside(mv) == kingside)
            .ok_or_else(|| SanError::NoLegalMove(san.to_string()));
    }

    let (body, promotion) = split_promotion(trimmed)?;

    let (piece, body) = match body.chars().next() {
        Some(c) if c.is_ascii_uppercase() => {
            let piece = parse_piece(c).ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;
            (piece, &body[1..])
        }
        _ => (Piece::Pawn, body),
    };

    if body.len() < 2 {
        return Err(SanError::InvalidFormat(san.to_string()));
    }
    let (hint, dest) = body.split_at(body.len() - 2);
    let to = parse_square(dest).ok_or_else(|| SanError::InvalidSquare(dest.to_string()))?;

    let mut from_file = None;
    let mut from_rank = None;
    for c in hint.chars() {
        match c {
            'x' | ':' | '-' => {}
            'a'..='h' => from_file = parse_file(c),
            '1'..='8' => from_rank = parse_rank(c),
            _ => return Err(SanError::InvalidFormat(san.to_string())),
        }
    }

    let promotion = match promotion {
        Some(p) => Some(p),
        None if piece == Piece::Pawn && is_last_rank(to) => Some(Piece::Queen),
        None => None,
    };

    let candidates: Vec<Move> = legal
        .into_iter()
        .filter(|&mv| {
            mv.to == to
                && mv.promotion == promotion
                && board.piece_on(mv.from) == Some(piece)
                && !is_castle(board, mv)
                && from_file.map_or(true, |f| mv.from.file() == f)
                && from_rank.map_or(true, |r| mv.from.rank() == r)
        })
        .collect();

    match candidates.as_slice() {
        [] => Err(SanError::NoLegalMove(san.to_string())),
        [mv] => Ok(*mv),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Format a move as SAN, including disambiguation, capture marker,
/// promotion and check/checkmate suffix.
///
/// The move is expected to be legal in `board`; if it isn't, its UCI form is
/// returned.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format_uci_move(mv);
    };
    if !board.is_legal(mv) {
        return format_uci_move(mv);
    }

    let mut san = if is_castle(board, mv) {
        let castle = if is_kingside(mv) { "O-O" } else { "O-O-O" };
        castle.to_string()
    } else {
        let capture = board.piece_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        let mut san = String::new();
        if piece == Piece::Pawn {
            if capture {
                san.push(format_file(mv.from.file()));
            }
        } else {
            san.push(format_piece_upper(piece));
            san.push_str(&disambiguation(board, mv, piece));
        }
        if capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(format_piece_upper(promo));
        }
        san
    };

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|&other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
                && !is_castle(board, other)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        format_file(mv.from.file()).to_string()
    } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        format_rank(mv.from.rank()).to_string()
    } else {
        format_square(mv.from)
    }
}

fn split_promotion(body: &str) -> Result<(&str, Option<Piece>), SanError> {
    if let Some(idx) = body.find('=') {
        let rest = &body[idx + 1..];
        let mut chars = rest.chars();
        let piece = chars
            .next()
            .and_then(promotion_piece)
            .filter(|_| chars.next().is_none())
            .ok_or_else(|| SanError::InvalidPromotion(rest.to_string()))?;
        return Ok((&body[..idx], Some(piece)));
    }

    // "e8Q" style
    match body.chars().last() {
        Some(c) if body.len() > 2 && c.is_ascii_uppercase() => {
            let piece =
                promotion_piece(c).ok_or_else(|| SanError::InvalidPromotion(c.to_string()))?;
            Ok((&body[..body.len() - 1], Some(piece)))
        }
        _ => Ok((body, None)),
    }
}

fn promotion_piece(c: char) -> Option<Piece> {
    match parse_piece(c)? {
        p @ (Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen) => Some(p),
        _ => None,
    }
}

fn castle_side(s: &str) -> Option<bool> {
    match s {
        "O-O" | "0-0" => Some(true),
        "O-O-O" | "0-0-0" => Some(false),
        _ => None,
    }
}

/// cozy-chess encodes castling as the king capturing its own rook.
fn is_castle(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
}

fn is_kingside(mv: Move) -> bool {
    (mv.to.file() as u8) > (mv.from.file() as u8)
}

fn is_last_rank(sq: Square) -> bool {
    matches!(sq.rank(), Rank::First | Rank::Eighth)
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    fn san_of(board: &Board, uci: &str) -> String {
        let mv = chess_common::parse_uci_move(uci).unwrap();
        let mv = chess_common::convert_uci_castling_to_cozy(mv, &legal_moves(board));
        format_san(board, mv)
    }

    #[test]
    fn test_format_pawn_and_piece_moves() {
        let b = Board::default();
        assert_eq!(san_of(&b, "e2e4"), "e4");
        assert_eq!(san_of(&b, "g1f3"), "Nf3");
    }

    #[test]
    fn test_format_captures() {
        let b = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        assert_eq!(san_of(&b, "e4d5"), "exd5");
        let b = board("rnbqkbnr/ppp2ppp/8/3pp3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3");
        assert_eq!(san_of(&b, "f3e5"), "Nxe5");
    }

    #[test]
    fn test_format_disambiguation() {
        // Knights on b1 and f3 can both reach d2
        let b = board("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        assert_eq!(san_of(&b, "b1d2"), "Nbd2");
        assert_eq!(san_of(&b, "f3d2"), "Nfd2");

        // Rooks on a1 and a5 share a file
        let b = board("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(san_of(&b, "a1a3"), "R1a3");
        assert_eq!(san_of(&b, "a5a3"), "R5a3");
    }

    #[test]
    fn test_format_castling() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(san_of(&b, "e1g1"), "O-O");
        assert_eq!(san_of(&b, "e1c1"), "O-O-O");
    }

    #[test]
    fn test_format_check_and_mate() {
        // Scholar's mate
        let b = board("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        assert_eq!(san_of(&b, "h5f7"), "Qxf7#");

        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(san_of(&b, "a1a8"), "Ra8+");
    }

    #[test]
    fn test_format_promotion() {
        let b = board("8/P6k/8/8/8/8/6K1/8 w - - 0 1");
        assert_eq!(san_of(&b, "a7a8q"), "a8=Q");
        assert_eq!(san_of(&b, "a7a8n"), "a8=N");
    }

    #[test]
    fn test_parse_basic() {
        let b = Board::default();
        assert_eq!(format_uci_move(parse_san(&b, "e4").unwrap()), "e2e4");
        assert_eq!(format_uci_move(parse_san(&b, "Nf3").unwrap()), "g1f3");
        assert_eq!(format_uci_move(parse_san(&b, "Nc3!?").unwrap()), "b1c3");
    }

    #[test]
    fn test_parse_castling_spellings() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(parse_san(&b, "O-O").unwrap().to, Square::H1);
        assert_eq!(parse_san(&b, "0-0-0").unwrap().to, Square::A1);
    }

    #[test]
    fn test_parse_promotion_forms() {
        let b = board("8/P6k/8/8/8/8/6K1/8 w - - 0 1");
        assert_eq!(parse_san(&b, "a8=R").unwrap().promotion, Some(Piece::Rook));
        assert_eq!(parse_san(&b, "a8N").unwrap().promotion, Some(Piece::Knight));
        assert_eq!(parse_san(&b, "a8").unwrap().promotion, Some(Piece::Queen));
        assert!(matches!(
            parse_san(&b, "a8=K"),
            Err(SanError::InvalidPromotion(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        let b = Board::default();
        assert!(matches!(parse_san(&b, "e5"), Err(SanError::NoLegalMove(_))));
        assert!(matches!(parse_san(&b, "Zf3"), Err(SanError::InvalidFormat(_))));
        assert!(matches!(parse_san(&b, ""), Err(SanError::InvalidFormat(_))));
        assert!(matches!(parse_san(&b, "Nz3"), Err(SanError::InvalidSquare(_))));

        let b = board("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        assert!(matches!(parse_san(&b, "Nd2"), Err(SanError::AmbiguousMove(_))));
        assert_eq!(parse_san(&b, "Nbd2").unwrap().from, Square::B1);
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_agrees(choices in prop::collection::vec(any::<prop::sample::Index>(), 1..40)) {
            let mut b = Board::default();
            for choice in choices {
                let moves = legal_moves(&b);
                if moves.is_empty() {
                    break;
                }
                let mv = moves[choice.index(moves.len())];
                let san = format_san(&b, mv);
                prop_assert_eq!(parse_san(&b, &san).unwrap(), mv, "san {}", san);
                b.play_unchecked(mv);
            }
        }
    }
}
