//! String/char conversions for cozy-chess squares, files, ranks and pieces.

use cozy_chess::{Color, File, Piece, Rank, Square};

/// Parse a square in algebraic form (e.g. "e4").
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = parse_file(chars.next()?)?;
    let rank = parse_rank(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

pub fn parse_file(c: char) -> Option<File> {
    match c {
        'a'..='h' => Some(File::index(c as usize - 'a' as usize)),
        _ => None,
    }
}

pub fn parse_rank(c: char) -> Option<Rank> {
    match c {
        '1'..='8' => Some(Rank::index(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Parse a piece letter, either case.
pub fn parse_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

pub fn format_file(file: File) -> char {
    (b'a' + file as u8) as char
}

pub fn format_rank(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

pub fn format_square(sq: Square) -> String {
    format!("{}{}", format_file(sq.file()), format_rank(sq.rank()))
}

/// Lowercase piece letter, as used in UCI promotions.
pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

/// Uppercase piece letter, as used in SAN.
pub fn format_piece_upper(piece: Piece) -> char {
    format_piece(piece).to_ascii_uppercase()
}

pub fn format_color(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_square() {
        assert_eq!(parse_square("e4"), Some(Square::new(File::E, Rank::Fourth)));
        assert_eq!(parse_square("a1"), Some(Square::A1));
        assert_eq!(parse_square("h8"), Some(Square::H8));
        assert_eq!(parse_square("i1"), None);
        assert_eq!(parse_square("e9"), None);
        assert_eq!(parse_square("e44"), None);
        assert_eq!(parse_square(""), None);
    }

    #[test]
    fn test_format_square() {
        assert_eq!(format_square(Square::new(File::E, Rank::Fourth)), "e4");
        assert_eq!(format_square(Square::A1), "a1");
        assert_eq!(format_square(Square::H8), "h8");
    }

    #[test]
    fn test_piece_letters() {
        assert_eq!(parse_piece('N'), Some(Piece::Knight));
        assert_eq!(parse_piece('q'), Some(Piece::Queen));
        assert_eq!(parse_piece('x'), None);
        assert_eq!(format_piece(Piece::Rook), 'r');
        assert_eq!(format_piece_upper(Piece::Bishop), 'B');
    }
}
