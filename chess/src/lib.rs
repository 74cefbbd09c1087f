pub mod fen;
pub mod game;
pub mod notation;
pub mod placement;
pub mod san;
pub mod types;

pub use chess_common::*;
pub use fen::{format_fen, parse_fen, position_key, FenError, STARTING_FEN};
pub use game::{Game, GameError, HistoryEntry};
pub use notation::{tokenize_moves, MoveToken, NotationError};
pub use placement::{ColoredPiece, Placement, PlacementDiff, PlacementError};
pub use san::{format_san, parse_san, SanError};
pub use types::{PieceColor, PieceKind};

pub use cozy_chess::{Board, Move, Square};
