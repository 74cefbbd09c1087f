use cozy_chess::{Board, Color, GameStatus, Move, Square};

use crate::notation::{MoveToken, NotationError};
use crate::san::format_san;
use crate::types::{PieceColor, PieceKind};

/// Game state wrapper around a cozy-chess Board, with history for undo.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    start: Board,
    history: Vec<HistoryEntry>,
}

/// A move that was played, with the positions around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub san: String,
    pub fen_before: String,
    pub fen_after: String,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::from_board(crate::fen::parse_fen(fen)?))
    }

    fn from_board(board: Board) -> Self {
        Self {
            position: board.clone(),
            start: board,
            history: Vec::new(),
        }
    }

    /// Replace the position with `fen`. History is cleared and `fen` becomes
    /// the position `undo` rebuilds from. On error the game is unchanged.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), GameError> {
        *self = Self::from_fen(fen)?;
        Ok(())
    }

    /// Reset to the standard starting position.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.position.is_legal(mv) {
            return Err(GameError::IllegalMove);
        }

        let fen_before = self.to_fen();
        let san = format_san(&self.position, mv);
        self.position.play_unchecked(mv);

        let entry = HistoryEntry {
            mv,
            san,
            fen_before,
            fen_after: self.to_fen(),
        };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Resolve a line token against the current position and play it.
    pub fn play_token(&mut self, token: &MoveToken) -> Result<HistoryEntry, GameError> {
        let mv = token.resolve(&self.position)?;
        self.make_move(mv)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<HistoryEntry, GameError> {
        let entry = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.rebuild_position()?;
        Ok(entry)
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.position.is_legal(mv)
    }

    /// Get the current game status
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> PieceColor {
        self.position.side_to_move().into()
    }

    pub fn piece_on(&self, sq: Square) -> Option<(PieceKind, PieceColor)> {
        let piece = self.position.piece_on(sq)?;
        let color = self.position.color_on(sq)?;
        Some((piece.into(), color.into()))
    }

    pub fn is_check(&self) -> bool {
        !self.position.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.status() == GameStatus::Won
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    /// SAN of `mv` in the current position.
    pub fn san(&self, mv: Move) -> String {
        format_san(&self.position, mv)
    }

    /// Numbered move list of the history, e.g. `1. e4 e5 2. Nf3`.
    pub fn move_list(&self) -> String {
        let mut out = Vec::new();
        let mut number = self.start.fullmove_number();
        let mut white_to_move = self.start.side_to_move() == Color::White;

        for (i, entry) in self.history.iter().enumerate() {
            if white_to_move {
                out.push(format!("{}. {}", number, entry.san));
            } else if i == 0 {
                out.push(format!("{}... {}", number, entry.san));
            } else {
                out.push(entry.san.clone());
            }
            if !white_to_move {
                number += 1;
            }
            white_to_move = !white_to_move;
        }

        out.join(" ")
    }

    /// Rebuild position from start + history (for undo)
    fn rebuild_position(&mut self) -> Result<(), GameError> {
        let mut board = self.start.clone();
        for entry in &self.history {
            board
                .try_play(entry.mv)
                .map_err(|_| GameError::IllegalMove)?;
        }

        self.position = board;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move")]
    IllegalMove,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
    #[error(transparent)]
    Notation(#[from] NotationError),
}
