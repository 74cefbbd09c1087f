//! Distractor moves for the binary choice.

use std::collections::HashMap;

use chess::{position_key, Board, Move, MoveToken};
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks a plausible wrong move to pair with the correct one.
///
/// Candidates come from other openings' lines: the move they play at the
/// same ply, and their first move. A candidate is kept only if it is legal
/// here and differs from the correct move. Without one, a random legal move
/// is used. Results are cached per position until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct DecoyGenerator {
    pool: Vec<Vec<MoveToken>>,
    cache: HashMap<String, Move>,
}

impl DecoyGenerator {
    pub fn new(pool: Vec<Vec<MoveToken>>) -> Self {
        Self {
            pool,
            cache: HashMap::new(),
        }
    }

    /// Start a new line with a fresh pool; drops every cached decoy.
    pub fn reset(&mut self, pool: Vec<Vec<MoveToken>>) {
        self.pool = pool;
        self.cache.clear();
    }

    /// Drop cached decoys but keep the pool, for replaying the same line.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// A legal move other than `correct`, or `None` when `correct` is the
    /// only legal move.
    pub fn decoy<R: Rng>(
        &mut self,
        board: &Board,
        ply_index: usize,
        correct: Move,
        rng: &mut R,
    ) -> Option<Move> {
        let key = format!("{}|{}", position_key(&board.to_string()), ply_index);
        if let Some(&mv) = self.cache.get(&key) {
            if mv != correct && board.is_legal(mv) {
                return Some(mv);
            }
        }

        let mv = self
            .from_pool(board, ply_index, correct, rng)
            .or_else(|| random_legal(board, correct, rng))?;
        self.cache.insert(key, mv);
        Some(mv)
    }

    fn from_pool<R: Rng>(
        &self,
        board: &Board,
        ply_index: usize,
        correct: Move,
        rng: &mut R,
    ) -> Option<Move> {
        let mut candidates: Vec<Move> = Vec::new();
        for tokens in &self.pool {
            for token in [tokens.get(ply_index), tokens.first()].into_iter().flatten() {
                if let Ok(mv) = token.resolve(board) {
                    if mv != correct && !candidates.contains(&mv) {
                        candidates.push(mv);
                    }
                }
            }
        }
        candidates.choose(rng).copied()
    }
}

fn random_legal<R: Rng>(board: &Board, correct: Move, rng: &mut R) -> Option<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs.into_iter().filter(|&mv| mv != correct));
        false
    });
    moves.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{parse_san, tokenize_moves, Game};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn pool(lines: &[&str]) -> Vec<Vec<MoveToken>> {
        lines.iter().map(|l| tokenize_moves(l)).collect()
    }

    #[test]
    fn test_decoy_from_other_lines() {
        let board = Board::default();
        let correct = parse_san(&board, "e4").unwrap();
        let mut gen = DecoyGenerator::new(pool(&["d4 d5", "e4 c5", "c4 e5"]));
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..20 {
            gen.reset(pool(&["d4 d5", "e4 c5", "c4 e5"]));
            let decoy = gen.decoy(&board, 0, correct, &mut rng).unwrap();
            assert_ne!(decoy, correct);
            let san = chess::format_san(&board, decoy);
            assert!(san == "d4" || san == "c4", "unexpected decoy {san}");
        }
    }

    #[test]
    fn test_same_ply_candidates() {
        let mut game = Game::new();
        game.play_token(&MoveToken::classify("e4")).unwrap();
        let board = game.position().clone();
        let correct = parse_san(&board, "e5").unwrap();
        // "d4" is neither a black move nor long enough to have a ply 1
        let mut gen = DecoyGenerator::new(pool(&["e4 c5", "d4"]));
        let mut rng = SmallRng::seed_from_u64(1);
        let decoy = gen.decoy(&board, 1, correct, &mut rng).unwrap();
        assert_eq!(chess::format_san(&board, decoy), "c5");
    }

    #[test]
    fn test_fallback_random_legal() {
        let board = Board::default();
        let correct = parse_san(&board, "e4").unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        for seed in 0..30 {
            let mut gen = DecoyGenerator::new(pool(&["e4"]));
            let mut rng2 = SmallRng::seed_from_u64(seed);
            let decoy = gen.decoy(&board, 0, correct, &mut rng2).unwrap();
            assert_ne!(decoy, correct);
            assert!(board.is_legal(decoy));
        }
        let mut gen = DecoyGenerator::default();
        assert!(gen.decoy(&board, 0, correct, &mut rng).is_some());
    }

    #[test]
    fn test_only_move_has_no_decoy() {
        // King boxed in by the queen; the a-pawn push is the only move
        let board: Board = "7k/5Q2/8/8/p7/8/8/K7 b - - 0 1".parse().unwrap();
        let mut moves = Vec::new();
        board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        assert_eq!(moves.len(), 1);
        let mut gen = DecoyGenerator::default();
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(gen.decoy(&board, 0, moves[0], &mut rng), None);
    }

    #[test]
    fn test_cache_is_per_position_and_reset_per_line() {
        let board = Board::default();
        let correct = parse_san(&board, "e4").unwrap();
        let mut gen = DecoyGenerator::new(Vec::new());
        let mut rng = SmallRng::seed_from_u64(11);
        let first = gen.decoy(&board, 0, correct, &mut rng).unwrap();
        for _ in 0..10 {
            assert_eq!(gen.decoy(&board, 0, correct, &mut rng), Some(first));
        }
        assert_eq!(gen.cached(), 1);
        gen.reset(Vec::new());
        assert_eq!(gen.cached(), 0);
    }
}
