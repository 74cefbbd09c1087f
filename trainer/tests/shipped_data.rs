//! The opening and puzzle files shipped in `data/` must all be playable.

use chess::Game;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use trainer::puzzle::{parse_puzzles, EMBEDDED_PUZZLES};
use trainer::{Catalog, DecoyGenerator};

const OPENINGS: &str = include_str!("../../data/best_chess_openings.json");
const PUZZLES: &str = include_str!("../../data/puzzles.txt");

#[test]
fn test_every_shipped_line_replays_with_legal_decoys() {
    let catalog = Catalog::from_json(OPENINGS).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);
    let mut lines = 0;

    for opening in catalog.names() {
        for variation in catalog.variations(opening) {
            let selection = catalog
                .select(opening, variation)
                .unwrap_or_else(|e| panic!("{} / {}: {}", opening, variation, e));
            assert!(!selection.line.is_empty(), "{} / {} is empty", opening, variation);

            let mut decoys = DecoyGenerator::new(selection.decoy_pool.clone());
            let mut game = Game::from_fen(selection.line.start_fen()).unwrap();
            for (index, ply) in selection.line.plies().iter().enumerate() {
                if let Some(decoy) = decoys.decoy(game.position(), index, ply.mv, &mut rng) {
                    assert_ne!(decoy, ply.mv, "{} / {} ply {}", opening, variation, index);
                    assert!(game.is_legal(decoy), "{} / {} ply {}", opening, variation, index);
                }
                game.make_move(ply.mv).unwrap();
            }
            lines += 1;
        }
    }
    assert_eq!(lines, catalog.total_lines());
}

#[test]
fn test_every_shipped_puzzle_validates() {
    for (source, text) in [("puzzles.txt", PUZZLES), ("embedded", EMBEDDED_PUZZLES)] {
        let puzzles = parse_puzzles(text);
        assert!(!puzzles.is_empty(), "{} has no puzzles", source);
        for puzzle in &puzzles {
            let line = puzzle
                .validate()
                .unwrap_or_else(|e| panic!("{} {}: {}", source, puzzle.id, e));
            // Opponent moves first, the player makes the last move
            assert_eq!(line.len() % 2, 0, "{} {}", source, puzzle.id);
        }
    }
}
