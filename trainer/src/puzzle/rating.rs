//! Puzzle rating updates.

pub const DEFAULT_RATING: u32 = 650;
/// Puzzles within this distance of the user's rating are preferred.
pub const RATING_RANGE: u32 = 200;
pub const SUCCESS_POINTS: i32 = 10;
pub const FAILURE_POINTS: i32 = 5;
/// Bonus per full 100 points of rating difference.
pub const POINTS_PER_100_ELO: i32 = 1;
pub const MIN_RATING: u32 = 100;
pub const MAX_RATING: u32 = 3000;
pub const HINT_PENALTY: i32 = 5;

fn difference_bonus(user: u32, puzzle: u32) -> i32 {
    (user.abs_diff(puzzle) / 100) as i32 * POINTS_PER_100_ELO
}

/// Gain for solving; harder puzzles pay a bonus.
pub fn success_delta(user: u32, puzzle: u32) -> i32 {
    if puzzle > user {
        SUCCESS_POINTS + difference_bonus(user, puzzle)
    } else {
        SUCCESS_POINTS
    }
}

/// Loss for failing; easier puzzles cost a bonus.
pub fn failure_delta(user: u32, puzzle: u32) -> i32 {
    if puzzle < user {
        -(FAILURE_POINTS + difference_bonus(user, puzzle))
    } else {
        -FAILURE_POINTS
    }
}

/// Apply `delta` and clamp. Returns the new rating and the change actually
/// applied.
pub fn apply(rating: u32, delta: i32) -> (u32, i32) {
    let updated = (i64::from(rating) + i64::from(delta))
        .clamp(i64::from(MIN_RATING), i64::from(MAX_RATING)) as u32;
    (updated, updated as i32 - rating as i32)
}

pub fn in_range(user: u32, puzzle: u32) -> bool {
    user.abs_diff(puzzle) <= RATING_RANGE
}
