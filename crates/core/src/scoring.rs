//! Scoring module - classic line scoring and leveling
//!
//! Rules:
//! - Points for a clear are the base value from [`LINE_SCORES`] times the level.
//! - One level-up check per lock: `level < 10 && lines >= 10 * level`.
//! - Every level gained shortens the gravity interval by 40ms.
//! - The score saturates at [`SCORE_CAP`].

use crate::types::{
    GRAVITY_BASE_MS, GRAVITY_STEP_MS, LINES_PER_LEVEL, LINE_SCORES, MAX_LEVEL, MIN_LEVEL,
    SCORE_CAP,
};

/// Calculate line clear score (Classic rules)
/// lines: number of lines cleared (1-4)
/// level: current level (1-based)
pub fn calculate_line_score(lines: usize, level: u8) -> u32 {
    if lines == 0 || lines > 4 {
        return 0;
    }
    LINE_SCORES[lines].saturating_mul(level as u32)
}

/// Add points to a score, saturating at the cap.
pub fn add_score(score: u32, points: u32) -> u32 {
    score.saturating_add(points).min(SCORE_CAP)
}

/// Level after a lock brought the line count to `lines_cleared`
///
/// Only a single step is taken even if the lines would justify more.
///
/// ```
/// use blockfall_core::scoring::level_after;
///
/// assert_eq!(level_after(1, 10), 2);
/// assert_eq!(level_after(1, 21), 2);
/// assert_eq!(level_after(10, 500), 10);
/// ```
pub fn level_after(level: u8, lines_cleared: u16) -> u8 {
    if level < MAX_LEVEL && lines_cleared >= LINES_PER_LEVEL * level as u16 {
        level + 1
    } else {
        level
    }
}

/// Gravity interval for a level, in milliseconds
///
/// Levels outside `1..=10` are clamped.
pub fn gravity_interval_ms(level: u8) -> u32 {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    GRAVITY_BASE_MS - GRAVITY_STEP_MS * (level - MIN_LEVEL) as u32
}

/// Result of scoring a single lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    pub lines_cleared: u16,
    pub level: u8,
    pub score: u32,
    /// Points actually added after saturation.
    pub delta: u32,
    pub leveled_up: bool,
}

/// Apply a clear of `rows` to the counters
///
/// The level check runs before the points are multiplied, so a clear that
/// causes a level-up already scores at the new level.
pub fn apply_clear(rows: usize, lines_cleared: u16, level: u8, score: u32) -> ScoreResult {
    let lines_cleared = lines_cleared.saturating_add(rows as u16);
    let new_level = if rows > 0 {
        level_after(level, lines_cleared)
    } else {
        level
    };
    let new_score = add_score(score, calculate_line_score(rows, new_level));
    ScoreResult {
        lines_cleared,
        level: new_level,
        score: new_score,
        delta: new_score - score.min(new_score),
        leveled_up: new_level != level,
    }
}
