//! Matrix validity, solved-row detection, and point calculation.
//!
//! Scores must match historical data exactly, so the formula below is
//! reproduced as-is, including the solved-row bonus that reuses the last
//! played row's multiplier for every unused row.

use crate::models::{CellScore, ROW_WIDTH};

/// Largest number of rows a Wordle game can use.
pub const MAX_ROWS: u32 = 6;

/// Point totals for one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Sum of per-cell contributions.
    pub cell_points: u32,
    /// Reward for unused rows.
    pub bonus: u32,
    pub final_score: u32,
}

/// Structural and semantic validity.
///
/// The matrix must be non-empty with whole rows. When supplied, the puzzle
/// number must be non-zero and the solved row must be below 7.
pub fn is_valid(
    matrix: &[CellScore],
    puzzle_number: Option<u32>,
    solved_row: Option<u32>,
) -> bool {
    if matrix.is_empty() || matrix.len() % ROW_WIDTH != 0 {
        return false;
    }
    if puzzle_number == Some(0) {
        return false;
    }
    if let Some(row) = solved_row {
        if row > MAX_ROWS {
            return false;
        }
    }
    true
}

/// 1-indexed row of the solve, or 0 when the final row is not all correct.
///
/// Only the last row present is inspected.
pub fn solved_row(matrix: &[CellScore]) -> u32 {
    if !is_valid(matrix, None, None) {
        return 0;
    }
    let last_row = &matrix[matrix.len() - ROW_WIDTH..];
    if last_row.iter().all(|&c| c == CellScore::Correct) {
        (matrix.len() / ROW_WIDTH) as u32
    } else {
        0
    }
}

/// Weight of the cell at flat index `index`: 6 for row 1 down to 1 for row 6.
pub fn multiplier(index: usize) -> u32 {
    let row = index / ROW_WIDTH;
    if row < MAX_ROWS as usize {
        MAX_ROWS - row as u32
    } else {
        0
    }
}

/// Bonus for finishing on `solved_row`; zero for a row-6 finish or row 0.
pub fn point_bonus(solved_row: u32, hard_mode: bool) -> u32 {
    if solved_row == 0 {
        return 0;
    }
    let hard = u32::from(hard_mode);
    let row_multiplier = multiplier(solved_row as usize * ROW_WIDTH - 1) + hard;
    let mut bonus = 0;
    for _ in solved_row..MAX_ROWS {
        bonus += CellScore::Correct.value() * ROW_WIDTH as u32 * row_multiplier;
    }
    bonus
}

pub fn calculate_score(matrix: &[CellScore], hard_mode: bool) -> ScoreBreakdown {
    let hard = u32::from(hard_mode);
    let cell_points = matrix
        .iter()
        .enumerate()
        .map(|(i, cell)| cell.value() * (multiplier(i) + hard))
        .sum();
    let bonus = point_bonus((matrix.len() / ROW_WIDTH) as u32, hard_mode);
    ScoreBreakdown {
        cell_points,
        bonus,
        final_score: cell_points + bonus,
    }
}
