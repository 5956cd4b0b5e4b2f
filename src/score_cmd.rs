//! Offline scoring of a single post, for checking parser behavior.

use wordlebot_core::models::{CellScore, ROW_WIDTH};
use wordlebot_core::processor::{analyze, Analysis};
use wordlebot_core::scoring::calculate_score;

/// Render a matrix back into emoji rows.
pub fn render_matrix(matrix: &[CellScore]) -> String {
    matrix
        .chunks(ROW_WIDTH)
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    CellScore::Correct => '🟩',
                    CellScore::Partial => '🟨',
                    CellScore::Wrong => '⬛',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Analyze `text` and `alt_texts` and describe the result.
pub fn describe(text: &str, alt_texts: &[String]) -> (Analysis, String) {
    let candidates: Vec<&str> = std::iter::once(text)
        .chain(alt_texts.iter().map(String::as_str))
        .collect();
    let analysis = analyze(&candidates);

    let mut out = String::new();
    if !analysis.matrix.is_empty() {
        out.push_str(&render_matrix(&analysis.matrix));
        out.push('\n');
    }
    out.push_str(&format!("  cells: {}\n", analysis.matrix.len()));
    out.push_str(&format!("  puzzle: {}\n", analysis.identity.puzzle_number));
    out.push_str(&format!("  hard mode: {}\n", analysis.identity.hard_mode));
    out.push_str(&format!("  solved row: {}\n", analysis.solved_row));
    if analysis.is_valid() {
        let score = calculate_score(&analysis.matrix, analysis.identity.hard_mode);
        out.push_str("  valid: yes\n");
        out.push_str(&format!(
            "  score: {} ({} cell + {} bonus)",
            score.final_score, score.cell_points, score.bonus
        ));
    } else {
        out.push_str("  valid: no");
    }
    (analysis, out)
}

pub fn run_score(text: &str, alt_texts: &[String]) {
    let (_, out) = describe(text, alt_texts);
    println!("{}", out);
}
