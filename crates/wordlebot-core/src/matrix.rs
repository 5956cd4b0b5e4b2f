//! Grid extraction from emoji text and from accessibility alt-text.
//!
//! Emoji grids are the authoritative signal. Alt-text descriptions are a
//! fallback for posts that share the grid as an image. [`resolve_matrix`]
//! tries both readers on each candidate before moving to the next one.

use crate::models::{CellScore, Matrix, ROW_WIDTH};
use crate::phrases::PhraseTable;
use crate::scoring::is_valid;

/// Map one codepoint to a cell, if it is a grid square.
fn cell_for(ch: char) -> Option<CellScore> {
    match ch {
        // green, and orange in high-contrast mode
        '\u{1F7E9}' | '\u{1F7E7}' => Some(CellScore::Correct),
        // yellow, and blue in high-contrast mode
        '\u{1F7E8}' | '\u{1F7E6}' => Some(CellScore::Partial),
        // black and white squares for dark and light themes
        '\u{2B1B}' | '\u{2B1C}' => Some(CellScore::Wrong),
        _ => None,
    }
}

/// Read grid squares in encounter order, skipping every other character.
pub fn parse_codepoints(text: &str) -> Matrix {
    text.chars().filter_map(cell_for).collect()
}

/// Read an alt-text grid description using the current phrase table.
pub fn parse_alt_text(text: &str) -> Matrix {
    parse_alt_text_with(text, PhraseTable::current())
}

/// Read an alt-text grid description using `phrases`.
///
/// Rows are separated by newlines, or by periods when the text has no
/// newline. A result where every cell is wrong is returned empty.
pub fn parse_alt_text_with(text: &str, phrases: &PhraseTable) -> Matrix {
    let separator = if text.contains('\n') { '\n' } else { '.' };

    let matrix: Matrix = text
        .split(separator)
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| parse_alt_line(line, phrases))
        .collect();

    if matrix.iter().all(|&c| c == CellScore::Wrong) {
        return Matrix::new();
    }
    matrix
}

fn parse_alt_line(line: &str, phrases: &PhraseTable) -> [CellScore; ROW_WIDTH] {
    let mut row = [CellScore::Wrong; ROW_WIDTH];
    let body = line.split_once(':').map(|(_, rest)| rest).unwrap_or("");

    let has_perfect = line.contains(phrases.perfect);

    if line.contains(phrases.won) {
        row = [CellScore::Correct; ROW_WIDTH];
    } else if line.contains(phrases.wrong_order) {
        row = [CellScore::Partial; ROW_WIDTH];
    } else if has_perfect && line.contains(phrases.wrong_place) {
        let (perfect, misplaced) = split_at_word(body, phrases.split_word);
        mark(&mut row, perfect, CellScore::Correct);
        mark(&mut row, misplaced, CellScore::Partial);
    } else if line.contains(phrases.but_wrong_place) {
        mark(&mut row, body, CellScore::Partial);
    } else if has_perfect {
        if positions(body).next().is_none() {
            row = [CellScore::Correct; ROW_WIDTH];
        } else {
            mark(&mut row, body, CellScore::Correct);
        }
    }
    row
}

/// 0-based positions for each digit 1..=5 named in `text`.
fn positions(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .filter(|d| (1..=ROW_WIDTH as u32).contains(d))
        .map(|d| d as usize - 1)
}

fn mark(row: &mut [CellScore; ROW_WIDTH], text: &str, cell: CellScore) {
    for pos in positions(text) {
        row[pos] = cell;
    }
}

/// Split at the first standalone occurrence of `word`; the word itself is dropped.
fn split_at_word<'a>(text: &'a str, word: &str) -> (&'a str, &'a str) {
    let is_boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
    for (start, _) in text.match_indices(word) {
        let end = start + word.len();
        if is_boundary(text[..start].chars().next_back())
            && is_boundary(text[end..].chars().next())
        {
            return (&text[..start], &text[end..]);
        }
    }
    (text, "")
}

/// First structurally valid matrix across `candidates`.
///
/// Each candidate is read as emoji first, then as alt-text. When nothing
/// is valid, the last attempted matrix is returned.
pub fn resolve_matrix<S: AsRef<str>>(candidates: &[S]) -> Matrix {
    let mut last = Matrix::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();

        let from_emoji = parse_codepoints(candidate);
        if is_valid(&from_emoji, None, None) {
            return from_emoji;
        }

        let from_alt = parse_alt_text(candidate);
        if is_valid(&from_alt, None, None) {
            return from_alt;
        }
        last = from_alt;
    }
    last
}
