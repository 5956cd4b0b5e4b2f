//! Puzzle number and hard-mode detection from the "Wordle N x/6" line.

use regex::Regex;

/// Puzzle number in `text`, or 0 when none is found.
///
/// Thousands-separated forms ("1 234", "1,234", "1.234") are tried before
/// the plain digit form so the separator is not mistaken for the end of
/// the number.
pub fn puzzle_number(text: &str) -> u32 {
    let patterns: [&Regex; 3] = [
        regex!(r"(?i)wordle\s*#?\s*(\d{1,3}\s\d{3})"),
        regex!(r"(?i)wordle\s*#?\s*(\d{1,3}[,.]\d{3})"),
        regex!(r"(?i)wordle\s*#?\s*(\d+)"),
    ];

    for re in patterns {
        if let Some(m) = re.captures(text).and_then(|caps| caps.get(1)) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            return digits.parse().unwrap_or(0);
        }
    }
    0
}

/// First non-zero puzzle number across `candidates`, or 0.
pub fn puzzle_number_in<S: AsRef<str>>(candidates: &[S]) -> u32 {
    candidates
        .iter()
        .map(|c| puzzle_number(c.as_ref()))
        .find(|&n| n != 0)
        .unwrap_or(0)
}

/// Whether the result line ends with the hard-mode `*`.
pub fn is_hard_mode(text: &str) -> bool {
    let re = regex!(r"(?i)wordle\s*#?\s*\d+(?:[,.\s]\d{3})?\s*\d+/\d+\s*(\*)?");
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| !m.as_str().is_empty())
}

/// True when any candidate reports hard mode.
pub fn is_hard_mode_in<S: AsRef<str>>(candidates: &[S]) -> bool {
    candidates.iter().any(|c| is_hard_mode(c.as_ref()))
}
