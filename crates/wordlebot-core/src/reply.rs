//! Reply text for a scored post.

use crate::scoring::MAX_ROWS;
use crate::store::ComparisonStats;

/// Fields shown in a reply.
#[derive(Debug, Clone, Copy)]
pub struct ReplyFacts {
    pub puzzle_number: u32,
    pub solved_row: u32,
    pub hard_mode: bool,
    pub score: u32,
}

/// Build the reply, e.g.
///
/// ```text
/// Wordle 589 3/6*
/// Score: 250 points
/// You solved above 4 others so far.
/// ```
pub fn build_reply(facts: &ReplyFacts, stats: &ComparisonStats) -> String {
    let row = match facts.solved_row {
        0 => "X".to_string(),
        n => n.to_string(),
    };
    let star = if facts.hard_mode { "*" } else { "" };

    let mut reply = format!(
        "Wordle {} {}/{}{}\nScore: {} points",
        facts.puzzle_number, row, MAX_ROWS, star, facts.score
    );
    if !stats.is_empty() {
        reply.push_str(&format!(
            "\n{} {} so far.",
            stats.label_prefix, stats.above_count_text
        ));
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(solved_row: u32, hard_mode: bool) -> ReplyFacts {
        ReplyFacts {
            puzzle_number: 589,
            solved_row,
            hard_mode,
            score: 250,
        }
    }

    #[test]
    fn test_reply_with_stats() {
        let reply = build_reply(&facts(3, true), &ComparisonStats::from_below_count(4));
        assert_eq!(
            reply,
            "Wordle 589 3/6*\nScore: 250 points\nYou solved above 4 others so far."
        );
    }

    #[test]
    fn test_reply_unsolved_without_stats() {
        let reply = build_reply(&facts(0, false), &ComparisonStats::default());
        assert_eq!(reply, "Wordle 589 X/6\nScore: 250 points");
    }
}
