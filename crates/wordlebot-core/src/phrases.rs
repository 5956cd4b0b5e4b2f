//! Vocabulary used to read accessibility alt-text grids.
//!
//! Alt-text grids come from third-party share tools whose wording can
//! change. The phrases live in a [`PhraseTable`] so a new wording can be
//! added as a new table without touching the parser.

/// Phrase set for one revision of the alt-text wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseTable {
    /// Identifies this revision of the wording.
    pub version: &'static str,
    /// Whole row correct.
    pub won: &'static str,
    /// Named positions are correct.
    pub perfect: &'static str,
    /// Named positions are present elsewhere (used with `perfect`).
    pub wrong_place: &'static str,
    /// Named positions are present elsewhere (no `perfect` on the line).
    pub but_wrong_place: &'static str,
    /// Every letter present, none in place.
    pub wrong_order: &'static str,
    /// Word separating correct positions from misplaced ones.
    pub split_word: &'static str,
}

/// Wording produced by the share tool as of its first release.
pub const V1: PhraseTable = PhraseTable {
    version: "v1",
    won: "Won",
    perfect: "perfect",
    wrong_place: "in the wrong place",
    but_wrong_place: "but in the wrong place",
    wrong_order: "all the correct letters but in the wrong order",
    split_word: "but",
};

impl PhraseTable {
    /// The table used when a caller does not pick one.
    pub fn current() -> &'static PhraseTable {
        &V1
    }
}

impl Default for PhraseTable {
    fn default() -> Self {
        V1
    }
}
