//! Storage abstraction for wordlebot.
//!
//! The [`ScoreStore`] trait covers every read and write the processor makes,
//! so the durable backend (SQLite, in-memory, a hosted database) is
//! pluggable. The store also acts as the cross-process duplicate oracle via
//! [`has_analyzed_post`](ScoreStore::has_analyzed_post).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Source;

/// One scored game, as written to the global and daily score tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub puzzle_number: u32,
    pub score: u32,
    pub solved_row: u32,
    pub display_name: String,
    pub url: String,
    pub hard_mode: bool,
    pub source: Source,
    pub created_at: DateTime<Utc>,
}

/// Marker that a post has been fully handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedPost {
    pub user_key: String,
    pub puzzle_number: u32,
    pub score: u32,
    pub solved_row: u32,
    pub is_growth_post: bool,
    pub source: Source,
    pub url: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Display details for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_key: String,
    pub screen_name: String,
    pub photo_url: String,
    pub source: Source,
}

/// Input to [`ScoreStore::get_comparison_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonQuery {
    pub solved_row: u32,
    pub puzzle_number: u32,
    pub as_of: DateTime<Utc>,
}

/// Phrasing pieces for "You solved above N others".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonStats {
    pub label_prefix: String,
    pub above_count_text: String,
}

impl ComparisonStats {
    /// Phrase a count of players who did worse. Zero yields empty strings.
    pub fn from_below_count(below: u64) -> Self {
        let above_count_text = match below {
            0 => return Self::default(),
            1 => "1 other".to_string(),
            n => format!("{} others", n),
        };
        Self {
            label_prefix: "You solved above".to_string(),
            above_count_text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.above_count_text.is_empty()
    }
}

/// Whether a stored result did worse than `solved_row`.
///
/// Unsolved games (row 0) lose to every solve.
pub fn ranks_below(stored_row: u32, solved_row: u32) -> bool {
    solved_row != 0 && (stored_row == 0 || stored_row > solved_row)
}

/// Abstract storage backend for wordlebot.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`has_analyzed_post`](ScoreStore::has_analyzed_post) | Durable duplicate check |
/// | [`write_global_score`](ScoreStore::write_global_score) | Running score table |
/// | [`write_top_score`](ScoreStore::write_top_score) | Today's scores (caller checks the day) |
/// | [`write_analyzed_post`](ScoreStore::write_analyzed_post) | Mark a post handled |
/// | [`write_user_profile`](ScoreStore::write_user_profile) | Display name and photo |
/// | [`write_user_heartbeat`](ScoreStore::write_user_heartbeat) | Last-seen time |
/// | [`get_comparison_stats`](ScoreStore::get_comparison_stats) | "Solved above N others" |
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn has_analyzed_post(&self, post_id: &str) -> Result<bool>;

    async fn write_global_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()>;

    async fn write_top_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()>;

    async fn write_analyzed_post(&self, post_id: &str, post: &AnalyzedPost) -> Result<()>;

    async fn write_user_profile(&self, profile: &UserProfile) -> Result<()>;

    async fn write_user_heartbeat(&self, user_key: &str, seen_at: DateTime<Utc>) -> Result<()>;

    /// Count same-puzzle players who did worse than `query.solved_row`.
    async fn get_comparison_stats(&self, query: &ComparisonQuery) -> Result<ComparisonStats>;
}
