//! In-memory [`ScoreStore`] implementation for tests and dry runs.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock`. Global scores hold
//! one row per user and puzzle, replaced on rewrite. Top-score writes are
//! kept in order so callers can count side effects.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    ranks_below, AnalyzedPost, ComparisonQuery, ComparisonStats, ScoreRecord, ScoreStore,
    UserProfile,
};

/// In-memory store for testing and dry runs.
#[derive(Default)]
pub struct InMemoryStore {
    analyzed: RwLock<HashMap<String, AnalyzedPost>>,
    global_scores: RwLock<Vec<(String, ScoreRecord)>>,
    top_scores: RwLock<Vec<(String, ScoreRecord)>>,
    profiles: RwLock<HashMap<String, UserProfile>>,
    heartbeats: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `post_id` was handled by an earlier process.
    pub fn seed_analyzed(&self, post_id: &str, post: AnalyzedPost) {
        self.analyzed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(post_id.to_string(), post);
    }

    /// Seed a global score without going through the processor.
    ///
    /// Replaces any existing row for the same user and puzzle.
    pub fn seed_global_score(&self, user_key: &str, record: ScoreRecord) {
        let mut scores = self
            .global_scores
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let existing = scores
            .iter_mut()
            .find(|(key, r)| key == user_key && r.puzzle_number == record.puzzle_number);
        match existing {
            Some((_, row)) => *row = record,
            None => scores.push((user_key.to_string(), record)),
        }
    }

    pub fn global_scores(&self) -> Vec<(String, ScoreRecord)> {
        self.global_scores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn top_scores(&self) -> Vec<(String, ScoreRecord)> {
        self.top_scores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn analyzed_post(&self, post_id: &str) -> Option<AnalyzedPost> {
        self.analyzed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(post_id)
            .cloned()
    }

    pub fn profile(&self, user_key: &str) -> Option<UserProfile> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_key)
            .cloned()
    }

    pub fn heartbeat(&self, user_key: &str) -> Option<DateTime<Utc>> {
        self.heartbeats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_key)
            .copied()
    }
}

#[async_trait]
impl ScoreStore for InMemoryStore {
    async fn has_analyzed_post(&self, post_id: &str) -> Result<bool> {
        Ok(self
            .analyzed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(post_id))
    }

    async fn write_global_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()> {
        self.seed_global_score(user_key, record.clone());
        Ok(())
    }

    async fn write_top_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()> {
        self.top_scores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_key.to_string(), record.clone()));
        Ok(())
    }

    async fn write_analyzed_post(&self, post_id: &str, post: &AnalyzedPost) -> Result<()> {
        self.seed_analyzed(post_id, post.clone());
        Ok(())
    }

    async fn write_user_profile(&self, profile: &UserProfile) -> Result<()> {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.user_key.clone(), profile.clone());
        Ok(())
    }

    async fn write_user_heartbeat(&self, user_key: &str, seen_at: DateTime<Utc>) -> Result<()> {
        self.heartbeats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_key.to_string(), seen_at);
        Ok(())
    }

    async fn get_comparison_stats(&self, query: &ComparisonQuery) -> Result<ComparisonStats> {
        let scores = self.global_scores.read().unwrap_or_else(PoisonError::into_inner);
        let below: HashSet<&str> = scores
            .iter()
            .filter(|(_, r)| r.puzzle_number == query.puzzle_number)
            .filter(|(_, r)| r.created_at <= query.as_of)
            .filter(|(_, r)| ranks_below(r.solved_row, query.solved_row))
            .map(|(key, _)| key.as_str())
            .collect();
        Ok(ComparisonStats::from_below_count(below.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn record(puzzle_number: u32, solved_row: u32) -> ScoreRecord {
        ScoreRecord {
            puzzle_number,
            score: 100,
            solved_row,
            display_name: "someone".to_string(),
            url: String::new(),
            hard_mode: false,
            source: Source::Twitter,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_comparison_counts_distinct_worse_players() {
        let store = InMemoryStore::new();
        store.seed_global_score("twitter-1", record(589, 5));
        store.seed_global_score("twitter-1", record(589, 6));
        store.seed_global_score("twitter-2", record(589, 0));
        store.seed_global_score("twitter-3", record(589, 2));
        store.seed_global_score("twitter-4", record(590, 6));

        let stats = store
            .get_comparison_stats(&ComparisonQuery {
                solved_row: 3,
                puzzle_number: 589,
                as_of: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(stats.above_count_text, "2 others");
    }

    #[tokio::test]
    async fn test_global_score_is_one_row_per_user_and_puzzle() {
        let store = InMemoryStore::new();
        store.write_global_score("twitter-1", &record(589, 6)).await.unwrap();
        store.write_global_score("twitter-1", &record(589, 3)).await.unwrap();
        store.write_global_score("twitter-1", &record(590, 4)).await.unwrap();

        let scores = store.global_scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].1.solved_row, 3);

        let stats = store
            .get_comparison_stats(&ComparisonQuery {
                solved_row: 3,
                puzzle_number: 589,
                as_of: Utc::now(),
            })
            .await
            .unwrap();
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_comparison_ignores_later_scores() {
        let store = InMemoryStore::new();
        store.seed_global_score("twitter-1", record(589, 6));

        let stats = store
            .get_comparison_stats(&ComparisonQuery {
                solved_row: 3,
                puzzle_number: 589,
                as_of: DateTime::from_timestamp(1_600_000_000, 0).unwrap(),
            })
            .await
            .unwrap();
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_analyzed_post_is_durable_duplicate() {
        let store = InMemoryStore::new();
        assert!(!store.has_analyzed_post("p1").await.unwrap());
        store
            .write_analyzed_post(
                "p1",
                &AnalyzedPost {
                    user_key: "twitter-1".to_string(),
                    puzzle_number: 589,
                    score: 100,
                    solved_row: 4,
                    is_growth_post: false,
                    source: Source::Twitter,
                    url: String::new(),
                    analyzed_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert!(store.has_analyzed_post("p1").await.unwrap());
    }
}
