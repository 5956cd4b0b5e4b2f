//! SQLite-backed [`ScoreStore`] implementation.
//!
//! Maps each [`ScoreStore`] operation onto the tables created by
//! [`migrate`](crate::migrate). Timestamps are stored as Unix seconds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use wordlebot_core::models::Source;
use wordlebot_core::store::{
    AnalyzedPost, ComparisonQuery, ComparisonStats, ScoreRecord, ScoreStore, UserProfile,
};

/// SQLite implementation of the [`ScoreStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

/// One row of a puzzle leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub user_key: String,
    pub display_name: String,
    pub score: u32,
    pub solved_row: u32,
    pub hard_mode: bool,
    pub source: Source,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Highest global scores for `puzzle_number`, best first.
    pub async fn leaderboard(&self, puzzle_number: u32, limit: i64) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r#"
            SELECT user_key, display_name, score, solved_row, hard_mode, source
            FROM global_scores
            WHERE puzzle_number = ?
            ORDER BY score DESC, created_at ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(puzzle_number))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<LeaderboardRow> {
                let source: String = row.get("source");
                Ok(LeaderboardRow {
                    user_key: row.get("user_key"),
                    display_name: row.get("display_name"),
                    score: to_u32(row.get("score"))?,
                    solved_row: to_u32(row.get("solved_row"))?,
                    hard_mode: row.get::<i64, _>("hard_mode") != 0,
                    source: source.parse()?,
                })
            })
            .collect()
    }

    /// Number of rows in the analyzed-posts table.
    pub async fn analyzed_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyzed_posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("stored value out of range: {}", value))
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn has_analyzed_post(&self, post_id: &str) -> Result<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM analyzed_posts WHERE post_id = ?")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found)
    }

    async fn write_global_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO global_scores (user_key, puzzle_number, score, solved_row, display_name,
                                       url, hard_mode, source, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_key, puzzle_number) DO UPDATE SET
                score = excluded.score,
                solved_row = excluded.solved_row,
                display_name = excluded.display_name,
                url = excluded.url,
                hard_mode = excluded.hard_mode,
                source = excluded.source,
                created_at = excluded.created_at
            "#,
        )
        .bind(user_key)
        .bind(i64::from(record.puzzle_number))
        .bind(i64::from(record.score))
        .bind(i64::from(record.solved_row))
        .bind(&record.display_name)
        .bind(&record.url)
        .bind(record.hard_mode)
        .bind(record.source.as_str())
        .bind(record.created_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_top_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()> {
        let day = record.created_at.format("%Y-%m-%d").to_string();
        sqlx::query(
            r#"
            INSERT INTO top_scores (day, user_key, puzzle_number, score, solved_row,
                                    display_name, url, hard_mode, source, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(day, user_key) DO UPDATE SET
                puzzle_number = excluded.puzzle_number,
                score = excluded.score,
                solved_row = excluded.solved_row,
                display_name = excluded.display_name,
                url = excluded.url,
                hard_mode = excluded.hard_mode,
                source = excluded.source,
                created_at = excluded.created_at
            WHERE excluded.score > top_scores.score
            "#,
        )
        .bind(day)
        .bind(user_key)
        .bind(i64::from(record.puzzle_number))
        .bind(i64::from(record.score))
        .bind(i64::from(record.solved_row))
        .bind(&record.display_name)
        .bind(&record.url)
        .bind(record.hard_mode)
        .bind(record.source.as_str())
        .bind(record.created_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_analyzed_post(&self, post_id: &str, post: &AnalyzedPost) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO analyzed_posts (post_id, user_key, puzzle_number, score,
                                                  solved_row, is_growth_post, source, url,
                                                  analyzed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post_id)
        .bind(&post.user_key)
        .bind(i64::from(post.puzzle_number))
        .bind(i64::from(post.score))
        .bind(i64::from(post.solved_row))
        .bind(post.is_growth_post)
        .bind(post.source.as_str())
        .bind(&post.url)
        .bind(post.analyzed_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_user_profile(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_key, screen_name, photo_url, source)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_key) DO UPDATE SET
                screen_name = excluded.screen_name,
                photo_url = excluded.photo_url,
                source = excluded.source
            "#,
        )
        .bind(&profile.user_key)
        .bind(&profile.screen_name)
        .bind(&profile.photo_url)
        .bind(profile.source.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_user_heartbeat(&self, user_key: &str, seen_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_heartbeats (user_key, last_seen) VALUES (?, ?)
            ON CONFLICT(user_key) DO UPDATE SET last_seen = excluded.last_seen
            "#,
        )
        .bind(user_key)
        .bind(seen_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comparison_stats(&self, query: &ComparisonQuery) -> Result<ComparisonStats> {
        if query.solved_row == 0 {
            return Ok(ComparisonStats::default());
        }
        let below: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT user_key) FROM global_scores
            WHERE puzzle_number = ?
              AND created_at <= ?
              AND (solved_row = 0 OR solved_row > ?)
            "#,
        )
        .bind(i64::from(query.puzzle_number))
        .bind(query.as_of.timestamp())
        .bind(i64::from(query.solved_row))
        .fetch_one(&self.pool)
        .await?;
        Ok(ComparisonStats::from_below_count(below.max(0) as u64))
    }
}
