use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index. Safe to run repeatedly.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Running score per user per puzzle
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS global_scores (
            user_key TEXT NOT NULL,
            puzzle_number INTEGER NOT NULL,
            score INTEGER NOT NULL,
            solved_row INTEGER NOT NULL,
            display_name TEXT NOT NULL,
            url TEXT NOT NULL,
            hard_mode INTEGER NOT NULL DEFAULT 0,
            source TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (user_key, puzzle_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Best score per user per UTC day
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS top_scores (
            day TEXT NOT NULL,
            user_key TEXT NOT NULL,
            puzzle_number INTEGER NOT NULL,
            score INTEGER NOT NULL,
            solved_row INTEGER NOT NULL,
            display_name TEXT NOT NULL,
            url TEXT NOT NULL,
            hard_mode INTEGER NOT NULL DEFAULT 0,
            source TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (day, user_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyzed_posts (
            post_id TEXT PRIMARY KEY,
            user_key TEXT NOT NULL,
            puzzle_number INTEGER NOT NULL,
            score INTEGER NOT NULL,
            solved_row INTEGER NOT NULL,
            is_growth_post INTEGER NOT NULL DEFAULT 0,
            source TEXT NOT NULL,
            url TEXT NOT NULL,
            analyzed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            user_key TEXT PRIMARY KEY,
            screen_name TEXT NOT NULL,
            photo_url TEXT NOT NULL,
            source TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_heartbeats (
            user_key TEXT PRIMARY KEY,
            last_seen INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_global_scores_puzzle ON global_scores(puzzle_number, solved_row)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_top_scores_day ON top_scores(day, score DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
