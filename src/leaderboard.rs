use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

pub async fn run_top(config: &Config, puzzle_number: u32, limit: i64) -> Result<()> {
    if limit < 1 {
        bail!("--limit must be >= 1");
    }

    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    let store = SqliteStore::new(pool.clone());
    let rows = store.leaderboard(puzzle_number, limit).await?;

    if rows.is_empty() {
        println!("No scores for Wordle {}.", puzzle_number);
    } else {
        println!("Wordle {}", puzzle_number);
        for (i, row) in rows.iter().enumerate() {
            let solved = match row.solved_row {
                0 => "X".to_string(),
                n => n.to_string(),
            };
            let star = if row.hard_mode { "*" } else { "" };
            println!(
                "{:>3}. {:<20} {:>4}  {}/6{}  [{}]",
                i + 1,
                row.display_name,
                row.score,
                solved,
                star,
                row.source
            );
        }
    }

    pool.close().await;
    Ok(())
}
