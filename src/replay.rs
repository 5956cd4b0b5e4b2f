//! Feed recorded posts through the processor.
//!
//! Reads a JSON-lines file of [`ReplayPost`]s, gives each post a parent
//! lookup resolved against the same file, and processes them in file
//! order. Useful for backfills and for checking scoring changes against
//! real posts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use wordlebot_core::models::{ParentFetcher, ParentLookup, Photo, PostInput, Source};
use wordlebot_core::processor::{PostProcessor, ProcessorOptions};
use wordlebot_core::store::memory::InMemoryStore;
use wordlebot_core::store::ScoreStore;
use wordlebot_core::tracker::ProcessingTracker;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// One recorded post, as stored in a replay file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayPost {
    pub post_id: String,
    pub author_id: String,
    pub screen_name: String,
    #[serde(default)]
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub source: Source,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub alt_texts: Vec<String>,
    #[serde(default)]
    pub is_growth_post: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Counts reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub processed: usize,
    pub scored: usize,
    pub skipped: usize,
}

/// Parse JSON lines; blank lines and `#` comments are ignored.
pub fn parse_replay(content: &str) -> Result<Vec<ReplayPost>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid post on line {}", i + 1))
        })
        .collect()
}

pub fn load_replay(path: &Path) -> Result<Vec<ReplayPost>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay file: {}", path.display()))?;
    parse_replay(&content)
}

/// Resolves a parent id against the posts of one replay file.
struct FileParentFetcher {
    posts: Arc<HashMap<String, ReplayPost>>,
    parent_id: String,
}

#[async_trait]
impl ParentFetcher for FileParentFetcher {
    async fn fetch_parent(&self) -> Result<Option<PostInput>> {
        let parent = self.posts.get(&self.parent_id);
        if parent.is_none() {
            warn!(parent_id = %self.parent_id, "parent post not in replay file");
        }
        Ok(parent.map(|p| to_input(p, &self.posts)))
    }
}

fn to_input(post: &ReplayPost, posts: &Arc<HashMap<String, ReplayPost>>) -> PostInput {
    PostInput {
        text: post.text.clone(),
        alt_texts: post.alt_texts.clone(),
        post_id: post.post_id.clone(),
        author_id: post.author_id.clone(),
        screen_name: post.screen_name.clone(),
        url: post.url.clone(),
        created_at: post.created_at,
        source: post.source,
        is_growth_post: post.is_growth_post,
        photo: post.photo_url.as_ref().map(|url| Photo { url: url.clone() }),
        parent: post.parent_id.as_ref().map(|parent_id| {
            ParentLookup::new(FileParentFetcher {
                posts: Arc::clone(posts),
                parent_id: parent_id.clone(),
            })
        }),
    }
}

/// Build processor inputs, in file order, with parent lookups wired up.
pub fn to_inputs(posts: &[ReplayPost]) -> Vec<PostInput> {
    let by_id: Arc<HashMap<String, ReplayPost>> = Arc::new(
        posts
            .iter()
            .map(|p| (p.post_id.clone(), p.clone()))
            .collect(),
    );
    posts.iter().map(|p| to_input(p, &by_id)).collect()
}

/// Process `inputs` in order, printing each reply.
pub async fn replay_inputs<S: ScoreStore>(
    processor: &PostProcessor<S>,
    inputs: Vec<PostInput>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for input in inputs {
        let post_id = input.post_id.clone();
        summary.processed += 1;
        match processor.process(input).await {
            Some(result) => {
                summary.scored += 1;
                let via = if result.post_id == post_id {
                    String::new()
                } else {
                    format!(" (via {})", post_id)
                };
                println!("post {}{}: {} points", result.post_id, via, result.score);
                if result.should_reply {
                    for line in result.reply_text.lines() {
                        println!("  | {}", line);
                    }
                }
            }
            None => summary.skipped += 1,
        }
    }
    summary
}

pub async fn run_replay(config: &Config, path: &Path, dry_run: bool) -> Result<ReplaySummary> {
    let posts = load_replay(path)?;
    let inputs = to_inputs(&posts);
    let options = ProcessorOptions {
        parent_fallback: config.processing.parent_fallback,
    };

    let summary = if dry_run {
        let store = Arc::new(InMemoryStore::new());
        let processor =
            PostProcessor::new(store, ProcessingTracker::new()).with_options(options);
        replay_inputs(&processor, inputs).await
    } else {
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;
        let store = Arc::new(SqliteStore::new(pool.clone()));
        let processor =
            PostProcessor::new(store, ProcessingTracker::new()).with_options(options);
        let summary = replay_inputs(&processor, inputs).await;
        pool.close().await;
        summary
    };

    let mode = if dry_run { " (dry-run)" } else { "" };
    println!("replay {}{}", path.display(), mode);
    println!("  processed: {}", summary.processed);
    println!("  scored: {}", summary.scored);
    println!("  skipped: {}", summary.skipped);
    println!("ok");

    Ok(summary)
}
