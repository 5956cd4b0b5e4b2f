//! Core data types shared by the parsers, the scorer, and the processor.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single grid square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellScore {
    Wrong = 0,
    Partial = 1,
    Correct = 2,
}

impl CellScore {
    /// Numeric weight used by the scorer.
    pub fn value(self) -> u32 {
        self as u32
    }
}

/// Flat sequence of cells, five per row, top to bottom.
pub type Matrix = Vec<CellScore>;

/// Number of cells in one grid row.
pub const ROW_WIDTH: usize = 5;

/// Network a post was observed on. Only used for labels and storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Twitter,
    Mastodon,
    Bluesky,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Twitter => "twitter",
            Source::Mastodon => "mastodon",
            Source::Bluesky => "bluesky",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "twitter" => Ok(Source::Twitter),
            "mastodon" => Ok(Source::Mastodon),
            "bluesky" => Ok(Source::Bluesky),
            other => bail!(
                "Unknown source: '{}'. Must be twitter, mastodon, or bluesky.",
                other
            ),
        }
    }
}

/// Puzzle number plus hard-mode flag. A puzzle number of 0 means none was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleIdentity {
    pub puzzle_number: u32,
    pub hard_mode: bool,
}

/// Profile picture attached to a post's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
}

/// Looks up the post that a reply was made to.
///
/// Supplied per post by the transport adapter that observed it. The
/// processor calls it at most once, and only when the post itself carries
/// no usable result.
#[async_trait]
pub trait ParentFetcher: Send + Sync {
    /// Return the parent post, or `None` if there is no parent.
    async fn fetch_parent(&self) -> Result<Option<PostInput>>;
}

/// Shareable handle around a [`ParentFetcher`].
#[derive(Clone)]
pub struct ParentLookup(Arc<dyn ParentFetcher>);

impl ParentLookup {
    pub fn new(fetcher: impl ParentFetcher + 'static) -> Self {
        Self(Arc::new(fetcher))
    }

    pub async fn fetch(&self) -> Result<Option<PostInput>> {
        self.0.fetch_parent().await
    }
}

impl fmt::Debug for ParentLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParentLookup(..)")
    }
}

/// Everything the processor needs to know about one observed post.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub text: String,
    pub alt_texts: Vec<String>,
    pub post_id: String,
    pub author_id: String,
    pub screen_name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub source: Source,
    pub is_growth_post: bool,
    pub photo: Option<Photo>,
    pub parent: Option<ParentLookup>,
}

impl PostInput {
    /// Text candidates in resolution order: the post body, then each alt-text.
    pub fn candidates(&self) -> Vec<&str> {
        std::iter::once(self.text.as_str())
            .chain(self.alt_texts.iter().map(String::as_str))
            .collect()
    }

    /// Key for per-user rows, unique across networks.
    pub fn user_key(&self) -> String {
        format!("{}-{}", self.source, self.author_id)
    }
}

/// A post that was scored and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPost {
    pub post_id: String,
    pub reply_text: String,
    pub should_reply: bool,
    pub score: u32,
    pub puzzle_number: u32,
    pub solved_row: u32,
    pub hard_mode: bool,
}
