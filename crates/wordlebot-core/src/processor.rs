//! Per-post processing: dedup, extraction, scoring, persistence, reply.
//!
//! Each post id is handled at most once per process. The flow is:
//!
//! ```text
//! try_begin(id) ──refused──▶ None (local duplicate)
//!      │
//! has_analyzed_post ──yes──▶ None (handled by an earlier run)
//!      │
//! analyze text + alt-texts
//!      ├── valid ──▶ write scores, heartbeat, stats ──▶ ProcessedPost
//!      └── invalid ──▶ parent lookup (original, non-growth posts only)
//!                          └──▶ same flow for the parent, role = Parent
//! ```
//!
//! Errors from the store or the parent lookup are logged and turn into
//! `None`. The id is marked done on every path by a [`ProcessingGuard`].
//!
//! [`ProcessingGuard`]: crate::tracker::ProcessingGuard

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::matrix::resolve_matrix;
use crate::metadata::{is_hard_mode_in, puzzle_number_in};
use crate::models::{Matrix, PostInput, ProcessedPost, PuzzleIdentity};
use crate::reply::{build_reply, ReplyFacts};
use crate::scoring::{calculate_score, is_valid, solved_row};
use crate::store::{AnalyzedPost, ComparisonQuery, ScoreRecord, ScoreStore, UserProfile};
use crate::tracker::ProcessingTracker;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Both instants fall on the same UTC calendar day.
pub fn is_same_utc_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Look at the replied-to post when a post has no result of its own.
    pub parent_fallback: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            parent_fallback: true,
        }
    }
}

/// Whether a post was observed directly or reached through a child's fallback.
///
/// A parent never falls back further, which caps the lookup depth at two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRole {
    Original,
    Parent,
}

/// Everything extracted from a post's text candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub matrix: Matrix,
    pub identity: PuzzleIdentity,
    pub solved_row: u32,
}

impl Analysis {
    pub fn is_valid(&self) -> bool {
        is_valid(
            &self.matrix,
            Some(self.identity.puzzle_number),
            Some(self.solved_row),
        )
    }
}

/// Extract the grid and puzzle identity from `candidates` (primary text first).
pub fn analyze<S: AsRef<str>>(candidates: &[S]) -> Analysis {
    let matrix = resolve_matrix(candidates);
    let solved_row = solved_row(&matrix);
    Analysis {
        matrix,
        identity: PuzzleIdentity {
            puzzle_number: puzzle_number_in(candidates),
            hard_mode: is_hard_mode_in(candidates),
        },
        solved_row,
    }
}

type ProcessFuture<'a> = Pin<Box<dyn Future<Output = Option<ProcessedPost>> + Send + 'a>>;

/// Runs the per-post state machine against a [`ScoreStore`].
pub struct PostProcessor<S: ScoreStore> {
    store: Arc<S>,
    tracker: ProcessingTracker,
    clock: Arc<dyn Clock>,
    options: ProcessorOptions,
}

impl<S: ScoreStore> PostProcessor<S> {
    pub fn new(store: Arc<S>, tracker: ProcessingTracker) -> Self {
        Self {
            store,
            tracker,
            clock: Arc::new(SystemClock),
            options: ProcessorOptions::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_options(mut self, options: ProcessorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn tracker(&self) -> &ProcessingTracker {
        &self.tracker
    }

    /// Handle one observed post. Returns `None` for duplicates, posts
    /// without a valid result, and failures.
    pub async fn process(&self, input: PostInput) -> Option<ProcessedPost> {
        self.process_as(input, PostRole::Original).await
    }

    fn process_as(&self, input: PostInput, role: PostRole) -> ProcessFuture<'_> {
        Box::pin(async move {
            let Some(guard) = self.tracker.begin(&input.post_id) else {
                debug!(post_id = %input.post_id, "post already in flight or done");
                return None;
            };

            match self.handle(input, role).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let message = format!("{:#}", e);
                    error!(post_id = %guard.post_id(), error = %message, "failed to process post");
                    None
                }
            }
        })
    }

    async fn handle(&self, input: PostInput, role: PostRole) -> Result<Option<ProcessedPost>> {
        let already = self
            .store
            .has_analyzed_post(&input.post_id)
            .await
            .context("checking for an analyzed post")?;
        if already {
            info!(post_id = %input.post_id, "post was analyzed by an earlier run");
            return Ok(None);
        }

        let analysis = analyze(&input.candidates());
        if analysis.is_valid() {
            return self.record(&input, &analysis).await.map(Some);
        }
        debug!(
            post_id = %input.post_id,
            cells = analysis.matrix.len(),
            puzzle = analysis.identity.puzzle_number,
            "no valid result in post"
        );

        if role == PostRole::Parent || input.is_growth_post || !self.options.parent_fallback {
            return Ok(None);
        }
        let Some(lookup) = input.parent.as_ref() else {
            return Ok(None);
        };

        let parent = lookup.fetch().await.context("fetching parent post")?;
        match parent {
            Some(parent) => {
                info!(post_id = %input.post_id, parent_id = %parent.post_id, "trying parent post");
                Ok(self.process_as(parent, PostRole::Parent).await)
            }
            None => Ok(None),
        }
    }

    async fn record(&self, input: &PostInput, analysis: &Analysis) -> Result<ProcessedPost> {
        let PuzzleIdentity {
            puzzle_number,
            hard_mode,
        } = analysis.identity;
        let solved_row = analysis.solved_row;
        let score = calculate_score(&analysis.matrix, hard_mode).final_score;
        let user_key = input.user_key();
        let now = self.clock.now();

        let record = ScoreRecord {
            puzzle_number,
            score,
            solved_row,
            display_name: input.screen_name.clone(),
            url: input.url.clone(),
            hard_mode,
            source: input.source,
            created_at: input.created_at,
        };

        self.store
            .write_global_score(&user_key, &record)
            .await
            .context("writing global score")?;

        if is_same_utc_day(input.created_at, now) {
            self.store
                .write_top_score(&user_key, &record)
                .await
                .context("writing top score")?;
        }

        let analyzed = AnalyzedPost {
            user_key: user_key.clone(),
            puzzle_number,
            score,
            solved_row,
            is_growth_post: input.is_growth_post,
            source: input.source,
            url: input.url.clone(),
            analyzed_at: now,
        };
        self.store
            .write_analyzed_post(&input.post_id, &analyzed)
            .await
            .context("writing analyzed post")?;

        if let Some(photo) = &input.photo {
            let profile = UserProfile {
                user_key: user_key.clone(),
                screen_name: input.screen_name.clone(),
                photo_url: photo.url.clone(),
                source: input.source,
            };
            self.store
                .write_user_profile(&profile)
                .await
                .context("writing user profile")?;
        }

        self.store
            .write_user_heartbeat(&user_key, now)
            .await
            .context("writing user heartbeat")?;

        let stats = self
            .store
            .get_comparison_stats(&ComparisonQuery {
                solved_row,
                puzzle_number,
                as_of: input.created_at,
            })
            .await
            .context("reading comparison stats")?;

        let reply_text = build_reply(
            &ReplyFacts {
                puzzle_number,
                solved_row,
                hard_mode,
                score,
            },
            &stats,
        );

        info!(post_id = %input.post_id, puzzle = puzzle_number, score, solved_row, "scored post");

        Ok(ProcessedPost {
            post_id: input.post_id.clone(),
            reply_text,
            should_reply: !input.is_growth_post,
            score,
            puzzle_number,
            solved_row,
            hard_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParentFetcher, ParentLookup, Photo, Source};
    use crate::store::memory::InMemoryStore;
    use crate::store::ComparisonStats;
    use crate::tracker::PostState;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const GRID_3: &str = "Wordle 589 3/6*\n\n⬛🟨⬛⬛⬛\n⬛⬛🟩🟨⬛\n🟩🟩🟩🟩🟩";

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn post(id: &str, text: &str) -> PostInput {
        PostInput {
            text: text.to_string(),
            alt_texts: Vec::new(),
            post_id: id.to_string(),
            author_id: format!("author-{}", id),
            screen_name: format!("user_{}", id),
            url: format!("https://example.com/{}", id),
            created_at: ts(1_700_000_000),
            source: Source::Twitter,
            is_growth_post: false,
            photo: None,
            parent: None,
        }
    }

    fn processor<S: ScoreStore>(store: Arc<S>) -> PostProcessor<S> {
        PostProcessor::new(store, ProcessingTracker::new())
            .with_clock(FixedClock(ts(1_700_000_000 + 60)))
    }

    struct StaticParent {
        parent: Option<PostInput>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ParentFetcher for StaticParent {
        async fn fetch_parent(&self) -> Result<Option<PostInput>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("parent lookup timed out");
            }
            Ok(self.parent.clone())
        }
    }

    fn with_parent(
        mut child: PostInput,
        parent: Option<PostInput>,
        fail: bool,
    ) -> (PostInput, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        child.parent = Some(ParentLookup::new(StaticParent {
            parent,
            calls: calls.clone(),
            fail,
        }));
        (child, calls)
    }

    /// Delegates to an [`InMemoryStore`], optionally slowly or failing writes.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        delay: Option<Duration>,
        fail_writes: bool,
    }

    #[async_trait]
    impl ScoreStore for FlakyStore {
        async fn has_analyzed_post(&self, post_id: &str) -> Result<bool> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.has_analyzed_post(post_id).await
        }

        async fn write_global_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()> {
            if self.fail_writes {
                bail!("database is locked");
            }
            self.inner.write_global_score(user_key, record).await
        }

        async fn write_top_score(&self, user_key: &str, record: &ScoreRecord) -> Result<()> {
            self.inner.write_top_score(user_key, record).await
        }

        async fn write_analyzed_post(&self, post_id: &str, post: &AnalyzedPost) -> Result<()> {
            self.inner.write_analyzed_post(post_id, post).await
        }

        async fn write_user_profile(&self, profile: &UserProfile) -> Result<()> {
            self.inner.write_user_profile(profile).await
        }

        async fn write_user_heartbeat(&self, user_key: &str, seen_at: DateTime<Utc>) -> Result<()> {
            self.inner.write_user_heartbeat(user_key, seen_at).await
        }

        async fn get_comparison_stats(&self, query: &ComparisonQuery) -> Result<ComparisonStats> {
            self.inner.get_comparison_stats(query).await
        }
    }

    #[tokio::test]
    async fn test_valid_post_is_scored_and_persisted() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());

        let result = p.process(post("p1", GRID_3)).await.unwrap();
        assert_eq!(result.post_id, "p1");
        assert_eq!(result.puzzle_number, 589);
        assert_eq!(result.solved_row, 3);
        assert!(result.hard_mode);
        assert!(result.should_reply);
        assert_eq!(result.score, calculate_score(&analyze(&[GRID_3]).matrix, true).final_score);
        assert!(result.reply_text.starts_with("Wordle 589 3/6*"));

        assert_eq!(store.global_scores().len(), 1);
        assert_eq!(store.top_scores().len(), 1);
        assert_eq!(store.analyzed_post("p1").unwrap().score, result.score);
        assert!(store.heartbeat("twitter-author-p1").is_some());
        assert_eq!(p.tracker().state("p1"), PostState::Done);
    }

    #[tokio::test]
    async fn test_second_invocation_is_a_duplicate() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());

        assert!(p.process(post("p1", GRID_3)).await.is_some());
        assert!(p.process(post("p1", GRID_3)).await.is_none());
        assert_eq!(store.global_scores().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_invocations_write_once() {
        let store = Arc::new(FlakyStore {
            delay: Some(Duration::from_millis(20)),
            ..FlakyStore::default()
        });
        let p = processor(store.clone());

        let (a, b) = tokio::join!(p.process(post("p1", GRID_3)), p.process(post("p1", GRID_3)));
        assert_eq!(a.is_some() as u8 + b.is_some() as u8, 1);
        assert_eq!(store.inner.global_scores().len(), 1);
    }

    #[tokio::test]
    async fn test_durable_duplicate_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_analyzed(
            "p1",
            AnalyzedPost {
                user_key: "twitter-author-p1".to_string(),
                puzzle_number: 589,
                score: 1,
                solved_row: 3,
                is_growth_post: false,
                source: Source::Twitter,
                url: String::new(),
                analyzed_at: ts(0),
            },
        );
        let p = processor(store.clone());

        assert!(p.process(post("p1", GRID_3)).await.is_none());
        assert!(store.global_scores().is_empty());
        assert_eq!(p.tracker().state("p1"), PostState::Done);
    }

    #[tokio::test]
    async fn test_alt_text_result() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());
        let mut input = post("p1", "Wordle 1,234 2/6");
        input.alt_texts = vec!["Line 1: 1 and 2 perfect\nLine 2: Won!".to_string()];

        let result = p.process(input).await.unwrap();
        assert_eq!(result.puzzle_number, 1234);
        assert_eq!(result.solved_row, 2);
        assert!(!result.hard_mode);
    }

    #[tokio::test]
    async fn test_parent_fallback_attributes_to_parent() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());
        let (child, calls) = with_parent(
            post("child", "how did I do?"),
            Some(post("parent", GRID_3)),
            false,
        );

        let result = p.process(child).await.unwrap();
        assert_eq!(result.post_id, "parent");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let scores = store.global_scores();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, "twitter-author-parent");
        assert!(store.analyzed_post("child").is_none());
        assert!(store.analyzed_post("parent").is_some());
        assert_eq!(p.tracker().state("child"), PostState::Done);
        assert_eq!(p.tracker().state("parent"), PostState::Done);
    }

    #[tokio::test]
    async fn test_parent_without_result_does_not_recurse() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());
        let (parent, grandparent_calls) =
            with_parent(post("parent", "no grid here"), Some(post("grandparent", GRID_3)), false);
        let (child, calls) = with_parent(post("child", "nor here"), Some(parent), false);

        assert!(p.process(child).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(grandparent_calls.load(Ordering::SeqCst), 0);
        assert!(store.global_scores().is_empty());
    }

    #[tokio::test]
    async fn test_growth_post_skips_parent_and_reply() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());

        let mut growth = post("g1", "no grid");
        growth.is_growth_post = true;
        let (growth, calls) = with_parent(growth, Some(post("parent", GRID_3)), false);
        assert!(p.process(growth).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut scored = post("g2", GRID_3);
        scored.is_growth_post = true;
        let result = p.process(scored).await.unwrap();
        assert!(!result.should_reply);
        assert!(store.analyzed_post("g2").unwrap().is_growth_post);
    }

    #[tokio::test]
    async fn test_parent_fallback_can_be_disabled() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone()).with_options(ProcessorOptions {
            parent_fallback: false,
        });
        let (child, calls) = with_parent(post("child", "?"), Some(post("parent", GRID_3)), false);

        assert!(p.process(child).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parent_lookup_failure_is_no_result() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());
        let (child, calls) = with_parent(post("child", "?"), None, true);

        assert!(p.process(child).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(p.tracker().state("child"), PostState::Done);
    }

    #[tokio::test]
    async fn test_store_failure_marks_done_without_retry() {
        let store = Arc::new(FlakyStore {
            fail_writes: true,
            ..FlakyStore::default()
        });
        let p = processor(store.clone());

        assert!(p.process(post("p1", GRID_3)).await.is_none());
        assert_eq!(p.tracker().state("p1"), PostState::Done);
        assert!(p.process(post("p1", GRID_3)).await.is_none());
        assert!(store.inner.analyzed_post("p1").is_none());
    }

    #[tokio::test]
    async fn test_old_post_skips_top_score() {
        let store = Arc::new(InMemoryStore::new());
        let p = PostProcessor::new(store.clone(), ProcessingTracker::new())
            .with_clock(FixedClock(ts(1_700_000_000 + 3 * 86_400)));

        assert!(p.process(post("p1", GRID_3)).await.is_some());
        assert_eq!(store.global_scores().len(), 1);
        assert!(store.top_scores().is_empty());
    }

    #[tokio::test]
    async fn test_photo_writes_profile() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());
        let mut input = post("p1", GRID_3);
        input.photo = Some(Photo {
            url: "https://example.com/avatar.png".to_string(),
        });

        assert!(p.process(input).await.is_some());
        let profile = store.profile("twitter-author-p1").unwrap();
        assert_eq!(profile.photo_url, "https://example.com/avatar.png");
    }

    #[tokio::test]
    async fn test_missing_puzzle_number_is_invalid() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());

        assert!(p.process(post("p1", "🟩🟩🟩🟩🟩")).await.is_none());
        assert!(store.global_scores().is_empty());
    }

    #[tokio::test]
    async fn test_reply_counts_worse_players() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());

        let slow = "Wordle 589 6/6\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n🟩🟩🟩🟩🟩";
        assert!(p.process(post("slow", slow)).await.is_some());

        let result = p.process(post("fast", GRID_3)).await.unwrap();
        assert!(result.reply_text.ends_with("You solved above 1 other so far."));
    }

    #[tokio::test]
    async fn test_repeat_puzzle_from_same_author_is_not_compared_to_itself() {
        let store = Arc::new(InMemoryStore::new());
        let p = processor(store.clone());

        let slow = "Wordle 589 6/6\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n⬛⬛⬛⬛⬛\n🟩🟩🟩🟩🟩";
        let mut first = post("a", slow);
        first.author_id = "1".to_string();
        let mut second = post("b", GRID_3);
        second.author_id = "1".to_string();

        assert!(p.process(first).await.is_some());
        let result = p.process(second).await.unwrap();

        assert!(!result.reply_text.contains("You solved above"));
        assert_eq!(result.reply_text.lines().count(), 2);
        let scores = store.global_scores();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].1.solved_row, 3);
    }

    #[test]
    fn test_same_utc_day() {
        assert!(is_same_utc_day(ts(0), ts(86_399)));
        assert!(!is_same_utc_day(ts(86_399), ts(86_400)));
    }
}
