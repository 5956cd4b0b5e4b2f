//! Process-lifetime record of which posts are being, or have been, handled.
//!
//! A post id moves `absent -> in-flight -> done` and never moves back.
//! [`ProcessingTracker::try_begin`] checks and marks under a single lock
//! with no await in between, so two overlapping invocations for the same
//! id cannot both proceed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Where a post id is in its lifecycle within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    Absent,
    InFlight,
    Done,
}

#[derive(Debug, Default)]
struct Sets {
    in_flight: HashSet<String>,
    done: HashSet<String>,
}

/// Shared dedup state. Construct once per process and clone freely.
#[derive(Debug, Clone, Default)]
pub struct ProcessingTracker {
    sets: Arc<Mutex<Sets>>,
}

impl ProcessingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `post_id` in-flight. Returns false if it was already in-flight or done.
    pub fn try_begin(&self, post_id: &str) -> bool {
        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        if sets.in_flight.contains(post_id) || sets.done.contains(post_id) {
            return false;
        }
        sets.in_flight.insert(post_id.to_string());
        true
    }

    /// Move `post_id` to done, whether or not it was in flight.
    pub fn finish(&self, post_id: &str) {
        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        sets.in_flight.remove(post_id);
        sets.done.insert(post_id.to_string());
    }

    pub fn state(&self, post_id: &str) -> PostState {
        let sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        if sets.done.contains(post_id) {
            PostState::Done
        } else if sets.in_flight.contains(post_id) {
            PostState::InFlight
        } else {
            PostState::Absent
        }
    }

    /// Like [`try_begin`](Self::try_begin), returning a guard that finishes the id on drop.
    pub fn begin(&self, post_id: &str) -> Option<ProcessingGuard> {
        self.try_begin(post_id).then(|| ProcessingGuard {
            tracker: self.clone(),
            post_id: post_id.to_string(),
        })
    }
}

/// Marks its post id done when dropped, on every exit path.
#[derive(Debug)]
pub struct ProcessingGuard {
    tracker: ProcessingTracker,
    post_id: String,
}

impl ProcessingGuard {
    pub fn post_id(&self) -> &str {
        &self.post_id
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.tracker.finish(&self.post_id);
    }
}
