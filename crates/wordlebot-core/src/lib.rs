//! # wordlebot core
//!
//! Runtime-free logic for wordlebot: turning post text into a Wordle
//! result, scoring it, and deciding exactly once per post whether to
//! persist and reply.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Storage and
//! parent-post lookups are reached through the [`store::ScoreStore`] and
//! [`models::ParentFetcher`] traits.
//!
//! ## Pipeline
//!
//! ```text
//! text + alt-texts ─▶ matrix / metadata ─▶ validity + score ─▶ processor ─▶ store, reply
//! ```

#[macro_use]
mod macros;

pub mod matrix;
pub mod metadata;
pub mod models;
pub mod phrases;
pub mod processor;
pub mod reply;
pub mod scoring;
pub mod store;
pub mod tracker;
