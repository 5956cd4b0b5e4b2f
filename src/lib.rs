//! # wordlebot
//!
//! Scores Wordle results shared on social networks. Each observed post is
//! parsed (emoji grid or image alt-text), scored, and persisted at most once,
//! falling back to the replied-to post when a reply carries no grid.
//!
//! The parsing, scoring, and per-post state machine live in
//! [`wordlebot_core`]; this crate adds the SQLite store, configuration,
//! and the `wordlebot` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ Replay file  │──▶│  PostProcessor   │──▶│  SQLite  │
//! │ (JSON lines) │   │ parse+score+dedup│   │  scores  │
//! └──────────────┘   └──────────────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite [`ScoreStore`](wordlebot_core::store::ScoreStore) |
//! | [`replay`] | Process recorded posts |
//! | [`score_cmd`] | Offline scoring of one post |
//! | [`leaderboard`] | Per-puzzle leaderboard |
//! | [`logging`] | tracing subscriber setup |

pub mod config;
pub mod db;
pub mod leaderboard;
pub mod logging;
pub mod migrate;
pub mod replay;
pub mod score_cmd;
pub mod sqlite_store;
