//! # highscores
//!
//! An in-memory HTTP highscores table.
//!
//! Scores live in a pair of persistent weighted AVL maps (see the `rankmap`
//! crate): one from score to the set of users tied at that score, one from
//! user to score. Every update produces a new immutable [`RankingState`];
//! the only shared mutable datum in the process is the single reference to
//! the current state, held by a [`ScoreTable`] cell. Readers grab that
//! reference once and then work on a frozen snapshot, so lookups and full
//! leaderboard traversals never block writers and never observe a
//! half-applied update.
//!
//! The HTTP surface has three routes:
//!
//! - `POST /score`: add points to a user (strict JSON, 422 on anything off)
//! - `GET /score/{userId}/position`: a user's score and competition rank
//! - `GET /highscorelist`: the top of the table, capped at 20,000 entries

#![warn(clippy::all)]

pub mod cli;
pub mod data;
pub mod error;
pub mod server;
pub mod state;
pub mod table;

pub use data::{HighscoresList, PositionedUser, UserScore};
pub use error::ScoreError;
pub use state::RankingState;
pub use table::{CasScoreTable, MutexScoreTable, ScoreTable};
