//! Error type for the ranking core.

use thiserror::Error;

/// A rejected score update. The shared state is never modified when one of
/// these is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    /// The user's accumulated score would exceed the unsigned 64-bit range.
    /// Detected with checked addition; scores never wrap.
    #[error("adding {earned} points to user {user_id} overflows the score range")]
    ScoreOverflow {
        /// The user whose update was rejected.
        user_id: u64,
        /// The points that could not be applied.
        earned: u64,
    },
}
