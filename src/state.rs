//! The immutable ranking state.
//!
//! Two persistent weighted maps encode the whole table:
//!
//! - `points_to_users`: score → set of users tied at that score. The set is
//!   itself a `WeightedAvlMap` keyed by user id whose values are the unit
//!   type, every member weighing 1; the outer node's weight is the set's
//!   cardinality. Rank queries fall out of the weights: the number of users
//!   ranked above a score is the total weight to its right.
//! - `users_to_points`: user id → score, with node weight 0 so only the
//!   outer map contributes to weight sums.
//!
//! A state is never mutated. `add_score` builds the successor state and
//! returns it; old references remain valid snapshots indefinitely.

use std::ops::ControlFlow;

use rankmap::WeightedAvlMap;

use crate::data::PositionedUser;
use crate::error::ScoreError;

/// Users tied at one score, ordered by user id. The unit value keeps this an
/// ordered set; no per-entry payload is allocated.
type TiedUsers = WeightedAvlMap<u64, ()>;

/// One immutable version of the ranking. See the module docs for the layout.
#[derive(Debug)]
pub struct RankingState {
    points_to_users: WeightedAvlMap<u64, TiedUsers>,
    users_to_points: WeightedAvlMap<u64, u64>,
}

impl RankingState {
    /// The empty ranking: no users, no scores.
    pub fn new() -> Self {
        Self {
            points_to_users: WeightedAvlMap::new(),
            users_to_points: WeightedAvlMap::new(),
        }
    }

    /// Number of distinct users ever registered.
    pub fn population(&self) -> u64 {
        self.points_to_users.total_weight()
    }

    /// Builds the state in which `user_id` has earned `earned` more points.
    ///
    /// Re-adding an already known user with zero points changes nothing and
    /// returns `Ok(None)`, so callers can keep their current reference (and
    /// its identity) untouched. A first contact with zero points does
    /// register the user. Overflow of the accumulated score is rejected with
    /// [`ScoreError::ScoreOverflow`]; `self` is never modified either way.
    pub fn add_score(&self, user_id: u64, earned: u64) -> Result<Option<Self>, ScoreError> {
        let previous = self.users_to_points.get(&user_id).copied();
        if previous.is_some() && earned == 0 {
            return Ok(None);
        }
        let current = previous.unwrap_or(0);
        let new_score = current
            .checked_add(earned)
            .ok_or(ScoreError::ScoreOverflow { user_id, earned })?;

        let mut points_to_users = self.points_to_users.clone();

        // A known user moves between score buckets: take them out of the old
        // one first, dropping the bucket entirely once it empties.
        if previous.is_some() {
            let remaining = points_to_users
                .get(&current)
                .expect("user with a score has no bucket in the points index")
                .remove(&user_id);
            points_to_users = if remaining.is_empty() {
                points_to_users.remove(&current)
            } else {
                points_to_users.put(current, remaining.total_weight(), remaining)
            };
        }

        let joined = points_to_users
            .get(&new_score)
            .cloned()
            .unwrap_or_default()
            .put(user_id, 1, ());
        let points_to_users = points_to_users.put(new_score, joined.total_weight(), joined);
        let users_to_points = self.users_to_points.put(user_id, 0, new_score);

        Ok(Some(Self {
            points_to_users,
            users_to_points,
        }))
    }

    /// The score and rank of `user_id`, or `None` for a user never seen.
    pub fn find_user(&self, user_id: u64) -> Option<PositionedUser> {
        let points = *self.users_to_points.get(&user_id)?;
        let higher = self
            .points_to_users
            .right_weight(&points)
            .expect("user with a score has no bucket in the points index");
        Some(PositionedUser {
            user_id,
            points,
            position: position_above(higher),
        })
    }

    /// The top of the table: best score first, ties sharing a position and
    /// ordered by ascending user id, at most `max_users` entries.
    pub fn high_scores(&self, max_users: usize) -> Vec<PositionedUser> {
        let population = usize::try_from(self.population()).unwrap_or(usize::MAX);
        let mut out = Vec::with_capacity(max_users.min(population));
        if max_users == 0 {
            return out;
        }
        let _ = self.points_to_users.for_each_reverse(|&points, tied, _, _, higher| {
            let position = position_above(higher);
            tied.for_each(|&user_id, _, _, _, _| {
                if out.len() >= max_users {
                    return ControlFlow::Break(());
                }
                out.push(PositionedUser {
                    user_id,
                    points,
                    position,
                });
                ControlFlow::Continue(())
            })
        });
        out
    }
}

impl Default for RankingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Competition rank of an entry with `higher` total weight above it.
#[inline]
fn position_above(higher: u64) -> u32 {
    debug_assert!(higher < u64::from(u32::MAX));
    (higher + 1) as u32
}
