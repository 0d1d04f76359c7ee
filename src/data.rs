//! Wire types for the HTTP surface.
//!
//! Deserialization is deliberately strict: unknown fields, missing fields,
//! duplicated keys, `null` where a number belongs, negative numbers and
//! fractions are all rejected, so a bad payload never reaches the core. The
//! unsigned field types do most of that work; the serde derive does the
//! rest.

use serde::{Deserialize, Serialize};

/// The `POST /score` request body: `{"userId": ..., "points": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserScore {
    /// The id of the user earning points.
    pub user_id: u64,
    /// The points earned; zero is allowed and registers the user.
    pub points: u64,
}

/// A user together with score and rank, as returned by the lookup and list
/// routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PositionedUser {
    /// The id of the user.
    pub user_id: u64,
    /// The user's accumulated score.
    pub points: u64,
    /// 1-based competition rank; tied users share a position.
    pub position: u32,
}

/// The `GET /highscorelist` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HighscoresList {
    /// Best score first; ties share a position and are ordered by user id.
    pub highscores: Vec<PositionedUser>,
}
