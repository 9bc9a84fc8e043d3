//! User and review-statistics models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member. `is_active` gates eligibility as a reviewer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Team the user currently belongs to (mutable via team upsert).
    pub team_name: String,
    pub is_active: bool,
}

/// Per-user review ledger, one row per user.
///
/// The ledger counts review *assignment events*, not current load:
/// `total_reviews` grows on every slot-touch, `active_reviews` tracks slots
/// currently held, `merged_reviews` tracks slots held to completion. The three
/// are not required to reconcile (`total = active + merged` does not hold once
/// reassignments or deactivations occur).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStat {
    pub user_id: String,
    pub total_reviews: i64,
    pub active_reviews: i64,
    pub merged_reviews: i64,
    /// Last ledger touch (Unix seconds).
    pub updated_at: i64,
}
