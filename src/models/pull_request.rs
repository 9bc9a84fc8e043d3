//! Pull request model and state transitions.
//!
//! A pull request is the aggregate this service revolves around: it owns the
//! OPEN→MERGED state machine and the reviewer slot rules. Reviewer ids are
//! stored as a JSON string in SQLite but handled as Vec<String> in Rust.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum number of reviewer slots on a pull request.
pub const REVIEWERS_MAX_COUNT: usize = 2;

/// Status of a pull request. OPEN→MERGED is the only transition; it never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl From<&str> for PullRequestStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Merged => write!(f, "MERGED"),
        }
    }
}

/// A pull request with its assigned reviewers.
///
/// Note: `reviewer_ids` is stored as a JSON string in SQLite; use
/// [`PullRequest::reviewers_vec`] and [`PullRequest::set_reviewers`] to work
/// with it. Slot order matters: a reassignment replaces a reviewer by slot
/// index, never by shuffling the sequence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PullRequest {
    /// Caller-chosen unique id (e.g. "pr-1001").
    pub id: String,

    /// Human-readable title.
    pub name: String,

    /// Author's user id. Immutable after creation and never a reviewer.
    pub author_id: String,

    /// Current status: `OPEN` or `MERGED`.
    pub status: String,

    /// JSON array of reviewer user ids, at most [`REVIEWERS_MAX_COUNT`] entries.
    pub reviewer_ids: String,

    /// Merge timestamp (Unix seconds). Set exactly once, at the merge transition.
    pub merged_at: Option<i64>,
}

impl PullRequest {
    /// Create a new OPEN pull request with the given reviewer set.
    ///
    /// An empty reviewer set is a valid state; an empty author id is not.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
        reviewers: Vec<String>,
    ) -> Result<Self, AppError> {
        let author_id = author_id.into();
        if author_id.is_empty() {
            return Err(AppError::invalid_input_field(
                "author id is required",
                "author_id",
            ));
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            author_id,
            status: PullRequestStatus::Open.to_string(),
            reviewer_ids: serde_json::to_string(&reviewers).unwrap_or_else(|_| "[]".into()),
            merged_at: None,
        })
    }

    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> PullRequestStatus {
        PullRequestStatus::from(self.status.as_str())
    }

    /// Parse reviewer ids from the JSON column.
    pub fn reviewers_vec(&self) -> Vec<String> {
        serde_json::from_str(&self.reviewer_ids).unwrap_or_default()
    }

    /// Replace the whole reviewer set, re-encoding the JSON column.
    pub fn set_reviewers(&mut self, reviewers: Vec<String>) {
        self.reviewer_ids = serde_json::to_string(&reviewers).unwrap_or_else(|_| "[]".into());
    }

    /// Check if the PR is open.
    pub fn is_open(&self) -> bool {
        self.status_enum() == PullRequestStatus::Open
    }

    /// Check if the PR is merged.
    pub fn is_merged(&self) -> bool {
        self.status_enum() == PullRequestStatus::Merged
    }

    /// Transition OPEN→MERGED, stamping `merged_at`.
    ///
    /// Idempotent: merging an already-merged PR leaves it untouched and
    /// returns `false` so callers can skip the stats delta on a retry.
    pub fn merge(&mut self) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PullRequestStatus::Merged.to_string();
        self.merged_at = Some(chrono::Utc::now().timestamp());
        true
    }

    /// Find the slot index a reviewer occupies, if any.
    pub fn reviewer_slot(&self, user_id: &str) -> Option<usize> {
        self.reviewers_vec().iter().position(|id| id == user_id)
    }

    /// Overwrite one reviewer slot in place, preserving slot order and count.
    ///
    /// Fails with `InvalidState` when the PR is merged (a merged PR's reviewer
    /// set is immutable) and ignores out-of-range slots.
    pub fn set_reviewer_slot(&mut self, slot: usize, user_id: String) -> Result<(), AppError> {
        if self.is_merged() {
            return Err(AppError::invalid_state(
                "cannot modify reviewers of a merged pull request",
            ));
        }
        let mut reviewers = self.reviewers_vec();
        if let Some(entry) = reviewers.get_mut(slot) {
            *entry = user_id;
        }
        self.set_reviewers(reviewers);
        Ok(())
    }
}
