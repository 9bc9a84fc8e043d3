//! Reviewer selection policy.
//!
//! Pure decision logic with no I/O: given a candidate pool, pick reviewers.
//! Randomness is injected so callers (and tests) control the source.

use crate::error::AppError;
use rand::Rng;

/// Pick the initial reviewer set for a new pull request.
///
/// The pool arrives already scoped to the author's active teammates with the
/// author excluded; selection keeps store order and truncates to `max_count`.
/// An empty pool yields an empty set — a reviewer-less PR is a valid state,
/// not an error.
pub fn pick_initial_reviewers(mut candidates: Vec<String>, max_count: usize) -> Vec<String> {
    candidates.truncate(max_count);
    candidates
}

/// Pick a replacement reviewer by uniform random draw.
///
/// The pool must already exclude the PR author and every current reviewer,
/// including the one departing. Repeated reassignment requests can land on
/// different teammates because the draw is uniform, not first-match.
pub fn pick_replacement<R: Rng>(candidates: &[String], rng: &mut R) -> Result<String, AppError> {
    if candidates.is_empty() {
        return Err(AppError::NoEligibleCandidate);
    }

    let pick = rng.gen_range(0..candidates.len());
    Ok(candidates[pick].clone())
}
