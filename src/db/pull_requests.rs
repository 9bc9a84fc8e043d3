//! Pull request storage with transactional stats upkeep.
//!
//! This module is the sole writer of pull request rows and the
//! `user_review_stats` ledger. Each write operation applies the PR mutation
//! and the matching stats delta inside one transaction, so readers never
//! observe a PR row whose ledger entries were not committed with it. A
//! transaction dropped before commit (error or cancellation) rolls back.
//!
//! There is no optimistic versioning on pull request rows: concurrent
//! writers are serialized only by SQLite's transactional isolation, so two
//! racing reassignments of the same slot can both commit and each count
//! their own assignment events.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestStatus};
use sqlx::{Sqlite, Transaction};

const PR_COLUMNS: &str = "id, name, author_id, status, reviewer_ids, merged_at";

/// Apply a review-stats delta for the given reviewers.
///
/// `Open` marks new assignment events (`total_reviews` and `active_reviews`
/// go up); `Merged` closes held slots (`merged_reviews` up, `active_reviews`
/// down). Reviewers without a provisioned stats row are silently skipped:
/// rows are created at team-add time only, never lazily.
async fn update_review_stats(
    tx: &mut Transaction<'_, Sqlite>,
    status: PullRequestStatus,
    reviewer_ids: &[String],
) -> Result<(), AppError> {
    let sql = match status {
        PullRequestStatus::Open => {
            "UPDATE user_review_stats
             SET total_reviews = total_reviews + 1,
                 active_reviews = active_reviews + 1,
                 updated_at = ?
             WHERE user_id = ?"
        }
        PullRequestStatus::Merged => {
            "UPDATE user_review_stats
             SET merged_reviews = merged_reviews + 1,
                 active_reviews = active_reviews - 1,
                 updated_at = ?
             WHERE user_id = ?"
        }
    };

    let now = chrono::Utc::now().timestamp();
    for reviewer_id in reviewer_ids {
        sqlx::query(sql)
            .bind(now)
            .bind(reviewer_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// Persist a freshly created pull request and count the initial assignments.
pub async fn create(pool: &DbPool, pr: &PullRequest) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO pull_requests (id, name, author_id, status, reviewer_ids, merged_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&pr.id)
    .bind(&pr.name)
    .bind(&pr.author_id)
    .bind(&pr.status)
    .bind(&pr.reviewer_ids)
    .bind(pr.merged_at)
    .execute(&mut *tx)
    .await?;

    update_review_stats(&mut tx, PullRequestStatus::Open, &pr.reviewers_vec()).await?;

    tx.commit().await?;
    Ok(())
}

/// Persist a merge transition and settle the reviewers' ledgers.
///
/// The caller is responsible for loading the aggregate first and skipping
/// this call entirely when the PR was already merged; re-issuing the stats
/// delta on a retried merge would double-count.
pub async fn merge(pool: &DbPool, pr: &PullRequest) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ?")
        .bind(PullRequestStatus::Merged.to_string())
        .bind(pr.merged_at)
        .bind(&pr.id)
        .execute(&mut *tx)
        .await?;

    update_review_stats(&mut tx, PullRequestStatus::Merged, &pr.reviewers_vec()).await?;

    tx.commit().await?;
    Ok(())
}

/// Persist a reviewer slot rewrite.
///
/// Both endpoints of the swap are counted as new assignment events: the old
/// and the new reviewer each get `total_reviews`/`active_reviews` bumped.
pub async fn reassign(
    pool: &DbPool,
    pr: &PullRequest,
    old_reviewer: &str,
    new_reviewer: &str,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE pull_requests SET reviewer_ids = ? WHERE id = ?")
        .bind(&pr.reviewer_ids)
        .bind(&pr.id)
        .execute(&mut *tx)
        .await?;

    let touched = vec![old_reviewer.to_string(), new_reviewer.to_string()];
    update_review_stats(&mut tx, PullRequestStatus::Open, &touched).await?;

    tx.commit().await?;
    Ok(())
}

/// Load a pull request by id.
pub async fn find_by_id(pool: &DbPool, pr_id: &str) -> Result<PullRequest, AppError> {
    let pr: Option<PullRequest> = sqlx::query_as(&format!(
        "SELECT {PR_COLUMNS} FROM pull_requests WHERE id = ?"
    ))
    .bind(pr_id)
    .fetch_optional(pool)
    .await?;

    pr.ok_or_else(|| AppError::not_found_with_id("pull request", pr_id))
}

/// Find every pull request that lists the user as a reviewer.
///
/// Returns an empty vec when the user reviews nothing; that is not an error.
pub async fn find_by_reviewer(pool: &DbPool, user_id: &str) -> Result<Vec<PullRequest>, AppError> {
    let prs: Vec<PullRequest> = sqlx::query_as(&format!(
        "SELECT {PR_COLUMNS} FROM pull_requests
         WHERE EXISTS (
             SELECT 1 FROM json_each(pull_requests.reviewer_ids)
             WHERE json_each.value = ?
         )"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(prs)
}
