//! User storage: activation toggles, candidate-pool lookups, and stats reads.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestStatus, User, UserStat};

/// Flip a user's active flag.
///
/// Deactivation cascades: the user is removed from the reviewer set of every
/// OPEN pull request that lists them, shrinking the slot rather than seeking
/// a replacement. Activation is a pure flag flip with no cascade. Flag update
/// and cascade commit in one transaction.
pub async fn set_active(pool: &DbPool, user_id: &str, is_active: bool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if !is_active {
        let open_prs: Vec<PullRequest> = sqlx::query_as(
            "SELECT id, name, author_id, status, reviewer_ids, merged_at
             FROM pull_requests
             WHERE status = ?
               AND EXISTS (
                   SELECT 1 FROM json_each(pull_requests.reviewer_ids)
                   WHERE json_each.value = ?
               )",
        )
        .bind(PullRequestStatus::Open.to_string())
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        for mut pr in open_prs {
            let reviewers: Vec<String> = pr
                .reviewers_vec()
                .into_iter()
                .filter(|id| id.as_str() != user_id)
                .collect();
            pr.set_reviewers(reviewers);

            sqlx::query("UPDATE pull_requests SET reviewer_ids = ? WHERE id = ?")
                .bind(&pr.reviewer_ids)
                .bind(&pr.id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Load a user by id.
pub async fn find_by_id(pool: &DbPool, user_id: &str) -> Result<User, AppError> {
    let user: Option<User> =
        sqlx::query_as("SELECT id, name, team_name, is_active FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    user.ok_or_else(|| AppError::not_found_with_id("user", user_id))
}

/// Look up the team a user belongs to.
pub async fn find_team_of(pool: &DbPool, user_id: &str) -> Result<String, AppError> {
    let team: Option<String> = sqlx::query_scalar("SELECT team_name FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    team.ok_or_else(|| AppError::not_found_with_id("user", user_id))
}

/// List active user ids in a team, in store order.
///
/// `exclude` drops one id from the pool (the PR author); `limit` caps the
/// result (None means unbounded).
pub async fn find_active_ids(
    pool: &DbPool,
    team_name: &str,
    exclude: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<String>, AppError> {
    let mut sql = String::from("SELECT id FROM users WHERE team_name = ? AND is_active = 1");
    if exclude.is_some() {
        sql.push_str(" AND id != ?");
    }
    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query_scalar::<_, String>(&sql).bind(team_name);
    if let Some(excluded_id) = exclude {
        query = query.bind(excluded_id);
    }
    if let Some(max) = limit {
        query = query.bind(max);
    }

    Ok(query.fetch_all(pool).await?)
}

/// Read the review ledger, heaviest reviewers first. `limit` 0 means unbounded.
pub async fn get_stats(pool: &DbPool, limit: u64) -> Result<Vec<UserStat>, AppError> {
    let mut sql = String::from(
        "SELECT user_id, total_reviews, active_reviews, merged_reviews, updated_at
         FROM user_review_stats
         ORDER BY total_reviews DESC, user_id",
    );
    if limit > 0 {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query_as::<_, UserStat>(&sql);
    if limit > 0 {
        query = query.bind(limit as i64);
    }

    Ok(query.fetch_all(pool).await?)
}
