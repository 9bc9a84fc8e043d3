//! Team storage: membership upsert and whole-team deactivation.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestStatus, User};
use rand::Rng;
use sqlx::{Sqlite, Transaction};

/// Upsert a team with its members and provision their stats rows.
///
/// The team row is created on first use; members are inserted or updated in
/// place (name, team, activity flag). Every member gets a zeroed
/// `user_review_stats` row if one does not exist yet; this is the only path
/// that provisions ledger rows. All of it commits as one transaction.
pub async fn save(pool: &DbPool, team_name: &str, members: &[User]) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO teams (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
        .bind(team_name)
        .execute(&mut *tx)
        .await?;

    for member in members {
        sqlx::query(
            "INSERT INTO users (id, name, team_name, is_active)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name,
                 team_name = excluded.team_name,
                 is_active = excluded.is_active",
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(team_name)
        .bind(member.is_active)
        .execute(&mut *tx)
        .await?;
    }

    provision_review_stats(&mut tx, members).await?;

    tx.commit().await?;
    Ok(())
}

/// Insert zeroed stats rows for users that don't have one yet.
async fn provision_review_stats(
    tx: &mut Transaction<'_, Sqlite>,
    members: &[User],
) -> Result<(), AppError> {
    let now = chrono::Utc::now().timestamp();
    for member in members {
        sqlx::query(
            "INSERT INTO user_review_stats (user_id, updated_at)
             VALUES (?, ?)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(&member.id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// List all members of a team (active and inactive).
pub async fn find_members_by_name(pool: &DbPool, team_name: &str) -> Result<Vec<User>, AppError> {
    let members: Vec<User> =
        sqlx::query_as("SELECT id, name, team_name, is_active FROM users WHERE team_name = ?")
            .bind(team_name)
            .fetch_all(pool)
            .await?;

    Ok(members)
}

/// Deactivate every active member of a team and repair affected open PRs.
///
/// For each OPEN pull request that lost reviewers to the deactivation, every
/// vacated slot is refilled with a randomly drawn active user from *outside*
/// the team (excluding the PR's author and its remaining reviewers). When the
/// outside pool is exhausted the slot is dropped and the PR keeps its reduced
/// reviewer set. Deactivation, replacement search, and PR rewrites commit as
/// one transaction; a failure at any step leaves the pre-state intact.
///
/// Returns the affected pull requests in their post-repair state.
pub async fn deactivate_team<R: Rng>(
    pool: &DbPool,
    rng: &mut R,
    team_name: &str,
) -> Result<Vec<PullRequest>, AppError> {
    let mut tx = pool.begin().await?;

    let deactivated: Vec<String> =
        sqlx::query_scalar("SELECT id FROM users WHERE team_name = ? AND is_active = 1")
            .bind(team_name)
            .fetch_all(&mut *tx)
            .await?;

    sqlx::query("UPDATE users SET is_active = 0 WHERE team_name = ? AND is_active = 1")
        .bind(team_name)
        .execute(&mut *tx)
        .await?;

    if deactivated.is_empty() {
        tx.commit().await?;
        return Ok(Vec::new());
    }

    let outsiders: Vec<String> =
        sqlx::query_scalar("SELECT id FROM users WHERE team_name != ? AND is_active = 1")
            .bind(team_name)
            .fetch_all(&mut *tx)
            .await?;

    let open_prs: Vec<PullRequest> = sqlx::query_as(
        "SELECT id, name, author_id, status, reviewer_ids, merged_at
         FROM pull_requests WHERE status = ?",
    )
    .bind(PullRequestStatus::Open.to_string())
    .fetch_all(&mut *tx)
    .await?;

    let mut affected = Vec::new();
    for mut pr in open_prs {
        let reviewers = pr.reviewers_vec();
        if !reviewers.iter().any(|id| deactivated.contains(id)) {
            continue;
        }

        // Surviving reviewers stay in their slots and are excluded from the
        // draw, as is the author and every replacement already picked.
        let mut excluded: Vec<String> = reviewers
            .iter()
            .filter(|id| !deactivated.contains(*id))
            .cloned()
            .collect();
        excluded.push(pr.author_id.clone());

        let mut repaired = Vec::with_capacity(reviewers.len());
        for reviewer_id in reviewers {
            if !deactivated.contains(&reviewer_id) {
                repaired.push(reviewer_id);
                continue;
            }

            let pool_ids: Vec<&String> = outsiders
                .iter()
                .filter(|id| !excluded.contains(*id))
                .collect();
            if pool_ids.is_empty() {
                continue;
            }

            let replacement = pool_ids[rng.gen_range(0..pool_ids.len())].clone();
            excluded.push(replacement.clone());
            repaired.push(replacement);
        }

        pr.set_reviewers(repaired);
        sqlx::query("UPDATE pull_requests SET reviewer_ids = ? WHERE id = ?")
            .bind(&pr.reviewer_ids)
            .bind(&pr.id)
            .execute(&mut *tx)
            .await?;

        affected.push(pr);
    }

    tx.commit().await?;
    Ok(affected)
}
