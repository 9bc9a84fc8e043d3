//! Review workflow service.
//!
//! The mutation and query façade over the storage layer: loads current
//! aggregate state, lets the assignment policy compute reviewer sets, lets
//! the aggregate validate its transition, then hands the result to the
//! transactional storage functions. Holds no state of its own.

use crate::db::pool::DbPool;
use crate::db::{pull_requests, teams, users};
use crate::error::AppError;
use crate::models::{PullRequest, Team, TeamMember, User, UserStat, REVIEWERS_MAX_COUNT};
use crate::services::assignment;
use rand::Rng;

/// Create a pull request, auto-assigning up to two reviewers from the
/// author's active teammates.
///
/// A duplicate id fails with `AlreadyExists`; an unknown author with
/// `NotFound`. A team too small to supply reviewers yields a PR with fewer
/// (or zero) reviewers, which is a valid state.
pub async fn create_pr(
    pool: &DbPool,
    pr_id: &str,
    pr_name: &str,
    author_id: &str,
) -> Result<PullRequest, AppError> {
    match pull_requests::find_by_id(pool, pr_id).await {
        Ok(_) => return Err(AppError::already_exists("pull request", pr_id)),
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }

    let team_name = users::find_team_of(pool, author_id).await?;
    let candidates = users::find_active_ids(
        pool,
        &team_name,
        Some(author_id),
        Some(REVIEWERS_MAX_COUNT as i64),
    )
    .await?;
    let reviewers = assignment::pick_initial_reviewers(candidates, REVIEWERS_MAX_COUNT);

    let pr = PullRequest::new(pr_id, pr_name, author_id, reviewers)?;
    pull_requests::create(pool, &pr).await?;

    log::info!(
        "created pull request {} with {} reviewer(s)",
        pr.id,
        pr.reviewers_vec().len()
    );
    Ok(pr)
}

/// Merge a pull request. Safe to retry: merging an already-merged PR returns
/// its current state unchanged and issues no stats delta.
pub async fn merge_pr(pool: &DbPool, pr_id: &str) -> Result<PullRequest, AppError> {
    let mut pr = pull_requests::find_by_id(pool, pr_id).await?;

    if !pr.merge() {
        return Ok(pr);
    }

    pull_requests::merge(pool, &pr).await?;
    Ok(pr)
}

/// Replace one reviewer on an open pull request with a random active
/// teammate of theirs.
///
/// The replacement is drawn from the departing reviewer's team, excluding
/// the PR author and everyone currently assigned. The vacated slot is
/// overwritten in place, so reviewer count never changes. Returns the
/// updated PR and the id of the replacement.
pub async fn reassign_pr<R: Rng>(
    pool: &DbPool,
    rng: &mut R,
    pr_id: &str,
    old_reviewer_id: &str,
) -> Result<(PullRequest, String), AppError> {
    let mut pr = pull_requests::find_by_id(pool, pr_id).await?;

    if pr.is_merged() {
        return Err(AppError::invalid_state(
            "cannot modify reviewers of a merged pull request",
        ));
    }

    let slot = pr
        .reviewer_slot(old_reviewer_id)
        .ok_or_else(|| AppError::ReviewerNotAssigned {
            pr_id: pr_id.to_string(),
            user_id: old_reviewer_id.to_string(),
        })?;

    let team_name = users::find_team_of(pool, old_reviewer_id).await?;
    let mut candidates = users::find_active_ids(pool, &team_name, None, None).await?;
    let current = pr.reviewers_vec();
    candidates.retain(|id| id != &pr.author_id && !current.contains(id));

    let new_reviewer_id = assignment::pick_replacement(&candidates, rng)?;
    pr.set_reviewer_slot(slot, new_reviewer_id.clone())?;

    pull_requests::reassign(pool, &pr, old_reviewer_id, &new_reviewer_id).await?;

    log::info!(
        "reassigned reviewer {} -> {} on pull request {}",
        old_reviewer_id,
        new_reviewer_id,
        pr_id
    );
    Ok((pr, new_reviewer_id))
}

/// Activate or deactivate a user.
///
/// Deactivation removes the user from every open PR's reviewer slots;
/// activation has no cascading effect.
pub async fn set_user_active(
    pool: &DbPool,
    user_id: &str,
    is_active: bool,
) -> Result<User, AppError> {
    let mut user = users::find_by_id(pool, user_id).await?;

    users::set_active(pool, user_id, is_active).await?;
    user.is_active = is_active;

    Ok(user)
}

/// List the pull requests where the user is currently a reviewer.
pub async fn prs_for_reviewer(pool: &DbPool, user_id: &str) -> Result<Vec<PullRequest>, AppError> {
    pull_requests::find_by_reviewer(pool, user_id).await
}

/// Create or update a team and its members.
///
/// Users are upserted (a member can move between teams this way) and each
/// member gets a zeroed stats row if they never had one.
pub async fn add_team(
    pool: &DbPool,
    team_name: &str,
    members: &[TeamMember],
) -> Result<Team, AppError> {
    for member in members {
        if !member.is_valid() {
            return Err(AppError::invalid_input(
                "team member requires a user id and a username",
            ));
        }
    }

    let member_rows: Vec<User> = members
        .iter()
        .map(|m| User {
            id: m.user_id.clone(),
            name: m.username.clone(),
            team_name: team_name.to_string(),
            is_active: m.is_active,
        })
        .collect();

    teams::save(pool, team_name, &member_rows).await?;

    Ok(Team {
        name: team_name.to_string(),
    })
}

/// Fetch a team's members. A team nobody belongs to reports `NotFound`.
pub async fn get_team(pool: &DbPool, team_name: &str) -> Result<Vec<User>, AppError> {
    let members = teams::find_members_by_name(pool, team_name).await?;

    if members.is_empty() {
        return Err(AppError::not_found_with_id("team members", team_name));
    }

    Ok(members)
}

/// Deactivate a whole team, repairing affected open PRs from outside teams.
///
/// Returns the pull requests whose reviewer sets changed.
pub async fn deactivate_team<R: Rng>(
    pool: &DbPool,
    rng: &mut R,
    team_name: &str,
) -> Result<Vec<PullRequest>, AppError> {
    let affected = teams::deactivate_team(pool, rng, team_name).await?;

    log::info!(
        "deactivated team {}; {} open pull request(s) repaired",
        team_name,
        affected.len()
    );
    Ok(affected)
}

/// Read the review ledger. `limit` 0 means unbounded.
pub async fn get_stats(pool: &DbPool, limit: u64) -> Result<Vec<UserStat>, AppError> {
    users::get_stats(pool, limit).await
}
