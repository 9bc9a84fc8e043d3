//! Deactivation cascade tests.
//!
//! A single user going inactive must vanish from every OPEN pull request's
//! reviewer slots (and no MERGED one); a whole team going inactive triggers
//! the repair path that refills vacated slots from active users outside the
//! team. Both cascades commit atomically with the flag flips.

use rand::rngs::StdRng;
use rand::SeedableRng;
use review_roster::db::pool::DbPool;
use review_roster::db::{self, pull_requests};
use review_roster::models::TeamMember;
use review_roster::services::review;
use tempfile::TempDir;

async fn setup_db() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
    (dir, pool)
}

fn member(user_id: &str, username: &str, is_active: bool) -> TeamMember {
    TeamMember {
        user_id: user_id.into(),
        username: username.into(),
        is_active,
    }
}

async fn add_team(pool: &DbPool, team_name: &str, members: &[(&str, bool)]) {
    let members: Vec<TeamMember> = members
        .iter()
        .map(|(id, active)| member(id, &format!("user-{}", id), *active))
        .collect();
    review::add_team(pool, team_name, &members).await.unwrap();
}

#[tokio::test]
async fn deactivating_a_user_strips_open_prs_only() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true), ("u3", true)]).await;

    // Two PRs both reviewed by u2 and u3; one of them gets merged.
    review::create_pr(&pool, "pr-open", "Add search", "u1")
        .await
        .unwrap();
    review::create_pr(&pool, "pr-merged", "Fix rounding", "u1")
        .await
        .unwrap();
    review::merge_pr(&pool, "pr-merged").await.unwrap();

    let user = review::set_user_active(&pool, "u2", false).await.unwrap();
    assert!(!user.is_active);

    // Gone from the open PR, slot shrunk rather than replaced.
    let open = pull_requests::find_by_id(&pool, "pr-open").await.unwrap();
    assert_eq!(open.reviewers_vec(), vec!["u3".to_string()]);

    // Merged history is immutable.
    let merged = pull_requests::find_by_id(&pool, "pr-merged").await.unwrap();
    assert_eq!(
        merged.reviewers_vec(),
        vec!["u2".to_string(), "u3".to_string()]
    );
}

#[tokio::test]
async fn reactivation_is_a_pure_flag_flip() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true)]).await;
    review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();

    review::set_user_active(&pool, "u2", false).await.unwrap();
    let user = review::set_user_active(&pool, "u2", true).await.unwrap();
    assert!(user.is_active);

    // No cascade on activation: the vacated slot stays vacated.
    let pr = pull_requests::find_by_id(&pool, "pr-1").await.unwrap();
    assert!(pr.reviewers_vec().is_empty());
}

#[tokio::test]
async fn set_active_unknown_user_fails() {
    let (_dir, pool) = setup_db().await;

    let err = review::set_user_active(&pool, "ghost", false)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn deactivated_users_are_not_assignment_candidates() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true), ("u3", true)]).await;

    review::set_user_active(&pool, "u2", false).await.unwrap();

    let pr = review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();
    assert_eq!(pr.reviewers_vec(), vec!["u3".to_string()]);
}

#[tokio::test]
async fn team_deactivation_refills_slots_from_outside() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true)]).await;
    add_team(&pool, "platform", &[("u9", true)]).await;

    review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let affected = review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();

    assert_eq!(affected.len(), 1);
    assert_eq!(affected[0].id, "pr-1");
    assert_eq!(affected[0].reviewers_vec(), vec!["u9".to_string()]);

    // Every member of the team went inactive.
    let members = review::get_team(&pool, "payments").await.unwrap();
    assert!(members.iter().all(|m| !m.is_active));

    // The repair is persisted, not just reported.
    let pr = pull_requests::find_by_id(&pool, "pr-1").await.unwrap();
    assert_eq!(pr.reviewers_vec(), vec!["u9".to_string()]);
}

#[tokio::test]
async fn team_deactivation_without_outsiders_shrinks_slots() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true), ("u3", true)]).await;

    review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let affected = review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();

    assert_eq!(affected.len(), 1);
    assert!(affected[0].reviewers_vec().is_empty());
}

#[tokio::test]
async fn team_deactivation_never_duplicates_surviving_reviewers() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true)]).await;
    add_team(&pool, "platform", &[("u8", true)]).await;

    // Seed a PR whose reviewer set spans both teams.
    sqlx::query(
        "INSERT INTO pull_requests (id, name, author_id, status, reviewer_ids)
         VALUES (?, ?, ?, 'OPEN', ?)",
    )
    .bind("pr-1")
    .bind("Cross team")
    .bind("u1")
    .bind(r#"["u2","u8"]"#)
    .execute(&pool)
    .await
    .unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let affected = review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();

    // u8 is the only active outsider but already holds a slot, so the
    // vacated slot is dropped instead of duplicating them.
    assert_eq!(affected.len(), 1);
    assert_eq!(affected[0].reviewers_vec(), vec!["u8".to_string()]);
}

#[tokio::test]
async fn team_deactivation_fills_both_vacated_slots_distinctly() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true), ("u3", true)]).await;
    add_team(&pool, "platform", &[("u8", true), ("u9", true)]).await;

    review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let affected = review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();

    assert_eq!(affected.len(), 1);
    let mut repaired = affected[0].reviewers_vec();
    repaired.sort();
    assert_eq!(repaired, vec!["u8".to_string(), "u9".to_string()]);
}

#[tokio::test]
async fn team_deactivation_ignores_merged_prs() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true)]).await;
    add_team(&pool, "platform", &[("u9", true)]).await;

    review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();
    review::merge_pr(&pool, "pr-1").await.unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let affected = review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();
    assert!(affected.is_empty());

    let pr = pull_requests::find_by_id(&pool, "pr-1").await.unwrap();
    assert_eq!(pr.reviewers_vec(), vec!["u2".to_string()]);
}

#[tokio::test]
async fn repeated_team_deactivation_is_harmless() {
    let (_dir, pool) = setup_db().await;
    add_team(&pool, "payments", &[("u1", true), ("u2", true)]).await;
    review::create_pr(&pool, "pr-1", "Add search", "u1")
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();

    // Nobody left to deactivate: nothing reported, nothing changed.
    let affected = review::deactivate_team(&pool, &mut rng, "payments")
        .await
        .unwrap();
    assert!(affected.is_empty());
}
