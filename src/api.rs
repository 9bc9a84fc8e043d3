//! REST API routes.
//!
//! Thin axum binding of the review service: request parsing, response
//! shaping, and error-to-status mapping. No business rules live here.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequest, TeamMember, User, UserStat};
use crate::services::review;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Build the service router.
pub fn router(pool: DbPool) -> Router {
    Router::new()
        .route("/teams/add", post(add_team))
        .route("/teams/get", get(get_team))
        .route("/teams/deactivate", patch(deactivate_team))
        .route("/users/setIsActive", post(set_is_active_user))
        .route("/users/getReview", get(get_review_user))
        .route("/users/getUserReviewStats", get(get_user_review_stats))
        .route("/pullRequests/create", post(create_pull_request))
        .route("/pullRequests/merge", post(merge_pull_request))
        .route("/pullRequests/reassign", post(reassign_pull_request))
        .with_state(pool)
}

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error envelope: `{"error": {"code", "message"}}`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
struct ApiErr(AppError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::AlreadyExists { .. } => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::InvalidState { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
            AppError::NoEligibleCandidate => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            AppError::ReviewerNotAssigned { .. } => (StatusCode::CONFLICT, "REVIEWER_NOT_ASSIGNED"),
            AppError::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        (
            status,
            Json(ErrorBody {
                error: ErrorDetail {
                    code: code.to_string(),
                    message: self.0.to_string(),
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

// ── Response shapes ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PullRequestBody {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
    assigned_reviewers: Vec<String>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    merged_at: Option<i64>,
}

impl From<PullRequest> for PullRequestBody {
    fn from(pr: PullRequest) -> Self {
        let assigned_reviewers = pr.reviewers_vec();
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Serialize)]
struct PullRequestShortBody {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
}

impl From<PullRequest> for PullRequestShortBody {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

#[derive(Serialize)]
struct UserBody {
    user_id: String,
    username: String,
    team_name: String,
    is_active: bool,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.name,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

#[derive(Serialize)]
struct TeamMemberBody {
    user_id: String,
    username: String,
    is_active: bool,
}

#[derive(Serialize)]
struct TeamBody {
    team_name: String,
    members: Vec<TeamMemberBody>,
}

#[derive(Serialize)]
struct UserStatBody {
    user_id: String,
    total_reviews: i64,
    active_reviews: i64,
    merged_reviews: i64,
    updated_at: i64,
}

impl From<UserStat> for UserStatBody {
    fn from(stat: UserStat) -> Self {
        Self {
            user_id: stat.user_id,
            total_reviews: stat.total_reviews,
            active_reviews: stat.active_reviews,
            merged_reviews: stat.merged_reviews,
            updated_at: stat.updated_at,
        }
    }
}

// ── Team endpoints ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AddTeamRequest {
    team_name: String,
    members: Vec<TeamMember>,
}

async fn add_team(
    State(pool): State<DbPool>,
    Json(req): Json<AddTeamRequest>,
) -> Result<Json<TeamBody>, ApiErr> {
    if req.team_name.is_empty() {
        return Err(AppError::invalid_input_field("team_name can't be empty", "team_name").into());
    }

    review::add_team(&pool, &req.team_name, &req.members).await?;

    Ok(Json(TeamBody {
        team_name: req.team_name,
        members: req
            .members
            .into_iter()
            .map(|m| TeamMemberBody {
                user_id: m.user_id,
                username: m.username,
                is_active: m.is_active,
            })
            .collect(),
    }))
}

#[derive(Deserialize)]
struct TeamQuery {
    team_name: String,
}

async fn get_team(
    State(pool): State<DbPool>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<TeamBody>, ApiErr> {
    if query.team_name.is_empty() {
        return Err(AppError::invalid_input_field("team_name can't be empty", "team_name").into());
    }

    let members = review::get_team(&pool, &query.team_name).await?;

    Ok(Json(TeamBody {
        team_name: query.team_name,
        members: members
            .into_iter()
            .map(|u| TeamMemberBody {
                user_id: u.id,
                username: u.name,
                is_active: u.is_active,
            })
            .collect(),
    }))
}

#[derive(Serialize)]
struct DeactivateTeamResponse {
    pull_requests: Vec<PullRequestBody>,
}

async fn deactivate_team(
    State(pool): State<DbPool>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<DeactivateTeamResponse>, ApiErr> {
    if query.team_name.is_empty() {
        return Err(AppError::invalid_input_field("team_name can't be empty", "team_name").into());
    }

    let mut rng = StdRng::from_entropy();
    let affected = review::deactivate_team(&pool, &mut rng, &query.team_name).await?;

    Ok(Json(DeactivateTeamResponse {
        pull_requests: affected.into_iter().map(PullRequestBody::from).collect(),
    }))
}

// ── User endpoints ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SetIsActiveUserRequest {
    user_id: String,
    is_active: bool,
}

#[derive(Serialize)]
struct SetIsActiveUserResponse {
    user: UserBody,
}

async fn set_is_active_user(
    State(pool): State<DbPool>,
    Json(req): Json<SetIsActiveUserRequest>,
) -> Result<Json<SetIsActiveUserResponse>, ApiErr> {
    let user = review::set_user_active(&pool, &req.user_id, req.is_active).await?;

    Ok(Json(SetIsActiveUserResponse { user: user.into() }))
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

#[derive(Serialize)]
struct GetReviewUserResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShortBody>,
}

async fn get_review_user(
    State(pool): State<DbPool>,
    Query(query): Query<UserQuery>,
) -> Result<Json<GetReviewUserResponse>, ApiErr> {
    let prs = review::prs_for_reviewer(&pool, &query.user_id).await?;

    Ok(Json(GetReviewUserResponse {
        user_id: query.user_id,
        pull_requests: prs.into_iter().map(PullRequestShortBody::from).collect(),
    }))
}

#[derive(Deserialize)]
struct StatsQuery {
    limit: Option<u64>,
}

#[derive(Serialize)]
struct GetStatsResponse {
    user_review_stats: Vec<UserStatBody>,
}

async fn get_user_review_stats(
    State(pool): State<DbPool>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<GetStatsResponse>, ApiErr> {
    let stats = review::get_stats(&pool, query.limit.unwrap_or(0)).await?;

    Ok(Json(GetStatsResponse {
        user_review_stats: stats.into_iter().map(UserStatBody::from).collect(),
    }))
}

// ── Pull request endpoints ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreatePullRequestRequest {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
}

#[derive(Serialize)]
struct PullRequestResponse {
    pr: PullRequestBody,
}

async fn create_pull_request(
    State(pool): State<DbPool>,
    Json(req): Json<CreatePullRequestRequest>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    if req.pull_request_id.is_empty() {
        return Err(AppError::invalid_input_field(
            "pull_request_id can't be empty",
            "pull_request_id",
        )
        .into());
    }

    let pr = review::create_pr(&pool, &req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;

    Ok(Json(PullRequestResponse { pr: pr.into() }))
}

#[derive(Deserialize)]
struct MergePullRequestRequest {
    pull_request_id: String,
}

async fn merge_pull_request(
    State(pool): State<DbPool>,
    Json(req): Json<MergePullRequestRequest>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let pr = review::merge_pr(&pool, &req.pull_request_id).await?;

    Ok(Json(PullRequestResponse { pr: pr.into() }))
}

#[derive(Deserialize)]
struct ReassignPullRequestRequest {
    pull_request_id: String,
    old_reviewer_id: String,
}

#[derive(Serialize)]
struct ReassignPullRequestResponse {
    pr: PullRequestBody,
    replaced_by: String,
}

async fn reassign_pull_request(
    State(pool): State<DbPool>,
    Json(req): Json<ReassignPullRequestRequest>,
) -> Result<Json<ReassignPullRequestResponse>, ApiErr> {
    let mut rng = StdRng::from_entropy();
    let (pr, replaced_by) =
        review::reassign_pr(&pool, &mut rng, &req.pull_request_id, &req.old_reviewer_id).await?;

    Ok(Json(ReassignPullRequestResponse {
        pr: pr.into(),
        replaced_by,
    }))
}
