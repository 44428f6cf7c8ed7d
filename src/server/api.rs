//! REST API routes.
//!
//! Thin translation between JSON payloads and the orchestrators in
//! [`crate::services`]. No business rules live here.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{AppError, ErrorKind};
use crate::models::{
    PrAssignmentStat, PullRequest, PullRequestShort, ReviewStat, Team, TeamDeactivationResult,
    User,
};

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error object.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ApiError,
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::PartialSuccess => StatusCode::CONFLICT,
        ErrorKind::Fatal | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(AppError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        if status.is_server_error() {
            log::error!("[server] {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: ApiError::from(&self.0),
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

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_request(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_request(rejection.body_text()))
    }
}

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct TeamNameQuery {
    team_name: String,
}

#[derive(Deserialize)]
struct TeamNameBody {
    team_name: String,
}

#[derive(Deserialize)]
struct UserIdQuery {
    user_id: String,
}

#[derive(Deserialize)]
struct SetActiveBody {
    user_id: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct CreatePrBody {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
}

#[derive(Deserialize)]
struct MergePrBody {
    pull_request_id: String,
}

#[derive(Deserialize)]
struct ReassignBody {
    pull_request_id: String,
    old_user_id: String,
}

#[derive(Serialize)]
struct TeamResponse {
    team: Team,
}

/// Deactivation report. `partial` is set when some PRs kept reviewers from
/// the deactivated team; `error` then describes the failure.
#[derive(Serialize)]
struct DeactivateResponse {
    #[serde(flatten)]
    result: TeamDeactivationResult,
    partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

#[derive(Serialize)]
struct UserResponse {
    user: User,
}

#[derive(Serialize)]
struct UserReviewsResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShort>,
}

#[derive(Serialize)]
struct PrResponse {
    pr: PullRequest,
}

#[derive(Serialize)]
struct ReassignResponse {
    pr: PullRequest,
    replaced_by: String,
}

#[derive(Serialize)]
struct StatsResponse<T> {
    stats: Vec<T>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

// ── Routes ───────────────────────────────────────────────────────────────────

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/team/deactivate", post(deactivate_team))
        .route("/users/setIsActive", post(set_user_active))
        .route("/users/getReview", get(get_user_reviews))
        .route("/pullRequest/create", post(create_pr))
        .route("/pullRequest/merge", post(merge_pr))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/stats/reviews", get(review_stats))
        .route("/stats/pr", get(pr_stats))
        .route("/health", get(health))
}

async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let Json(team) = payload?;
    let team = state.services.teams.create_team(team).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamNameQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let Query(query) = query?;
    let team = state.services.teams.get_team(&query.team_name).await?;
    Ok(Json(team))
}

async fn deactivate_team(
    State(state): State<AppState>,
    payload: Result<Json<TeamNameBody>, JsonRejection>,
) -> Result<Json<DeactivateResponse>, ApiErr> {
    let Json(body) = payload?;
    match state.services.teams.deactivate_team_users(&body.team_name).await {
        Ok(result) => Ok(Json(DeactivateResponse {
            result,
            partial: false,
            error: None,
        })),
        Err(err @ AppError::PartialReassignment { .. }) => {
            let error = ApiError::from(&err);
            let result = err
                .into_partial_result()
                .ok_or_else(|| AppError::internal("partial reassignment without result"))?;
            Ok(Json(DeactivateResponse {
                result,
                partial: true,
                error: Some(error),
            }))
        }
        Err(err) => Err(err.into()),
    }
}

async fn set_user_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveBody>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let Json(body) = payload?;
    let user = state
        .services
        .users
        .set_user_active(&body.user_id, body.is_active)
        .await?;
    Ok(Json(UserResponse { user }))
}

async fn get_user_reviews(
    State(state): State<AppState>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<UserReviewsResponse>, ApiErr> {
    let Query(query) = query?;
    let pull_requests = state.services.users.get_user_review_prs(&query.user_id).await?;
    Ok(Json(UserReviewsResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}

async fn create_pr(
    State(state): State<AppState>,
    payload: Result<Json<CreatePrBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PrResponse>), ApiErr> {
    let Json(body) = payload?;
    let pr = state
        .services
        .prs
        .create_pr(&body.pull_request_id, &body.pull_request_name, &body.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PrResponse { pr })))
}

async fn merge_pr(
    State(state): State<AppState>,
    payload: Result<Json<MergePrBody>, JsonRejection>,
) -> Result<Json<PrResponse>, ApiErr> {
    let Json(body) = payload?;
    let pr = state.services.prs.merge_pr(&body.pull_request_id).await?;
    Ok(Json(PrResponse { pr }))
}

async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignBody>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(body) = payload?;
    let outcome = state
        .services
        .prs
        .reassign_reviewer(&body.pull_request_id, &body.old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: outcome.pr,
        replaced_by: outcome.replaced_by,
    }))
}

async fn review_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse<ReviewStat>>, ApiErr> {
    let stats = state.services.stats.review_stats().await?;
    Ok(Json(StatsResponse { stats }))
}

async fn pr_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse<PrAssignmentStat>>, ApiErr> {
    let stats = state.services.stats.pr_assignment_stats().await?;
    Ok(Json(StatsResponse { stats }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
