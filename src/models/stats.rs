//! Review statistics rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of PRs a user currently reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReviewStat {
    pub user_id: String,
    pub username: String,
    pub review_count: i64,
}

/// Number of reviewers currently assigned to a PR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PrAssignmentStat {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub reviewers_count: i64,
}
