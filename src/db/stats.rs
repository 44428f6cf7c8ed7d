//! Aggregate review statistics.

use async_trait::async_trait;

use super::SqliteStore;
use crate::error::AppError;
use crate::models::{PrAssignmentStat, ReviewStat};
use crate::store::StatsStore;

#[async_trait]
impl StatsStore for SqliteStore {
    async fn review_counts_per_user(&self) -> Result<Vec<ReviewStat>, AppError> {
        let stats = sqlx::query_as(
            r#"
            SELECT u.user_id, u.username, COUNT(r.pull_request_id) AS review_count
            FROM users u
            LEFT JOIN pr_reviewers r ON r.user_id = u.user_id
            GROUP BY u.user_id, u.username
            ORDER BY review_count DESC, u.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn reviewer_counts_per_pr(&self) -> Result<Vec<PrAssignmentStat>, AppError> {
        let stats = sqlx::query_as(
            r#"
            SELECT pr.pull_request_id, pr.pull_request_name, COUNT(r.user_id) AS reviewers_count
            FROM pull_requests pr
            LEFT JOIN pr_reviewers r ON r.pull_request_id = pr.pull_request_id
            GROUP BY pr.pull_request_id, pr.pull_request_name
            ORDER BY reviewers_count DESC, pr.pull_request_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}
