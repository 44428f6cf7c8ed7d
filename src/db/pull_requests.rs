//! Pull request and reviewer assignment queries.

use async_trait::async_trait;
use chrono::Utc;

use super::{map_constraint, SqliteStore};
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestRow, PullRequestShort};
use crate::store::PrStore;

#[async_trait]
impl PrStore for SqliteStore {
    async fn create_with_reviewers(
        &self,
        pr: &PullRequest,
        reviewer_ids: &[String],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status)
            VALUES (?, ?, ?, 'OPEN')
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.pull_request_name)
        .bind(&pr.author_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_constraint(
                e,
                "create_pull_request",
                || AppError::PrAlreadyExists,
                || AppError::PrAuthorNotFound,
            )
        })?;

        for reviewer_id in reviewer_ids {
            sqlx::query("INSERT INTO pr_reviewers (pull_request_id, user_id) VALUES (?, ?)")
                .bind(&pr.pull_request_id)
                .bind(reviewer_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    map_constraint(
                        e,
                        "assign_reviewer",
                        || AppError::database_with_op("duplicate reviewer", "assign_reviewer"),
                        || AppError::UserNotFound,
                    )
                })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_pr(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        let row: PullRequestRow = sqlx::query_as(
            r#"
            SELECT pull_request_id, pull_request_name, author_id, status, merged_at
            FROM pull_requests
            WHERE pull_request_id = ?
            "#,
        )
        .bind(pull_request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::PrNotFound)?;

        let reviewers = self.list_reviewers(pull_request_id).await?;
        Ok(row.into_pull_request(reviewers))
    }

    async fn merge(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        let row: PullRequestRow = sqlx::query_as(
            r#"
            UPDATE pull_requests
            SET status = 'MERGED',
                merged_at = COALESCE(merged_at, ?)
            WHERE pull_request_id = ?
            RETURNING pull_request_id, pull_request_name, author_id, status, merged_at
            "#,
        )
        .bind(Utc::now())
        .bind(pull_request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::PrNotFound)?;

        let reviewers = self.list_reviewers(pull_request_id).await?;
        Ok(row.into_pull_request(reviewers))
    }

    async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Reviewers of a merged PR are frozen.
        let removed = sqlx::query(
            r#"
            DELETE FROM pr_reviewers
            WHERE pull_request_id = ? AND user_id = ?
              AND EXISTS (
                  SELECT 1 FROM pull_requests
                  WHERE pull_request_id = ? AND status = 'OPEN'
              )
            "#,
        )
        .bind(pull_request_id)
        .bind(old_reviewer_id)
        .bind(pull_request_id)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() == 0 {
            let status: Option<String> =
                sqlx::query_scalar("SELECT status FROM pull_requests WHERE pull_request_id = ?")
                    .bind(pull_request_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            // Dropping the transaction rolls it back
            return Err(match status.as_deref() {
                None => AppError::PrNotFound,
                Some("MERGED") => AppError::PrAlreadyMerged,
                Some(_) => AppError::ReviewerNotAssigned,
            });
        }

        sqlx::query("INSERT INTO pr_reviewers (pull_request_id, user_id) VALUES (?, ?)")
            .bind(pull_request_id)
            .bind(new_reviewer_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_constraint(
                    e,
                    "reassign_reviewer",
                    || AppError::database_with_op("reviewer already assigned", "reassign_reviewer"),
                    || AppError::UserNotFound,
                )
            })?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_prs_reviewed_by(&self, user_id: &str) -> Result<Vec<PullRequestShort>, AppError> {
        let rows: Vec<PullRequestRow> = sqlx::query_as(
            r#"
            SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status, pr.merged_at
            FROM pull_requests pr
            JOIN pr_reviewers r ON r.pull_request_id = pr.pull_request_id
            WHERE r.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PullRequestShort::from).collect())
    }

    async fn is_reviewer(&self, pull_request_id: &str, user_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pr_reviewers WHERE pull_request_id = ? AND user_id = ?",
        )
        .bind(pull_request_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn pr_exists(&self, pull_request_id: &str) -> Result<bool, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pull_requests WHERE pull_request_id = ?")
                .bind(pull_request_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn list_reviewers(&self, pull_request_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar(
            "SELECT user_id FROM pr_reviewers WHERE pull_request_id = ? ORDER BY id",
        )
        .bind(pull_request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::temp_store;
    use crate::db::SqliteStore;
    use crate::error::AppError;
    use crate::models::{PullRequest, PullRequestStatus, Team, TeamMember};
    use crate::store::{PrStore, TeamStore};

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded() -> (SqliteStore, tempfile::TempDir) {
        let (store, dir) = temp_store().await;
        store
            .create_team(&Team::new(
                "backend",
                vec![
                    TeamMember::new("u1", "Alice", true),
                    TeamMember::new("u2", "Bob", true),
                    TeamMember::new("u3", "Carol", true),
                ],
            ))
            .await
            .unwrap();
        store
            .create_team(&Team::new("ops", vec![TeamMember::new("u9", "Ivan", true)]))
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_create_with_reviewers_and_fetch() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &ids(&["u3", "u2"]))
            .await
            .unwrap();

        let pr = store.get_pr("pr-1").await.unwrap();
        assert_eq!(pr.status, PullRequestStatus::Open);
        assert_eq!(pr.assigned_reviewers, vec!["u3", "u2"]);
        assert!(pr.merged_at.is_none());
        assert!(store.is_reviewer("pr-1", "u3").await.unwrap());
        assert!(!store.is_reviewer("pr-1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_is_all_or_nothing() {
        let (store, _dir) = seeded().await;

        let err = store
            .create_with_reviewers(
                &PullRequest::open("pr-1", "Add X", "u1"),
                &ids(&["u2", "ghost"]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UserNotFound));
        assert!(!store.pr_exists("pr-1").await.unwrap());
        assert!(store.list_reviewers("pr-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_and_unknown_author() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &[])
            .await
            .unwrap();

        let dup = store
            .create_with_reviewers(&PullRequest::open("pr-1", "Again", "u1"), &[])
            .await
            .unwrap_err();
        assert!(matches!(dup, AppError::PrAlreadyExists));

        let orphan = store
            .create_with_reviewers(&PullRequest::open("pr-2", "Orphan", "ghost"), &[])
            .await
            .unwrap_err();
        assert!(matches!(orphan, AppError::PrAuthorNotFound));
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &ids(&["u2"]))
            .await
            .unwrap();

        let first = store.merge("pr-1").await.unwrap();
        let second = store.merge("pr-1").await.unwrap();

        assert_eq!(first.status, PullRequestStatus::Merged);
        assert!(first.merged_at.is_some());
        assert_eq!(first.merged_at, second.merged_at);
        assert_eq!(second.assigned_reviewers, vec!["u2"]);
        assert!(matches!(
            store.merge("nope").await.unwrap_err(),
            AppError::PrNotFound
        ));
    }

    #[tokio::test]
    async fn test_reassign_swaps_one_row() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &ids(&["u2", "u3"]))
            .await
            .unwrap();

        store.reassign_reviewer("pr-1", "u2", "u9").await.unwrap();

        assert_eq!(store.list_reviewers("pr-1").await.unwrap(), vec!["u3", "u9"]);
    }

    #[tokio::test]
    async fn test_reassign_failure_rolls_back() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &ids(&["u2", "u3"]))
            .await
            .unwrap();

        // u3 is already assigned: the insert fails and the delete is undone
        assert!(store.reassign_reviewer("pr-1", "u2", "u3").await.is_err());
        assert_eq!(store.list_reviewers("pr-1").await.unwrap(), vec!["u2", "u3"]);

        let err = store.reassign_reviewer("pr-1", "u9", "u1").await.unwrap_err();
        assert!(matches!(err, AppError::ReviewerNotAssigned));
    }

    #[tokio::test]
    async fn test_reassign_leaves_merged_pr_alone() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &ids(&["u2", "u3"]))
            .await
            .unwrap();
        store.merge("pr-1").await.unwrap();

        let err = store.reassign_reviewer("pr-1", "u2", "u9").await.unwrap_err();

        assert!(matches!(err, AppError::PrAlreadyMerged));
        assert_eq!(store.list_reviewers("pr-1").await.unwrap(), vec!["u2", "u3"]);
        assert!(matches!(
            store.reassign_reviewer("nope", "u2", "u9").await.unwrap_err(),
            AppError::PrNotFound
        ));
    }

    #[tokio::test]
    async fn test_list_prs_reviewed_by_includes_merged() {
        let (store, _dir) = seeded().await;
        store
            .create_with_reviewers(&PullRequest::open("pr-1", "Add X", "u1"), &ids(&["u2"]))
            .await
            .unwrap();
        store
            .create_with_reviewers(&PullRequest::open("pr-2", "Add Y", "u3"), &ids(&["u2"]))
            .await
            .unwrap();
        store.merge("pr-1").await.unwrap();

        let prs = store.list_prs_reviewed_by("u2").await.unwrap();
        let summary: Vec<(&str, PullRequestStatus)> = prs
            .iter()
            .map(|p| (p.pull_request_id.as_str(), p.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("pr-1", PullRequestStatus::Merged),
                ("pr-2", PullRequestStatus::Open),
            ]
        );
    }
}
