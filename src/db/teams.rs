//! Team queries.

use async_trait::async_trait;

use super::{map_constraint, SqliteStore};
use crate::error::AppError;
use crate::models::{Team, TeamMember, User};
use crate::store::TeamStore;

#[async_trait]
impl TeamStore for SqliteStore {
    async fn create_team(&self, team: &Team) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
            .bind(&team.team_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_constraint(
                    e,
                    "create_team",
                    || AppError::TeamAlreadyExists,
                    || AppError::internal("unexpected foreign key on teams"),
                )
            })?;

        // Existing users only move teams; name and active flag are kept.
        for member in &team.members {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, username, team_name, is_active)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id) DO UPDATE SET team_name = excluded.team_name
                "#,
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(&team.team_name)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "upsert_user"))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_team(&self, team_name: &str) -> Result<Team, AppError> {
        if !self.team_exists(team_name).await? {
            return Err(AppError::TeamNotFound);
        }

        let users: Vec<User> = sqlx::query_as(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = ?
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(Team::new(
            team_name,
            users.into_iter().map(TeamMember::from).collect(),
        ))
    }

    async fn team_exists(&self, team_name: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE team_name = ?")
            .bind(team_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn list_active_members(&self, team_name: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = ? AND is_active = 1
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_open_prs_with_team_reviewers(
        &self,
        team_name: &str,
    ) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT DISTINCT pr.pull_request_id
            FROM pull_requests pr
            JOIN pr_reviewers r ON r.pull_request_id = pr.pull_request_id
            JOIN users u ON u.user_id = r.user_id
            WHERE pr.status = 'OPEN' AND u.team_name = ?
            ORDER BY pr.pull_request_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_pr_reviewers_from_team(
        &self,
        pull_request_id: &str,
        team_name: &str,
    ) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT r.user_id
            FROM pr_reviewers r
            JOIN users u ON u.user_id = r.user_id
            WHERE r.pull_request_id = ? AND u.team_name = ?
            ORDER BY r.id
            "#,
        )
        .bind(pull_request_id)
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_team_names(&self) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar("SELECT team_name FROM teams ORDER BY team_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }
}
