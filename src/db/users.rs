//! User queries.

use async_trait::async_trait;

use super::SqliteStore;
use crate::error::AppError;
use crate::models::User;
use crate::store::UserStore;

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        sqlx::query_as(
            "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UserNotFound)
    }

    async fn list_active_by_team_excluding(
        &self,
        team_name: &str,
        exclude_user_id: &str,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = ? AND is_active = 1 AND user_id != ?
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .bind(exclude_user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        sqlx::query_as(
            r#"
            UPDATE users SET is_active = ?
            WHERE user_id = ?
            RETURNING user_id, username, team_name, is_active
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UserNotFound)
    }

    async fn get_team_of_user(&self, user_id: &str) -> Result<String, AppError> {
        sqlx::query_scalar("SELECT team_name FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}
