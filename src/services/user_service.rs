//! User workflows.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::{PullRequestShort, User};
use crate::store::{PrStore, UserStore};

pub struct UserService {
    users: Arc<dyn UserStore>,
    prs: Arc<dyn PrStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, prs: Arc<dyn PrStore>) -> Self {
        Self { users, prs }
    }

    /// Flip a user's active flag.
    ///
    /// Existing reviewer assignments are left alone.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        self.users.get_user(user_id).await?;
        let user = self.users.set_active(user_id, is_active).await?;
        log::info!("[user] {} is_active={}", user.user_id, user.is_active);
        Ok(user)
    }

    /// Every PR the user currently reviews, open or merged.
    pub async fn get_user_review_prs(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        self.users.get_user(user_id).await?;
        self.prs.list_prs_reviewed_by(user_id).await
    }
}
