//! Storage gateway contracts.
//!
//! Orchestrators only ever talk to storage through these traits, so the
//! SQLite implementation in [`crate::db`] and the in-memory [`MemoryStore`]
//! are interchangeable.
//!
//! Ordering contract shared by every implementation:
//! - lists of users are ordered by `user_id`
//! - team names and PR id lists are ordered lexicographically
//! - reviewer lists keep assignment order

pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{PrAssignmentStat, PullRequest, PullRequestShort, ReviewStat, Team, User};

pub use memory::MemoryStore;

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Insert the team and upsert every member in one atomic unit.
    ///
    /// An existing user keeps its username and active flag; only its team
    /// affiliation moves to the new team.
    async fn create_team(&self, team: &Team) -> Result<(), AppError>;

    /// Team with all members, including inactive ones.
    async fn get_team(&self, team_name: &str) -> Result<Team, AppError>;

    async fn team_exists(&self, team_name: &str) -> Result<bool, AppError>;

    async fn list_active_members(&self, team_name: &str) -> Result<Vec<User>, AppError>;

    /// IDs of OPEN PRs having at least one reviewer from the team.
    async fn list_open_prs_with_team_reviewers(
        &self,
        team_name: &str,
    ) -> Result<Vec<String>, AppError>;

    /// Reviewers of one PR who belong to the team.
    async fn list_pr_reviewers_from_team(
        &self,
        pull_request_id: &str,
        team_name: &str,
    ) -> Result<Vec<String>, AppError>;

    async fn list_team_names(&self) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`AppError::UserNotFound`] when absent.
    async fn get_user(&self, user_id: &str) -> Result<User, AppError>;

    /// Active users of a team, without `exclude_user_id`.
    async fn list_active_by_team_excluding(
        &self,
        team_name: &str,
        exclude_user_id: &str,
    ) -> Result<Vec<User>, AppError>;

    /// Fails with [`AppError::UserNotFound`] when absent.
    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError>;

    async fn get_team_of_user(&self, user_id: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait PrStore: Send + Sync {
    /// Insert the PR and all reviewer assignments atomically.
    async fn create_with_reviewers(
        &self,
        pr: &PullRequest,
        reviewer_ids: &[String],
    ) -> Result<(), AppError>;

    /// Fails with [`AppError::PrNotFound`] when absent.
    async fn get_pr(&self, pull_request_id: &str) -> Result<PullRequest, AppError>;

    /// Mark the PR merged. The merge timestamp is only set the first time.
    async fn merge(&self, pull_request_id: &str) -> Result<PullRequest, AppError>;

    /// Swap one reviewer assignment for another atomically.
    async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<(), AppError>;

    /// PRs the user currently reviews, whatever their status.
    async fn list_prs_reviewed_by(&self, user_id: &str) -> Result<Vec<PullRequestShort>, AppError>;

    async fn is_reviewer(&self, pull_request_id: &str, user_id: &str) -> Result<bool, AppError>;

    async fn pr_exists(&self, pull_request_id: &str) -> Result<bool, AppError>;

    async fn list_reviewers(&self, pull_request_id: &str) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Review count per user, zero counts included, highest first.
    async fn review_counts_per_user(&self) -> Result<Vec<ReviewStat>, AppError>;

    /// Reviewer count per PR, highest first.
    async fn reviewer_counts_per_pr(&self) -> Result<Vec<PrAssignmentStat>, AppError>;
}
