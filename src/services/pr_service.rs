//! Pull request workflows: creation with auto-assignment, merge, and
//! reviewer reassignment.

use std::sync::Arc;

use serde::Serialize;

use super::assignment::{self, AssignmentPolicy};
use crate::error::AppError;
use crate::models::PullRequest;
use crate::store::{PrStore, UserStore};

/// Outcome of a successful reviewer swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    /// The pull request as stored after the swap.
    pub pr: PullRequest,
    pub replaced_by: String,
}

pub struct PrService {
    prs: Arc<dyn PrStore>,
    users: Arc<dyn UserStore>,
    policy: AssignmentPolicy,
}

impl PrService {
    pub fn new(prs: Arc<dyn PrStore>, users: Arc<dyn UserStore>, policy: AssignmentPolicy) -> Self {
        Self { prs, users, policy }
    }

    /// Create an open pull request and assign reviewers from the author's team.
    ///
    /// Up to `max_reviewers` active teammates (never the author) are assigned
    /// in the same write as the PR itself.
    pub async fn create_pr(
        &self,
        pull_request_id: &str,
        pull_request_name: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        if pull_request_id.trim().is_empty() {
            return Err(AppError::InvalidPrId);
        }
        if pull_request_name.trim().is_empty() {
            return Err(AppError::InvalidPrName);
        }
        if author_id.trim().is_empty() {
            return Err(AppError::InvalidUserId);
        }

        let author = self.users.get_user(author_id).await.map_err(|e| {
            if e.is_not_found() {
                AppError::PrAuthorNotFound
            } else {
                e
            }
        })?;

        if self.prs.pr_exists(pull_request_id).await? {
            return Err(AppError::PrAlreadyExists);
        }

        let candidates = self
            .users
            .list_active_by_team_excluding(&author.team_name, author_id)
            .await?;
        let reviewers =
            assignment::select_reviewers(&candidates, author_id, self.policy.max_reviewers);
        if reviewers.is_empty() {
            return Err(AppError::NoReviewerCandidate);
        }

        let mut pr = PullRequest::open(pull_request_id, pull_request_name, author_id);
        self.prs.create_with_reviewers(&pr, &reviewers).await?;
        pr.assigned_reviewers = reviewers;

        log::info!(
            "[pr] Created {} by {} with reviewers {:?}",
            pr.pull_request_id,
            pr.author_id,
            pr.assigned_reviewers
        );
        Ok(pr)
    }

    /// Mark a pull request merged. Merging again returns the stored state
    /// with the original merge timestamp.
    pub async fn merge_pr(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        if !self.prs.pr_exists(pull_request_id).await? {
            return Err(AppError::PrNotFound);
        }

        let pr = self.prs.merge(pull_request_id).await?;
        log::info!("[pr] Merged {}", pr.pull_request_id);
        Ok(pr)
    }

    /// Replace one reviewer with an active member of that reviewer's team.
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        let pr = self.prs.get_pr(pull_request_id).await?;
        if pr.is_merged() {
            return Err(AppError::PrAlreadyMerged);
        }

        if !self.prs.is_reviewer(pull_request_id, old_reviewer_id).await? {
            return Err(AppError::ReviewerNotAssigned);
        }

        let team_name = self.users.get_team_of_user(old_reviewer_id).await?;
        let candidates = self
            .users
            .list_active_by_team_excluding(&team_name, &pr.author_id)
            .await?;

        // The outgoing reviewer and the other current reviewers are not eligible.
        let mut excluded: Vec<&str> = pr.assigned_reviewers.iter().map(String::as_str).collect();
        excluded.push(old_reviewer_id);
        excluded.push(&pr.author_id);

        let new_reviewer_id = assignment::pick_replacement(&candidates, &excluded)
            .ok_or(AppError::NoReviewerCandidate)?;

        self.prs
            .reassign_reviewer(pull_request_id, old_reviewer_id, &new_reviewer_id)
            .await?;

        let updated = self.prs.get_pr(pull_request_id).await?;
        log::info!(
            "[pr] Reassigned {} on {} to {}",
            old_reviewer_id,
            pull_request_id,
            new_reviewer_id
        );
        Ok(Reassignment {
            pr: updated,
            replaced_by: new_reviewer_id,
        })
    }
}
