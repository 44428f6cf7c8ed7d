//! In-memory implementation of every storage gateway.
//!
//! Mirrors the SQLite schema: users keyed by ID, one row per (PR, reviewer)
//! assignment, and the same uniqueness rules. Every write validates first and
//! mutates second while holding the lock, so multi-row writes are atomic.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{PrStore, StatsStore, TeamStore, UserStore};
use crate::error::AppError;
use crate::models::{
    PrAssignmentStat, PullRequest, PullRequestShort, PullRequestStatus, ReviewStat, Team,
    TeamMember, User,
};

#[derive(Debug, Default)]
struct State {
    teams: BTreeSet<String>,
    users: BTreeMap<String, User>,
    prs: BTreeMap<String, PullRequest>,
    /// Assignment rows as (pull_request_id, user_id), in insertion order.
    assignments: Vec<(String, String)>,
}

impl State {
    fn reviewers_of(&self, pull_request_id: &str) -> Vec<String> {
        self.assignments
            .iter()
            .filter(|(pr, _)| pr == pull_request_id)
            .map(|(_, user)| user.clone())
            .collect()
    }

    fn is_assigned(&self, pull_request_id: &str, user_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|(pr, user)| pr == pull_request_id && user == user_id)
    }

    fn pr_with_reviewers(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        let mut pr = self
            .prs
            .get(pull_request_id)
            .cloned()
            .ok_or(AppError::PrNotFound)?;
        pr.assigned_reviewers = self.reviewers_of(pull_request_id);
        Ok(pr)
    }

    fn team_of(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).map(|u| u.team_name.as_str())
    }
}

/// Storage backed by process memory. Used by tests and as a drop-in fake.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create_team(&self, team: &Team) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.teams.contains(&team.team_name) {
            return Err(AppError::TeamAlreadyExists);
        }

        state.teams.insert(team.team_name.clone());
        for member in &team.members {
            match state.users.get_mut(&member.user_id) {
                Some(existing) => existing.team_name = team.team_name.clone(),
                None => {
                    let user = member.clone().into_user(&team.team_name);
                    state.users.insert(user.user_id.clone(), user);
                }
            }
        }
        Ok(())
    }

    async fn get_team(&self, team_name: &str) -> Result<Team, AppError> {
        let state = self.state.lock().await;
        if !state.teams.contains(team_name) {
            return Err(AppError::TeamNotFound);
        }

        let members = state
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .map(TeamMember::from)
            .collect();
        Ok(Team::new(team_name, members))
    }

    async fn team_exists(&self, team_name: &str) -> Result<bool, AppError> {
        Ok(self.state.lock().await.teams.contains(team_name))
    }

    async fn list_active_members(&self, team_name: &str) -> Result<Vec<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.team_name == team_name && u.is_active)
            .cloned()
            .collect())
    }

    async fn list_open_prs_with_team_reviewers(
        &self,
        team_name: &str,
    ) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        let ids: BTreeSet<String> = state
            .assignments
            .iter()
            .filter(|(pr, user)| {
                state.team_of(user) == Some(team_name)
                    && state
                        .prs
                        .get(pr)
                        .is_some_and(|p| p.status == PullRequestStatus::Open)
            })
            .map(|(pr, _)| pr.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn list_pr_reviewers_from_team(
        &self,
        pull_request_id: &str,
        team_name: &str,
    ) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .reviewers_of(pull_request_id)
            .into_iter()
            .filter(|user| state.team_of(user) == Some(team_name))
            .collect())
    }

    async fn list_team_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self.state.lock().await.teams.iter().cloned().collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        self.state
            .lock()
            .await
            .users
            .get(user_id)
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    async fn list_active_by_team_excluding(
        &self,
        team_name: &str,
        exclude_user_id: &str,
    ) -> Result<Vec<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.team_name == team_name && u.is_active && u.user_id != exclude_user_id)
            .cloned()
            .collect())
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(user_id).ok_or(AppError::UserNotFound)?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    async fn get_team_of_user(&self, user_id: &str) -> Result<String, AppError> {
        self.state
            .lock()
            .await
            .team_of(user_id)
            .map(str::to_string)
            .ok_or(AppError::UserNotFound)
    }
}

#[async_trait]
impl PrStore for MemoryStore {
    async fn create_with_reviewers(
        &self,
        pr: &PullRequest,
        reviewer_ids: &[String],
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.prs.contains_key(&pr.pull_request_id) {
            return Err(AppError::PrAlreadyExists);
        }
        if !state.users.contains_key(&pr.author_id) {
            return Err(AppError::PrAuthorNotFound);
        }
        if reviewer_ids.iter().any(|id| !state.users.contains_key(id)) {
            return Err(AppError::UserNotFound);
        }
        let unique: BTreeSet<&String> = reviewer_ids.iter().collect();
        if unique.len() != reviewer_ids.len() {
            return Err(AppError::database_with_op(
                "duplicate reviewer assignment",
                "create_with_reviewers",
            ));
        }

        let mut stored = pr.clone();
        stored.status = PullRequestStatus::Open;
        stored.merged_at = None;
        stored.assigned_reviewers.clear();
        state.prs.insert(stored.pull_request_id.clone(), stored);
        for reviewer in reviewer_ids {
            state
                .assignments
                .push((pr.pull_request_id.clone(), reviewer.clone()));
        }
        Ok(())
    }

    async fn get_pr(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        self.state.lock().await.pr_with_reviewers(pull_request_id)
    }

    async fn merge(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        let mut state = self.state.lock().await;
        let pr = state
            .prs
            .get_mut(pull_request_id)
            .ok_or(AppError::PrNotFound)?;
        pr.status = PullRequestStatus::Merged;
        if pr.merged_at.is_none() {
            pr.merged_at = Some(Utc::now());
        }
        state.pr_with_reviewers(pull_request_id)
    }

    async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let pr = state.prs.get(pull_request_id).ok_or(AppError::PrNotFound)?;
        if pr.is_merged() {
            return Err(AppError::PrAlreadyMerged);
        }
        if !state.is_assigned(pull_request_id, old_reviewer_id) {
            return Err(AppError::ReviewerNotAssigned);
        }
        if !state.users.contains_key(new_reviewer_id) {
            return Err(AppError::UserNotFound);
        }
        if state.is_assigned(pull_request_id, new_reviewer_id) {
            return Err(AppError::database_with_op(
                "reviewer already assigned",
                "reassign_reviewer",
            ));
        }

        state
            .assignments
            .retain(|(pr, user)| !(pr == pull_request_id && user == old_reviewer_id));
        state
            .assignments
            .push((pull_request_id.to_string(), new_reviewer_id.to_string()));
        Ok(())
    }

    async fn list_prs_reviewed_by(&self, user_id: &str) -> Result<Vec<PullRequestShort>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|(_, user)| user == user_id)
            .filter_map(|(pr, _)| state.prs.get(pr))
            .map(PullRequestShort::from)
            .collect())
    }

    async fn is_reviewer(&self, pull_request_id: &str, user_id: &str) -> Result<bool, AppError> {
        Ok(self.state.lock().await.is_assigned(pull_request_id, user_id))
    }

    async fn pr_exists(&self, pull_request_id: &str) -> Result<bool, AppError> {
        Ok(self.state.lock().await.prs.contains_key(pull_request_id))
    }

    async fn list_reviewers(&self, pull_request_id: &str) -> Result<Vec<String>, AppError> {
        Ok(self.state.lock().await.reviewers_of(pull_request_id))
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn review_counts_per_user(&self) -> Result<Vec<ReviewStat>, AppError> {
        let state = self.state.lock().await;
        let mut stats: Vec<ReviewStat> = state
            .users
            .values()
            .map(|u| ReviewStat {
                user_id: u.user_id.clone(),
                username: u.username.clone(),
                review_count: state
                    .assignments
                    .iter()
                    .filter(|(_, user)| *user == u.user_id)
                    .count() as i64,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.review_count
                .cmp(&a.review_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(stats)
    }

    async fn reviewer_counts_per_pr(&self) -> Result<Vec<PrAssignmentStat>, AppError> {
        let state = self.state.lock().await;
        let mut stats: Vec<PrAssignmentStat> = state
            .prs
            .values()
            .map(|pr| PrAssignmentStat {
                pull_request_id: pr.pull_request_id.clone(),
                pull_request_name: pr.pull_request_name.clone(),
                reviewers_count: state.reviewers_of(&pr.pull_request_id).len() as i64,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.reviewers_count
                .cmp(&a.reviewers_count)
                .then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
        });
        Ok(stats)
    }
}
