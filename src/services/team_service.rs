//! Team workflows, including bulk deactivation with reviewer hand-off.

use std::sync::Arc;

use super::assignment::{self, AssignmentPolicy};
use crate::error::AppError;
use crate::models::{Team, TeamDeactivationResult};
use crate::store::{PrStore, TeamStore, UserStore};

/// Outcome of migrating one PR's reviewers.
enum Migration {
    Migrated,
    /// Merged after the open PRs were listed.
    Skipped,
}

pub struct TeamService {
    teams: Arc<dyn TeamStore>,
    users: Arc<dyn UserStore>,
    prs: Arc<dyn PrStore>,
    policy: AssignmentPolicy,
}

impl TeamService {
    pub fn new(
        teams: Arc<dyn TeamStore>,
        users: Arc<dyn UserStore>,
        prs: Arc<dyn PrStore>,
        policy: AssignmentPolicy,
    ) -> Self {
        Self {
            teams,
            users,
            prs,
            policy,
        }
    }

    /// Create a team and upsert its members.
    ///
    /// Returns the team as stored, so members that already existed show their
    /// preserved username and active flag.
    pub async fn create_team(&self, team: Team) -> Result<Team, AppError> {
        if team.team_name.trim().is_empty() {
            return Err(AppError::InvalidTeamName);
        }
        if team.members.is_empty() {
            return Err(AppError::TeamMustHaveMembers);
        }
        if team.members.iter().any(|m| m.user_id.trim().is_empty()) {
            return Err(AppError::InvalidUserId);
        }
        if self.teams.team_exists(&team.team_name).await? {
            return Err(AppError::TeamAlreadyExists);
        }

        self.teams.create_team(&team).await?;
        log::info!(
            "[team] Created {} with {} members",
            team.team_name,
            team.members.len()
        );
        self.teams.get_team(&team.team_name).await
    }

    pub async fn get_team(&self, team_name: &str) -> Result<Team, AppError> {
        if !self.teams.team_exists(team_name).await? {
            return Err(AppError::TeamNotFound);
        }
        self.teams.get_team(team_name).await
    }

    /// Deactivate every active member of a team and move their open reviews
    /// to members of other teams.
    ///
    /// Users are deactivated first; a failure there stops the workflow and
    /// users already handled stay inactive. Each open PR is then migrated on
    /// its own. When any PR cannot be fully migrated the populated result is
    /// returned inside [`AppError::PartialReassignment`].
    pub async fn deactivate_team_users(
        &self,
        team_name: &str,
    ) -> Result<TeamDeactivationResult, AppError> {
        if team_name.trim().is_empty() {
            return Err(AppError::InvalidTeamName);
        }
        if !self.teams.team_exists(team_name).await? {
            return Err(AppError::TeamNotFound);
        }

        let active = self.teams.list_active_members(team_name).await?;
        if active.is_empty() {
            return Err(AppError::NoActiveUsersInTeam);
        }

        let open_prs = self.teams.list_open_prs_with_team_reviewers(team_name).await?;
        log::info!(
            "[team] Deactivating {} users of {}, {} open PRs affected",
            active.len(),
            team_name,
            open_prs.len()
        );

        let mut result = TeamDeactivationResult::new(team_name);
        for user in &active {
            if let Err(e) = self.users.set_active(&user.user_id, false).await {
                log::error!(
                    "[team] Failed to deactivate {} after {} users: {}",
                    user.user_id,
                    result.deactivated_users,
                    e
                );
                return Err(AppError::deactivation_failed(format!(
                    "user {}: {}",
                    user.user_id, e
                )));
            }
            result.deactivated_users += 1;
            result.deactivated_user_ids.push(user.user_id.clone());
        }

        for pr_id in &open_prs {
            match self.migrate_pr(pr_id, team_name).await {
                Ok(Migration::Migrated) => result.reassigned_prs += 1,
                Ok(Migration::Skipped) => {
                    log::info!("[team] {} was merged meanwhile, reviewers kept", pr_id);
                }
                Err(e) => {
                    log::warn!("[team] Could not migrate reviewers of {}: {}", pr_id, e);
                    result.failed_reassignments += 1;
                }
            }
        }

        if result.is_partial() {
            log::warn!(
                "[team] Deactivated {}: {} PRs migrated, {} failed",
                team_name,
                result.reassigned_prs,
                result.failed_reassignments
            );
            return Err(AppError::partial_reassignment(result));
        }

        log::info!(
            "[team] Deactivated {}: {} PRs migrated",
            team_name,
            result.reassigned_prs
        );
        Ok(result)
    }

    /// Replace every reviewer of `pr_id` who belongs to `team_name`.
    ///
    /// Swaps made before an error are kept. A PR merged since it was listed
    /// is left untouched.
    async fn migrate_pr(&self, pr_id: &str, team_name: &str) -> Result<Migration, AppError> {
        let pr = self.prs.get_pr(pr_id).await?;
        if pr.is_merged() {
            return Ok(Migration::Skipped);
        }

        let outgoing = self.teams.list_pr_reviewers_from_team(pr_id, team_name).await?;
        if outgoing.is_empty() {
            return Ok(Migration::Migrated);
        }

        let mut excluded: Vec<&str> = pr.assigned_reviewers.iter().map(String::as_str).collect();
        excluded.push(&pr.author_id);

        let pool = self.replacement_pool(team_name, &excluded).await?;
        if pool.is_empty() {
            return Err(AppError::NoReviewerCandidate);
        }

        let pairing = assignment::pair_replacements(&outgoing, &pool);
        for (old, new) in &pairing.pairs {
            self.prs.reassign_reviewer(pr_id, old, new).await?;
            log::debug!("[team] {}: {} -> {}", pr_id, old, new);
        }

        if !pairing.unmatched.is_empty() {
            return Err(AppError::NoReviewerCandidate);
        }
        Ok(Migration::Migrated)
    }

    /// Active users of every other team, in team-name order, up to the pool cap.
    async fn replacement_pool(
        &self,
        exclude_team: &str,
        excluded: &[&str],
    ) -> Result<Vec<String>, AppError> {
        let cap = self.policy.replacement_pool_cap;
        let mut pool = Vec::new();
        if cap == 0 {
            return Ok(pool);
        }

        for name in self.teams.list_team_names().await? {
            if name == exclude_team {
                continue;
            }
            let members = match self.teams.list_active_members(&name).await {
                Ok(members) => members,
                Err(e) => {
                    log::warn!("[team] Skipping {} while building replacement pool: {}", name, e);
                    continue;
                }
            };
            if assignment::extend_pool(&mut pool, &members, excluded, cap) {
                break;
            }
        }
        Ok(pool)
    }
}
