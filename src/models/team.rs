//! Team model and the bulk-deactivation report.

use serde::{Deserialize, Serialize};

use super::User;

/// A team member as carried in a team payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }

    /// Attach the member to a team, producing the stored user shape.
    pub fn into_user(self, team_name: &str) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            team_name: team_name.to_string(),
            is_active: self.is_active,
        }
    }
}

impl From<User> for TeamMember {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

/// A team with its members.
///
/// `team_name` is both the unique key and the identity. Members are ordered
/// by `user_id` when read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

impl Team {
    pub fn new(team_name: impl Into<String>, members: Vec<TeamMember>) -> Self {
        Self {
            team_name: team_name.into(),
            members,
        }
    }
}

/// Outcome of deactivating every active member of a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDeactivationResult {
    pub team_name: String,

    /// Number of users switched to inactive.
    pub deactivated_users: usize,

    /// IDs of the users switched to inactive, in deactivation order.
    pub deactivated_user_ids: Vec<String>,

    /// Open PRs whose team reviewers were all replaced.
    pub reassigned_prs: usize,

    /// Open PRs where at least one team reviewer could not be replaced.
    pub failed_reassignments: usize,
}

impl TeamDeactivationResult {
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            ..Self::default()
        }
    }

    /// True if at least one PR migration failed.
    pub fn is_partial(&self) -> bool {
        self.failed_reassignments > 0
    }
}
