//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user who can author pull requests and review them.
///
/// Team affiliation is a name reference only; the team's member list is
/// projected from this column at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// Name of the team this user belongs to.
    pub team_name: String,

    /// Whether the user can currently be picked as a reviewer.
    pub is_active: bool,
}

impl User {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
        }
    }
}
