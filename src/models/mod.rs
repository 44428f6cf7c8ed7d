//! Data models for the application.
//!
//! These models represent the entities stored in the SQLite database and
//! exchanged with HTTP clients.
//!
//! Row types derive FromRow for SQLx queries; everything derives Serialize.

pub mod pull_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestRow, PullRequestShort, PullRequestStatus};
pub use stats::{PrAssignmentStat, ReviewStat};
pub use team::{Team, TeamDeactivationResult, TeamMember};
pub use user::User;
