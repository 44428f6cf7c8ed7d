//! Application error types.
//!
//! Every orchestrator returns these errors unchanged, and the HTTP layer maps
//! them to a status code through [`AppError::kind`] and to a wire code through
//! [`AppError::code`].

use serde::Serialize;
use thiserror::Error;

use crate::models::TeamDeactivationResult;

/// Coarse classification used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or malformed input.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request conflicts with current state.
    Conflict,
    /// Infrastructure failure that stopped a workflow midway.
    Fatal,
    /// Mixed outcome; the error carries a usable result.
    PartialSuccess,
    /// Storage or unexpected failure.
    Internal,
}

/// Application-level errors.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    #[error("invalid pull request id")]
    InvalidPrId,

    #[error("invalid pull request name")]
    InvalidPrName,

    #[error("invalid user id")]
    InvalidUserId,

    #[error("invalid team name")]
    InvalidTeamName,

    #[error("team must have members")]
    TeamMustHaveMembers,

    /// Request payload could not be decoded.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("user not found")]
    UserNotFound,

    #[error("team not found")]
    TeamNotFound,

    #[error("pull request not found")]
    PrNotFound,

    #[error("pull request author not found")]
    PrAuthorNotFound,

    #[error("team already exists")]
    TeamAlreadyExists,

    #[error("pull request already exists")]
    PrAlreadyExists,

    #[error("pull request already merged")]
    PrAlreadyMerged,

    #[error("reviewer not assigned to this pull request")]
    ReviewerNotAssigned,

    #[error("no active reviewer candidate available")]
    NoReviewerCandidate,

    #[error("no active users in team")]
    NoActiveUsersInTeam,

    /// A user could not be deactivated; users handled before the failure stay
    /// deactivated.
    #[error("team deactivation failed: {message}")]
    TeamDeactivationFailed { message: String },

    /// Some PR migrations failed. The populated result is carried along.
    #[error(
        "partial reassignment: {} of {} pull requests could not be migrated",
        result.failed_reassignments,
        result.failed_reassignments + result.reassigned_prs
    )]
    PartialReassignment { result: Box<TeamDeactivationResult> },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn deactivation_failed(message: impl Into<String>) -> Self {
        Self::TeamDeactivationFailed {
            message: message.into(),
        }
    }

    pub fn partial_reassignment(result: TeamDeactivationResult) -> Self {
        Self::PartialReassignment {
            result: Box::new(result),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPrId
            | Self::InvalidPrName
            | Self::InvalidUserId
            | Self::InvalidTeamName
            | Self::TeamMustHaveMembers
            | Self::InvalidRequest { .. } => ErrorKind::Validation,
            Self::UserNotFound | Self::TeamNotFound | Self::PrNotFound | Self::PrAuthorNotFound => {
                ErrorKind::NotFound
            }
            Self::TeamAlreadyExists
            | Self::PrAlreadyExists
            | Self::PrAlreadyMerged
            | Self::ReviewerNotAssigned
            | Self::NoReviewerCandidate
            | Self::NoActiveUsersInTeam => ErrorKind::Conflict,
            Self::TeamDeactivationFailed { .. } => ErrorKind::Fatal,
            Self::PartialReassignment { .. } => ErrorKind::PartialSuccess,
            Self::Database { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Stable code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TeamAlreadyExists => "TEAM_EXISTS",
            Self::PrAlreadyExists => "PR_EXISTS",
            Self::PrAlreadyMerged => "PR_MERGED",
            Self::ReviewerNotAssigned => "NOT_ASSIGNED",
            Self::NoReviewerCandidate => "NO_CANDIDATE",
            Self::NoActiveUsersInTeam => "NO_ACTIVE_USERS",
            Self::TeamDeactivationFailed { .. } => "DEACTIVATION_FAILED",
            Self::PartialReassignment { .. } => "PARTIAL_REASSIGNMENT",
            Self::UserNotFound | Self::TeamNotFound | Self::PrNotFound | Self::PrAuthorNotFound => {
                "NOT_FOUND"
            }
            Self::InvalidPrId
            | Self::InvalidPrName
            | Self::InvalidUserId
            | Self::InvalidTeamName
            | Self::TeamMustHaveMembers
            | Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::Database { .. } | Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Check if this error means "the entity is absent".
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The deactivation result carried by a partial-success error.
    pub fn partial_result(&self) -> Option<&TeamDeactivationResult> {
        match self {
            Self::PartialReassignment { result } => Some(result),
            _ => None,
        }
    }

    /// Take ownership of the deactivation result carried by a partial-success error.
    pub fn into_partial_result(self) -> Option<TeamDeactivationResult> {
        match self {
            Self::PartialReassignment { result } => Some(*result),
            _ => None,
        }
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}
