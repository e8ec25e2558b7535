//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::ActivityStatus;

/// Main error type for Tempo
///
/// Domain variants are expected, recoverable-by-caller conditions and carry
/// enough structure to render a precise user-facing message. The
/// `SessionAlreadyOpen` / `NoOpenSession` pair indicates an internal
/// consistency violation that the atomic transition guard should prevent;
/// callers must treat those as fatal rather than resolve them silently.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum TempoError {
    #[error("transition from '{from}' to '{to}' is not allowed")]
    InvalidTransition { from: ActivityStatus, to: ActivityStatus },

    #[error("collaborator already has activity {active_activity_id} in progress")]
    AlreadyActive { active_activity_id: Uuid },

    #[error("{remaining} subtask(s) still incomplete")]
    IncompleteSubtasks { remaining: usize },

    #[error("cannot subtract {requested_seconds}s from a total of {available_seconds}s")]
    InsufficientTime { requested_seconds: i64, available_seconds: i64 },

    #[error("invalid retroactive range: {0}")]
    InvalidRetroactiveRange(String),

    #[error("invalid session interval: {0}")]
    InvalidInterval(String),

    #[error("activity {activity_id} already has an open session")]
    SessionAlreadyOpen { activity_id: Uuid },

    #[error("activity {activity_id} has no open session")]
    NoOpenSession { activity_id: Uuid },

    #[error("activity is locked in status '{status}'")]
    ActivityLocked { status: ActivityStatus },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Tempo operations
pub type Result<T> = std::result::Result<T, TempoError>;
