//! Error types for the assessment lifecycle and its persistence layer.

use crate::access::Action;
use crate::risk::ValidationResult;
use crate::types::{AssessmentId, PositionId};
use thiserror::Error;

/// Errors raised by an [`AssessmentStore`](crate::storage::AssessmentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("encryption error: {0}")]
    Crypto(String),

    /// Stored scores disagree with the stored factors.
    #[error("assessment {id}: scores {initial_score}/{residual_score} were not derived from its factors")]
    ScoreMismatch {
        id: AssessmentId,
        initial_score: u32,
        residual_score: u32,
    },

    /// Residual score not strictly below the initial score.
    #[error("assessment {id}: residual score {residual_score} does not reduce initial score {initial_score}")]
    NoReduction {
        id: AssessmentId,
        initial_score: u32,
        residual_score: u32,
    },

    #[error("assessment {0} already exists")]
    Duplicate(AssessmentId),

    #[error("assessment {0} not found")]
    NotFound(AssessmentId),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Errors returned to the presentation layer.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Input failed validation. Carries every error and warning found.
    #[error("risk assessment rejected: {}", .0.summary())]
    Rejected(ValidationResult),

    #[error("not permitted to {action} assessments of position {position_id}")]
    Forbidden {
        action: Action,
        position_id: PositionId,
    },

    #[error("risk assessment {0} not found")]
    NotFound(AssessmentId),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AssessmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AssessmentError::NotFound(id),
            other => AssessmentError::Store(other),
        }
    }
}

impl AssessmentError {
    /// Validation outcome, when the error is a rejection.
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            AssessmentError::Rejected(v) => Some(v),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssessmentError>;
