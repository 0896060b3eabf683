//! Persistence collaborator for validated risk assessments.
//!
//! Stores never compute scores themselves, but they refuse any record whose
//! scores were not produced from its factors.

mod memory;
mod sqlite;

pub use memory::InMemoryAssessmentStore;
pub use sqlite::SqliteAssessmentStore;

use crate::assessment::RiskAssessment;
use crate::error::StoreError;
use crate::types::{AssessmentId, PositionId};
use chrono::{DateTime, Utc};

pub trait AssessmentStore: Send + Sync {
    /// Insert a new record. Fails with `Duplicate` if the id exists.
    fn insert(&self, assessment: &RiskAssessment) -> Result<(), StoreError>;

    /// Replace a live record. Fails with `NotFound` if missing or soft-deleted.
    fn update(&self, assessment: &RiskAssessment) -> Result<(), StoreError>;

    /// Live record by id; soft-deleted records are `None`.
    fn get(&self, id: AssessmentId) -> Result<Option<RiskAssessment>, StoreError>;

    /// Live records of a position, oldest first.
    fn list_by_position(&self, position_id: PositionId) -> Result<Vec<RiskAssessment>, StoreError>;

    /// Stamp `deleted_at`. Fails with `NotFound` if missing or already deleted.
    fn soft_delete(&self, id: AssessmentId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Write guard shared by all stores: scores derived from the factors, and the
/// residual strictly below the initial.
pub fn check_scores(assessment: &RiskAssessment) -> Result<(), StoreError> {
    let (id, initial_score, residual_score) =
        (assessment.id, assessment.initial_score, assessment.residual_score);
    if !assessment.is_consistent() {
        return Err(StoreError::ScoreMismatch {
            id,
            initial_score,
            residual_score,
        });
    }
    if residual_score >= initial_score {
        return Err(StoreError::NoReduction {
            id,
            initial_score,
            residual_score,
        });
    }
    Ok(())
}
