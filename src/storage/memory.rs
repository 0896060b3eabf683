//! In-process store backed by a map; same write guard as the SQLite store.

use super::{check_scores, AssessmentStore};
use crate::assessment::RiskAssessment;
use crate::error::StoreError;
use crate::types::{AssessmentId, PositionId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Map-backed store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryAssessmentStore {
    records: Mutex<HashMap<AssessmentId, RiskAssessment>>,
}

impl InMemoryAssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<AssessmentId, RiskAssessment>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl AssessmentStore for InMemoryAssessmentStore {
    fn insert(&self, assessment: &RiskAssessment) -> Result<(), StoreError> {
        check_scores(assessment)?;
        let mut records = self.records()?;
        if records.contains_key(&assessment.id) {
            return Err(StoreError::Duplicate(assessment.id));
        }
        records.insert(assessment.id, assessment.clone());
        Ok(())
    }

    fn update(&self, assessment: &RiskAssessment) -> Result<(), StoreError> {
        check_scores(assessment)?;
        let mut records = self.records()?;
        match records.get_mut(&assessment.id) {
            Some(existing) if !existing.is_deleted() => {
                *existing = assessment.clone();
                Ok(())
            }
            _ => Err(StoreError::NotFound(assessment.id)),
        }
    }

    fn get(&self, id: AssessmentId) -> Result<Option<RiskAssessment>, StoreError> {
        Ok(self.records()?.get(&id).filter(|a| !a.is_deleted()).cloned())
    }

    fn list_by_position(&self, position_id: PositionId) -> Result<Vec<RiskAssessment>, StoreError> {
        let mut out: Vec<RiskAssessment> = self
            .records()?
            .values()
            .filter(|a| a.position_id == position_id && !a.is_deleted())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn soft_delete(&self, id: AssessmentId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut records = self.records()?;
        match records.get_mut(&id) {
            Some(existing) if !existing.is_deleted() => {
                existing.deleted_at = Some(at);
                Ok(())
            }
            _ => Err(StoreError::NotFound(id)),
        }
    }
}
