//! Risk assessment lifecycle: validated create/update, soft delete, preview.
//!
//! Every write goes through [`RiskEngine::evaluate`]; scores are always derived
//! from factors and never taken from the caller.

use crate::access::{AccessPolicy, Action, Actor};
use crate::error::{AssessmentError, Result};
use crate::risk::{
    is_high_risk, AssessmentDraft, RawFactors, RiskEngine, RiskEvaluation, RiskFactors,
    RiskLevel, RiskPreview,
};
use crate::storage::AssessmentStore;
use crate::types::{AssessmentId, HazardId, PositionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Persisted risk assessment of one hazard at one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub id: AssessmentId,
    pub position_id: PositionId,
    pub hazard_id: HazardId,
    pub initial_factors: RiskFactors,
    pub residual_factors: RiskFactors,
    pub initial_score: u32,
    pub residual_score: u32,
    pub corrective_measures: String,
    pub is_high_risk: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RiskAssessment {
    fn from_evaluation(
        id: AssessmentId,
        position_id: PositionId,
        hazard_id: HazardId,
        eval: RiskEvaluation,
        corrective_measures: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            position_id,
            hazard_id,
            initial_factors: eval.initial_factors,
            residual_factors: eval.residual_factors,
            initial_score: eval.initial_score,
            residual_score: eval.residual_score,
            corrective_measures,
            is_high_risk: eval.is_high_risk,
            responsible_person: None,
            deadline: None,
            created_at,
            updated_at,
            deleted_at: None,
        }
    }

    pub fn initial_level(&self) -> RiskLevel {
        RiskLevel::classify(self.initial_score)
    }

    pub fn residual_level(&self) -> RiskLevel {
        RiskLevel::classify(self.residual_score)
    }

    /// True when scores and the high-risk flag are exactly what the factors produce.
    pub fn is_consistent(&self) -> bool {
        let initial = self.initial_factors.score();
        let residual = self.residual_factors.score();
        self.initial_score == initial
            && self.residual_score == residual
            && self.is_high_risk == (is_high_risk(initial) || is_high_risk(residual))
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn draft(&self) -> AssessmentDraft {
        AssessmentDraft {
            initial_factors: self.initial_factors.into(),
            residual_factors: self.residual_factors.into(),
            corrective_measures: self.corrective_measures.clone(),
        }
    }
}

/// Create request from the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssessment {
    pub position_id: PositionId,
    pub hazard_id: HazardId,
    #[serde(flatten)]
    pub draft: AssessmentDraft,
    #[serde(default)]
    pub responsible_person: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentUpdate {
    pub initial_factors: Option<RawFactors>,
    pub residual_factors: Option<RawFactors>,
    pub corrective_measures: Option<String>,
    pub responsible_person: Option<String>,
    pub deadline: Option<NaiveDate>,
}

impl AssessmentUpdate {
    fn apply_to(&self, mut draft: AssessmentDraft) -> AssessmentDraft {
        if let Some(f) = self.initial_factors {
            draft.initial_factors = f;
        }
        if let Some(f) = self.residual_factors {
            draft.residual_factors = f;
        }
        if let Some(m) = &self.corrective_measures {
            draft.corrective_measures = m.clone();
        }
        draft
    }
}

pub struct AssessmentService {
    engine: RiskEngine,
    store: Arc<dyn AssessmentStore>,
    policy: Arc<dyn AccessPolicy>,
}

impl AssessmentService {
    pub fn new(
        engine: RiskEngine,
        store: Arc<dyn AssessmentStore>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            engine,
            store,
            policy,
        }
    }

    fn authorize(&self, actor: &Actor, action: Action, position_id: PositionId) -> Result<()> {
        if self.policy.is_permitted(actor, action, position_id) {
            Ok(())
        } else {
            warn!(user_id = %actor.user_id, %action, %position_id, "access denied");
            Err(AssessmentError::Forbidden {
                action,
                position_id,
            })
        }
    }

    fn evaluate(&self, draft: &AssessmentDraft, position_id: PositionId) -> Result<RiskEvaluation> {
        self.engine.evaluate(draft).map_err(|e| {
            if let Some(v) = e.validation() {
                warn!(%position_id, errors = %v.summary(), "risk assessment rejected");
            }
            e
        })
    }

    fn log_warnings(id: AssessmentId, eval: &RiskEvaluation) {
        for w in &eval.warnings {
            warn!(assessment_id = %id, kind = w.kind.as_str(), "{}", w.message);
        }
    }

    pub fn create(&self, actor: &Actor, input: NewAssessment) -> Result<RiskAssessment> {
        self.authorize(actor, Action::Create, input.position_id)?;
        let eval = self.evaluate(&input.draft, input.position_id)?;

        let id = AssessmentId::new();
        let now = Utc::now();
        Self::log_warnings(id, &eval);
        let mut assessment = RiskAssessment::from_evaluation(
            id,
            input.position_id,
            input.hazard_id,
            eval,
            input.draft.corrective_measures,
            now,
            now,
        );
        assessment.responsible_person = input.responsible_person;
        assessment.deadline = input.deadline;

        self.store.insert(&assessment)?;
        info!(
            assessment_id = %assessment.id,
            position_id = %assessment.position_id,
            initial_score = assessment.initial_score,
            residual_score = assessment.residual_score,
            is_high_risk = assessment.is_high_risk,
            "risk assessment created"
        );
        Ok(assessment)
    }

    /// Apply changes, recompute both scores and re-validate before writing.
    pub fn update(
        &self,
        actor: &Actor,
        id: AssessmentId,
        changes: AssessmentUpdate,
    ) -> Result<RiskAssessment> {
        let current = self.store.get(id)?.ok_or(AssessmentError::NotFound(id))?;
        self.authorize(actor, Action::Update, current.position_id)?;

        let draft = changes.apply_to(current.draft());
        let eval = self.evaluate(&draft, current.position_id)?;
        Self::log_warnings(id, &eval);

        let mut updated = RiskAssessment::from_evaluation(
            id,
            current.position_id,
            current.hazard_id,
            eval,
            draft.corrective_measures,
            current.created_at,
            Utc::now(),
        );
        updated.responsible_person = changes.responsible_person.or(current.responsible_person);
        updated.deadline = changes.deadline.or(current.deadline);

        self.store.update(&updated)?;
        info!(
            assessment_id = %id,
            initial_score = updated.initial_score,
            residual_score = updated.residual_score,
            is_high_risk = updated.is_high_risk,
            "risk assessment updated"
        );
        Ok(updated)
    }

    pub fn get(&self, actor: &Actor, id: AssessmentId) -> Result<RiskAssessment> {
        let assessment = self.store.get(id)?.ok_or(AssessmentError::NotFound(id))?;
        self.authorize(actor, Action::Read, assessment.position_id)?;
        Ok(assessment)
    }

    pub fn list_for_position(
        &self,
        actor: &Actor,
        position_id: PositionId,
    ) -> Result<Vec<RiskAssessment>> {
        self.authorize(actor, Action::Read, position_id)?;
        Ok(self.store.list_by_position(position_id)?)
    }

    /// Soft delete: the record is stamped, not removed.
    pub fn delete(&self, actor: &Actor, id: AssessmentId) -> Result<()> {
        let assessment = self.store.get(id)?.ok_or(AssessmentError::NotFound(id))?;
        self.authorize(actor, Action::Delete, assessment.position_id)?;
        self.store.soft_delete(id, Utc::now())?;
        info!(assessment_id = %id, position_id = %assessment.position_id, "risk assessment deleted");
        Ok(())
    }

    /// Same scoring and reduction rules as `create`, without writing anything.
    pub fn preview(&self, initial: RawFactors, residual: RawFactors) -> RiskPreview {
        self.engine.preview(initial, residual)
    }
}
