//! Data context for the "Akt o proceni rizika" document: one table of risks per
//! work position plus the overall distribution summary. Field names follow the
//! document template placeholders (`ei`, `ri`, `riskLevel`, `summary.highRiskCount`, ...).

use crate::access::Actor;
use crate::assessment::{AssessmentService, RiskAssessment};
use crate::error::Result;
use crate::risk::RiskLevel;
use crate::types::{HazardId, PositionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One assessed hazard, with the display name the document prints.
#[derive(Debug, Clone)]
pub struct NamedAssessment {
    pub hazard_name: String,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Clone)]
pub struct PositionAssessments {
    pub position_name: String,
    pub risks: Vec<NamedAssessment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRow {
    pub hazard_name: String,
    pub ei: u8,
    pub pi: u8,
    pub fi: u8,
    pub ri: u32,
    pub initial_risk_level: &'static str,
    pub corrective_measures: String,
    pub e: u8,
    pub p: u8,
    pub f: u8,
    pub r: u32,
    pub risk_level: &'static str,
    pub is_high_risk: bool,
}

impl RiskRow {
    fn new(hazard_name: &str, a: &RiskAssessment) -> Self {
        Self {
            hazard_name: hazard_name.to_string(),
            ei: a.initial_factors.effect.value(),
            pi: a.initial_factors.probability.value(),
            fi: a.initial_factors.frequency.value(),
            ri: a.initial_score,
            initial_risk_level: a.initial_level().label_sr(),
            corrective_measures: a.corrective_measures.clone(),
            e: a.residual_factors.effect.value(),
            p: a.residual_factors.probability.value(),
            f: a.residual_factors.frequency.value(),
            r: a.residual_score,
            risk_level: a.residual_level().label_sr(),
            is_high_risk: a.is_high_risk,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub position_name: String,
    pub risks: Vec<RiskRow>,
    pub has_high_risk: bool,
}

/// Distribution is counted on the residual score R.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_positions: usize,
    pub total_risks: usize,
    pub low_risk_count: usize,
    pub medium_risk_count: usize,
    pub high_risk_count: usize,
    /// Comma-separated names; empty when no position is high risk
    pub high_risk_positions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskReport {
    pub positions: Vec<PositionReport>,
    pub summary: ReportSummary,
}

impl RiskReport {
    /// Soft-deleted assessments are left out.
    pub fn build(positions: &[PositionAssessments]) -> Self {
        let mut summary = ReportSummary {
            total_positions: positions.len(),
            ..Default::default()
        };
        let mut high_risk_names = Vec::new();

        let positions = positions
            .iter()
            .map(|pos| {
                let risks: Vec<RiskRow> = pos
                    .risks
                    .iter()
                    .filter(|r| !r.assessment.is_deleted())
                    .map(|r| {
                        match r.assessment.residual_level() {
                            RiskLevel::Low => summary.low_risk_count += 1,
                            RiskLevel::Medium => summary.medium_risk_count += 1,
                            RiskLevel::High => summary.high_risk_count += 1,
                        }
                        RiskRow::new(&r.hazard_name, &r.assessment)
                    })
                    .collect();
                summary.total_risks += risks.len();
                let has_high_risk = risks.iter().any(|r| r.is_high_risk);
                if has_high_risk {
                    high_risk_names.push(pos.position_name.clone());
                }
                PositionReport {
                    position_name: pos.position_name.clone(),
                    risks,
                    has_high_risk,
                }
            })
            .collect();

        summary.high_risk_positions = high_risk_names.join(", ");
        Self { positions, summary }
    }
}

/// Which positions to include and how to name them and their hazards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub positions: Vec<PositionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRequest {
    pub position_id: PositionId,
    pub position_name: String,
    #[serde(default)]
    pub hazards: HashMap<HazardId, String>,
}

/// Load every requested position's live assessments through the service and build the report.
/// Hazards without a configured name are printed by id.
pub fn collect(
    service: &AssessmentService,
    actor: &Actor,
    request: &ReportRequest,
) -> Result<RiskReport> {
    let mut positions = Vec::with_capacity(request.positions.len());
    for pos in &request.positions {
        let risks = service
            .list_for_position(actor, pos.position_id)?
            .into_iter()
            .map(|assessment| NamedAssessment {
                hazard_name: pos
                    .hazards
                    .get(&assessment.hazard_id)
                    .cloned()
                    .unwrap_or_else(|| assessment.hazard_id.to_string()),
                assessment,
            })
            .collect();
        positions.push(PositionAssessments {
            position_name: pos.position_name.clone(),
            risks,
        });
    }
    Ok(RiskReport::build(&positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::PermitAll;
    use crate::assessment::NewAssessment;
    use crate::risk::{AssessmentDraft, RawFactors, RiskEngine};
    use crate::storage::InMemoryAssessmentStore;
    use std::sync::Arc;

    fn service() -> AssessmentService {
        AssessmentService::new(
            RiskEngine::default(),
            Arc::new(InMemoryAssessmentStore::new()),
            Arc::new(PermitAll),
        )
    }

    fn create(
        svc: &AssessmentService,
        position: PositionId,
        hazard: HazardId,
        initial: (i64, i64, i64),
        residual: (i64, i64, i64),
    ) -> RiskAssessment {
        svc.create(
            &Actor::local(),
            NewAssessment {
                position_id: position,
                hazard_id: hazard,
                draft: AssessmentDraft {
                    initial_factors: RawFactors::new(initial.0, initial.1, initial.2),
                    residual_factors: RawFactors::new(residual.0, residual.1, residual.2),
                    corrective_measures: "Redovna obuka i lična zaštitna oprema".to_string(),
                },
                responsible_person: None,
                deadline: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn summary_counts_by_residual_level() {
        let svc = service();
        let welder = PositionId::new();
        let clerk = PositionId::new();
        let fumes = HazardId::new();
        let screen = HazardId::new();

        // 120 -> 60: high-risk flag, residual medium
        create(&svc, welder, fumes, (6, 4, 5), (6, 2, 5));
        // 216 -> 72: residual high
        create(&svc, welder, HazardId::new(), (6, 6, 6), (6, 6, 2));
        // 24 -> 12: low
        create(&svc, clerk, screen, (2, 3, 4), (1, 3, 4));

        let request = ReportRequest {
            positions: vec![
                PositionRequest {
                    position_id: welder,
                    position_name: "Zavarivač".to_string(),
                    hazards: HashMap::from([(fumes, "Zavarivački dim".to_string())]),
                },
                PositionRequest {
                    position_id: clerk,
                    position_name: "Administrativni radnik".to_string(),
                    hazards: HashMap::from([(screen, "Rad sa ekranom".to_string())]),
                },
            ],
        };
        let report = collect(&svc, &Actor::local(), &request).unwrap();

        assert_eq!(report.summary.total_positions, 2);
        assert_eq!(report.summary.total_risks, 3);
        assert_eq!(report.summary.low_risk_count, 1);
        assert_eq!(report.summary.medium_risk_count, 1);
        assert_eq!(report.summary.high_risk_count, 1);
        assert_eq!(report.summary.high_risk_positions, "Zavarivač");

        let welder_rows = &report.positions[0].risks;
        assert!(report.positions[0].has_high_risk);
        assert!(!report.positions[1].has_high_risk);
        let fumes_row = welder_rows.iter().find(|r| r.hazard_name == "Zavarivački dim").unwrap();
        assert_eq!((fumes_row.ei, fumes_row.pi, fumes_row.fi, fumes_row.ri), (6, 4, 5, 120));
        assert_eq!((fumes_row.e, fumes_row.p, fumes_row.f, fumes_row.r), (6, 2, 5, 60));
        assert_eq!(fumes_row.initial_risk_level, "Висок");
        assert_eq!(fumes_row.risk_level, "Средњи");
        assert!(fumes_row.is_high_risk);
        // unnamed hazard falls back to its id
        assert!(welder_rows.iter().any(|r| r.hazard_name.len() == 36));
    }

    #[test]
    fn deleted_assessments_are_left_out() {
        let svc = service();
        let position = PositionId::new();
        let a = create(&svc, position, HazardId::new(), (4, 3, 5), (4, 2, 5));
        let mut deleted = a.clone();
        deleted.deleted_at = Some(chrono::Utc::now());

        let report = RiskReport::build(&[PositionAssessments {
            position_name: "Magacioner".to_string(),
            risks: vec![
                NamedAssessment {
                    hazard_name: "Teret".to_string(),
                    assessment: a,
                },
                NamedAssessment {
                    hazard_name: "Teret (staro)".to_string(),
                    assessment: deleted,
                },
            ],
        }]);
        assert_eq!(report.summary.total_risks, 1);
        assert_eq!(report.positions[0].risks[0].hazard_name, "Teret");
        assert_eq!(report.summary.high_risk_positions, "");
    }

    #[test]
    fn serializes_with_template_field_names() {
        let report = RiskReport::build(&[]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["totalPositions"], 0);
        assert_eq!(json["summary"]["highRiskCount"], 0);
        assert!(json["positions"].as_array().unwrap().is_empty());
    }
}
