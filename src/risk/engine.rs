//! Runs calculator, classifier and validator over raw caller input.
//! The persistence guard and the preview query both go through `score_pair`.

use super::factor::{RawFactors, RiskFactors};
use super::level::{is_high_risk, RiskLevel};
use super::validation::{
    validate_corrective_measures, validate_reduction, ValidationIssue, ValidationResult,
};
use crate::config::RiskConfig;
use crate::error::AssessmentError;
use serde::{Deserialize, Serialize};

/// Everything a caller submits for scoring: both triples and the mitigation text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentDraft {
    pub initial_factors: RawFactors,
    pub residual_factors: RawFactors,
    pub corrective_measures: String,
}

/// Preview input: just the two triples, the mitigation text is not needed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub initial_factors: RawFactors,
    pub residual_factors: RawFactors,
}

/// A draft that passed validation, with derived scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskEvaluation {
    pub initial_factors: RiskFactors,
    pub residual_factors: RiskFactors,
    pub initial_score: u32,
    pub residual_score: u32,
    pub initial_level: RiskLevel,
    pub residual_level: RiskLevel,
    pub is_high_risk: bool,
    /// Advisory findings; never block persistence
    pub warnings: Vec<ValidationIssue>,
}

/// Outcome of a preview: scores when the factors were in range, plus the full validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskPreview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_high_risk: Option<bool>,
    pub validation: ValidationResult,
}

struct ScoredPair {
    initial: RiskFactors,
    residual: RiskFactors,
}

impl ScoredPair {
    fn initial_score(&self) -> u32 {
        self.initial.score()
    }

    fn residual_score(&self) -> u32 {
        self.residual.score()
    }
}

fn score_pair(initial: RawFactors, residual: RawFactors) -> (Option<ScoredPair>, ValidationResult) {
    let mut result = ValidationResult::success();

    let initial = RiskFactors::from_raw(initial).map_err(|errs| {
        for e in &errs {
            result.push_error(ValidationIssue::from_factor_error("initial", e));
        }
    });
    let residual = RiskFactors::from_raw(residual).map_err(|errs| {
        for e in &errs {
            result.push_error(ValidationIssue::from_factor_error("residual", e));
        }
    });

    match (initial, residual) {
        (Ok(initial), Ok(residual)) => {
            let pair = ScoredPair { initial, residual };
            result.merge(validate_reduction(pair.initial_score(), pair.residual_score()));
            (Some(pair), result)
        }
        _ => (None, result),
    }
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Full pre-persistence check. Any error rejects the draft with every issue found.
    pub fn evaluate(&self, draft: &AssessmentDraft) -> Result<RiskEvaluation, AssessmentError> {
        let (pair, mut result) = score_pair(draft.initial_factors, draft.residual_factors);
        result.merge(validate_corrective_measures(
            &draft.corrective_measures,
            self.config.min_corrective_measures_chars,
        ));

        match pair {
            Some(pair) if result.is_valid => {
                let initial_score = pair.initial_score();
                let residual_score = pair.residual_score();
                Ok(RiskEvaluation {
                    initial_factors: pair.initial,
                    residual_factors: pair.residual,
                    initial_score,
                    residual_score,
                    initial_level: RiskLevel::classify(initial_score),
                    residual_level: RiskLevel::classify(residual_score),
                    is_high_risk: is_high_risk(initial_score) || is_high_risk(residual_score),
                    warnings: result.warnings,
                })
            }
            _ => Err(AssessmentError::Rejected(result)),
        }
    }

    /// Score and validate the two triples without the corrective-measures check.
    pub fn preview(&self, initial: RawFactors, residual: RawFactors) -> RiskPreview {
        let (pair, validation) = score_pair(initial, residual);
        match pair {
            Some(pair) => {
                let initial_score = pair.initial_score();
                let residual_score = pair.residual_score();
                RiskPreview {
                    initial_score: Some(initial_score),
                    residual_score: Some(residual_score),
                    initial_level: Some(RiskLevel::classify(initial_score)),
                    residual_level: Some(RiskLevel::classify(residual_score)),
                    is_high_risk: Some(is_high_risk(initial_score) || is_high_risk(residual_score)),
                    validation,
                }
            }
            None => RiskPreview {
                initial_score: None,
                residual_score: None,
                initial_level: None,
                residual_level: None,
                is_high_risk: None,
                validation,
            },
        }
    }
}
