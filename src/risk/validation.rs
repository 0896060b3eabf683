//! Reduction validation: residual risk must be strictly below initial risk.
//!
//! Errors block persistence; warnings are advisory and never change `is_valid`.

use super::factor::FactorError;
use super::level::HIGH_RISK_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Default minimum length of the corrective-measures text (trimmed, in characters).
pub const MIN_CORRECTIVE_MEASURES_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A factor outside `MIN_FACTOR..=MAX_FACTOR`.
    InvalidFactorRange,
    /// Residual score not strictly below the initial score.
    IneffectiveMitigation,
    /// Corrective-measures text too short or blank.
    InsufficientJustification,
    /// Both scores above the statutory ceiling. Warning only.
    ElevatedResidualRisk,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::InvalidFactorRange => "invalid_factor_range",
            IssueKind::IneffectiveMitigation => "ineffective_mitigation",
            IssueKind::InsufficientJustification => "insufficient_justification",
            IssueKind::ElevatedResidualRisk => "elevated_residual_risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(kind: IssueKind, message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Issue for a bad factor; `stage` is the triple it came from (`initial`/`residual`).
    pub fn from_factor_error(stage: &str, err: &FactorError) -> Self {
        let FactorError::InvalidFactorRange { factor, .. } = err;
        Self::with_field(
            IssueKind::InvalidFactorRange,
            format!("{} {}", stage, err),
            format!("{}_factors.{}", stage, factor),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
            warnings: vec![],
        }
    }

    pub fn failure(error: ValidationIssue) -> Self {
        Self {
            is_valid: false,
            errors: vec![error],
            warnings: vec![],
        }
    }

    pub fn push_error(&mut self, error: ValidationIssue) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn push_warning(&mut self, warning: ValidationIssue) {
        self.warnings.push(warning);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_error(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn has_warning(&self, kind: IssueKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    /// Error messages joined into one line.
    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            return "no errors".to_string();
        }
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Rule A (hard): residual < initial. Rule B (advisory): both above the ceiling.
pub fn validate_reduction(initial_score: u32, residual_score: u32) -> ValidationResult {
    let mut result = ValidationResult::success();

    if residual_score >= initial_score {
        result.push_error(ValidationIssue::with_field(
            IssueKind::IneffectiveMitigation,
            format!(
                "residual risk R={} is not lower than initial risk Ri={}; corrective measures must reduce the risk",
                residual_score, initial_score
            ),
            "residual_factors",
        ));
    }

    if initial_score > HIGH_RISK_THRESHOLD && residual_score > HIGH_RISK_THRESHOLD {
        result.push_warning(ValidationIssue::with_field(
            IssueKind::ElevatedResidualRisk,
            format!(
                "residual risk R={} remains above {}; further corrective measures are recommended",
                residual_score, HIGH_RISK_THRESHOLD
            ),
            "residual_factors",
        ));
    }

    result
}

/// Blank text is always rejected, whatever `min_chars` is set to.
pub fn validate_corrective_measures(text: &str, min_chars: usize) -> ValidationResult {
    let min_chars = min_chars.max(1);
    let len = text.trim().chars().count();
    if len < min_chars {
        return ValidationResult::failure(ValidationIssue::with_field(
            IssueKind::InsufficientJustification,
            format!(
                "corrective measures must describe the mitigation in at least {} characters, got {}",
                min_chars, len
            ),
            "corrective_measures",
        ));
    }
    ValidationResult::success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::factor::FactorKind;

    #[test]
    fn equal_scores_fail() {
        let r = validate_reduction(60, 60);
        assert!(!r.is_valid);
        assert!(r.has_error(IssueKind::IneffectiveMitigation));
    }

    #[test]
    fn one_below_passes() {
        let r = validate_reduction(60, 59);
        assert!(r.is_valid);
        assert!(r.errors.is_empty());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn any_non_reduction_fails() {
        for initial in 1..=216u32 {
            for residual in [initial, initial + 1, initial + 50] {
                assert!(!validate_reduction(initial, residual).is_valid);
            }
        }
    }

    #[test]
    fn elevated_residual_warns_but_passes() {
        let r = validate_reduction(150, 72);
        assert!(r.is_valid);
        assert!(r.has_warning(IssueKind::ElevatedResidualRisk));
    }

    #[test]
    fn residual_at_ceiling_does_not_warn() {
        let r = validate_reduction(120, 70);
        assert!(r.is_valid);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn initial_high_residual_medium_has_no_warning() {
        let r = validate_reduction(120, 60);
        assert!(r.is_valid);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn ineffective_and_elevated_together() {
        let r = validate_reduction(80, 90);
        assert!(!r.is_valid);
        assert!(r.has_error(IssueKind::IneffectiveMitigation));
        assert!(r.has_warning(IssueKind::ElevatedResidualRisk));
    }

    #[test]
    fn minimum_factors_reduce_from_anything_higher() {
        for initial in 2..=216 {
            assert!(validate_reduction(initial, 1).is_valid);
        }
        assert!(!validate_reduction(1, 1).is_valid);
    }

    #[test]
    fn corrective_measures_length() {
        let min = MIN_CORRECTIVE_MEASURES_CHARS;
        assert!(!validate_corrective_measures("", min).is_valid);
        assert!(!validate_corrective_measures("            ", min).is_valid);
        assert!(!validate_corrective_measures("  helmet  ", min).is_valid);
        assert!(validate_corrective_measures("Obuka zaposlenih i zaštitne rukavice", min).is_valid);
        // counted in characters, not bytes
        assert!(validate_corrective_measures("ђђђђђђђђђђ", min).is_valid);
        assert!(!validate_corrective_measures("ђђђђђ", min).is_valid);
    }

    #[test]
    fn zero_minimum_still_rejects_blank() {
        assert!(!validate_corrective_measures("   ", 0).is_valid);
        assert!(!validate_corrective_measures("", 0).is_valid);
        assert!(validate_corrective_measures("x", 0).is_valid);
    }

    #[test]
    fn merge_keeps_both_sides() {
        let mut r = validate_reduction(150, 80);
        r.merge(validate_corrective_measures("x", MIN_CORRECTIVE_MEASURES_CHARS));
        assert!(!r.is_valid);
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.warnings.len(), 1);
        assert!(r.has_error(IssueKind::InsufficientJustification));
    }

    #[test]
    fn factor_error_issue_names_field() {
        let err = FactorError::InvalidFactorRange {
            factor: FactorKind::Frequency,
            value: 0,
        };
        let issue = ValidationIssue::from_factor_error("residual", &err);
        assert_eq!(issue.kind, IssueKind::InvalidFactorRange);
        assert_eq!(issue.field.as_deref(), Some("residual_factors.frequency"));
        assert!(issue.message.contains("got 0"));
    }

    #[test]
    fn summary_joins_messages() {
        let mut r = ValidationResult::success();
        assert_eq!(r.summary(), "no errors");
        r.push_error(ValidationIssue::new(IssueKind::InvalidFactorRange, "a"));
        r.push_error(ValidationIssue::new(IssueKind::InsufficientJustification, "b"));
        assert_eq!(r.summary(), "a; b");
    }
}
