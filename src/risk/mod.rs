//! E × P × F occupational risk scoring and mandatory-reduction validation.
//!
//! - [`factor`] — factors and the score calculator
//! - [`level`] — Low/Medium/High classification and the high-risk ceiling
//! - [`validation`] — reduction and corrective-measures rules
//! - [`engine`] — runs all of the above over caller input

pub mod engine;
pub mod factor;
pub mod level;
pub mod validation;

pub use engine::{AssessmentDraft, PreviewRequest, RiskEngine, RiskEvaluation, RiskPreview};
pub use factor::{
    calculate_risk, FactorError, FactorKind, RawFactors, RiskFactor, RiskFactors, MAX_FACTOR,
    MIN_FACTOR,
};
pub use level::{is_high_risk, RiskLevel, HIGH_RISK_THRESHOLD, LOW_RISK_CEILING};
pub use validation::{
    validate_corrective_measures, validate_reduction, IssueKind, ValidationIssue,
    ValidationResult, MIN_CORRECTIVE_MEASURES_CHARS,
};
