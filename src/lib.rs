//! BZR risk engine: occupational risk assessment scoring and validation.
//!
//! Modular structure:
//! - [`risk`] — E × P × F calculator, Low/Medium/High classifier, reduction validator
//! - [`assessment`] — validated create/update/soft-delete/preview lifecycle
//! - [`storage`] — persistence collaborator (in-memory and SQLite)
//! - [`access`] — ownership/authorization collaborator
//! - [`report`] — data context for the risk assessment document
//! - [`logging`] — Structured JSON logging

pub mod access;
pub mod assessment;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod risk;
pub mod storage;
pub mod types;

pub use access::{AccessPolicy, Action, Actor};
pub use assessment::{AssessmentService, AssessmentUpdate, NewAssessment, RiskAssessment};
pub use config::EngineConfig;
pub use error::{AssessmentError, StoreError};
pub use logging::StructuredLogger;
pub use risk::{
    calculate_risk, validate_reduction, AssessmentDraft, RiskEngine, RiskLevel, ValidationResult,
};
pub use storage::{AssessmentStore, InMemoryAssessmentStore, SqliteAssessmentStore};
pub use types::{AssessmentId, HazardId, PositionId, TenantId};
