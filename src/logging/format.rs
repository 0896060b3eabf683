//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::assessment::RiskAssessment;
use crate::error::AssessmentError;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Audit record of one lifecycle outcome.
#[derive(Debug, Serialize)]
pub struct LogEvent<'a> {
    pub ts: String,
    pub level: &'a str,
    pub action: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_high_risk: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<&'a str>,
}

impl<'a> LogEvent<'a> {
    pub fn accepted(action: &'a str, a: &'a RiskAssessment) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            level: "info",
            action,
            message: format!("risk assessment {} accepted", action),
            assessment_id: Some(a.id.to_string()),
            position_id: Some(a.position_id.to_string()),
            initial_score: Some(a.initial_score),
            residual_score: Some(a.residual_score),
            risk_level: Some(a.residual_level().as_str()),
            is_high_risk: Some(a.is_high_risk),
            issues: vec![],
        }
    }

    pub fn failed(action: &'a str, err: &'a AssessmentError) -> Self {
        let issues = err
            .validation()
            .map(|v| v.errors.iter().map(|e| e.kind.as_str()).collect())
            .unwrap_or_default();
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            level: "warn",
            action,
            message: err.to_string(),
            assessment_id: None,
            position_id: None,
            initial_score: None,
            residual_score: None,
            risk_level: None,
            is_high_risk: None,
            issues,
        }
    }
}

/// Initialize tracing with JSON format (one JSON object per line)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr, level from RUST_LOG or default.
    /// Stdout is left to command output.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured log line (e.g. an audit record) without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
