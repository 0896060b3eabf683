//! Score → severity tier. The only place the 36/70 boundaries are defined.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest score still classified as low risk.
pub const LOW_RISK_CEILING: u32 = 36;
/// Statutory ceiling: scores strictly above it are high risk.
pub const HIGH_RISK_THRESHOLD: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn classify(score: u32) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score > LOW_RISK_CEILING {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Label printed in the "Akt o proceni rizika" document.
    pub fn label_sr(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Низак",
            RiskLevel::Medium => "Средњи",
            RiskLevel::High => "Висок",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_high_risk(score: u32) -> bool {
    score > HIGH_RISK_THRESHOLD
}
