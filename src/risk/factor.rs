//! E × P × F factors and the score calculator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest valid ordinal value of any factor.
pub const MIN_FACTOR: u8 = 1;
/// Highest valid ordinal value of any factor.
pub const MAX_FACTOR: u8 = 6;

/// Which of the three factors a value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// E: severity of the harm outcome.
    Effect,
    /// P: likelihood that the hazard occurs.
    Probability,
    /// F: frequency of exposure.
    Frequency,
}

impl FactorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::Effect => "effect",
            FactorKind::Probability => "probability",
            FactorKind::Frequency => "frequency",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FactorError {
    #[error("{factor} must be between {min} and {max}, got {value}", min = MIN_FACTOR, max = MAX_FACTOR)]
    InvalidFactorRange { factor: FactorKind, value: i64 },
}

/// One ordinal factor, guaranteed to lie in `MIN_FACTOR..=MAX_FACTOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RiskFactor(u8);

impl RiskFactor {
    pub fn new(factor: FactorKind, value: i64) -> Result<Self, FactorError> {
        if (MIN_FACTOR as i64..=MAX_FACTOR as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(FactorError::InvalidFactorRange { factor, value })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Score of a single E/P/F triple. Exact product, no rounding or clamping.
pub fn calculate_risk(effect: RiskFactor, probability: RiskFactor, frequency: RiskFactor) -> u32 {
    effect.0 as u32 * probability.0 as u32 * frequency.0 as u32
}

/// Unchecked factor triple as supplied by a caller (form, JSON file, API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFactors {
    pub effect: i64,
    pub probability: i64,
    pub frequency: i64,
}

impl RawFactors {
    pub fn new(effect: i64, probability: i64, frequency: i64) -> Self {
        Self {
            effect,
            probability,
            frequency,
        }
    }
}

/// Validated E/P/F triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskFactors {
    pub effect: RiskFactor,
    pub probability: RiskFactor,
    pub frequency: RiskFactor,
}

impl RiskFactors {
    pub fn new(effect: RiskFactor, probability: RiskFactor, frequency: RiskFactor) -> Self {
        Self {
            effect,
            probability,
            frequency,
        }
    }

    /// Check every factor; all out-of-range values are reported, not just the first.
    pub fn from_raw(raw: RawFactors) -> Result<Self, Vec<FactorError>> {
        let effect = RiskFactor::new(FactorKind::Effect, raw.effect);
        let probability = RiskFactor::new(FactorKind::Probability, raw.probability);
        let frequency = RiskFactor::new(FactorKind::Frequency, raw.frequency);
        match (effect, probability, frequency) {
            (Ok(e), Ok(p), Ok(f)) => Ok(Self::new(e, p, f)),
            (e, p, f) => Err([e.err(), p.err(), f.err()].into_iter().flatten().collect()),
        }
    }

    pub fn score(&self) -> u32 {
        calculate_risk(self.effect, self.probability, self.frequency)
    }
}

impl From<RiskFactors> for RawFactors {
    fn from(f: RiskFactors) -> Self {
        RawFactors::new(
            f.effect.value() as i64,
            f.probability.value() as i64,
            f.frequency.value() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(kind: FactorKind, v: i64) -> RiskFactor {
        RiskFactor::new(kind, v).unwrap()
    }

    fn triple(e: i64, p: i64, fr: i64) -> (RiskFactor, RiskFactor, RiskFactor) {
        (
            f(FactorKind::Effect, e),
            f(FactorKind::Probability, p),
            f(FactorKind::Frequency, fr),
        )
    }

    #[test]
    fn score_is_exact_product_over_whole_domain() {
        for e in 1..=6 {
            for p in 1..=6 {
                for fr in 1..=6 {
                    let (a, b, c) = triple(e, p, fr);
                    let first = calculate_risk(a, b, c);
                    assert_eq!(first as i64, e * p * fr);
                    assert_eq!(first, calculate_risk(a, b, c));
                }
            }
        }
    }

    #[test]
    fn score_is_commutative() {
        for (x, y, z) in [(1, 2, 3), (6, 4, 5), (2, 2, 6), (5, 1, 3)] {
            let (a, b, c) = triple(x, y, z);
            let base = calculate_risk(a, b, c);
            assert_eq!(base, calculate_risk(c, b, a));
            assert_eq!(base, calculate_risk(b, a, c));
            assert_eq!(base, calculate_risk(a, c, b));
        }
    }

    #[test]
    fn bounds_of_domain() {
        let (a, b, c) = triple(1, 1, 1);
        assert_eq!(calculate_risk(a, b, c), 1);
        let (a, b, c) = triple(6, 6, 6);
        assert_eq!(calculate_risk(a, b, c), 216);
    }

    #[test]
    fn out_of_range_is_rejected_not_clamped() {
        for v in [0, 7, -1, 100] {
            assert_eq!(
                RiskFactor::new(FactorKind::Probability, v),
                Err(FactorError::InvalidFactorRange {
                    factor: FactorKind::Probability,
                    value: v
                })
            );
        }
    }

    #[test]
    fn from_raw_reports_every_bad_factor() {
        let errs = RiskFactors::from_raw(RawFactors::new(0, 3, 9)).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.contains(&FactorError::InvalidFactorRange {
            factor: FactorKind::Effect,
            value: 0
        }));
        assert!(errs.contains(&FactorError::InvalidFactorRange {
            factor: FactorKind::Frequency,
            value: 9
        }));
    }

    #[test]
    fn error_message_names_factor_and_value() {
        let err = RiskFactor::new(FactorKind::Effect, 7).unwrap_err();
        assert_eq!(err.to_string(), "effect must be between 1 and 6, got 7");
    }

    #[test]
    fn raw_roundtrip_through_validated() {
        let raw = RawFactors::new(4, 3, 5);
        let factors = RiskFactors::from_raw(raw).unwrap();
        assert_eq!(factors.score(), 60);
        assert_eq!(RawFactors::from(factors), raw);
    }
}
