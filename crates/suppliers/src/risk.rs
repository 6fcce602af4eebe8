//! Weighted supplier risk score.
//!
//! `risk = 100 - (on_time*w1 + quality*w2 + price*w3 + responsiveness*w4 +
//! compliance*w5)`, clamped to [0, 100]. The level is taken from the
//! unrounded score; only the stored score is rounded to two decimals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{aggregate_id, DomainError, DomainResult, VendorId};

use crate::policy::RiskPolicy;

aggregate_id!(
    /// Identifier of one assessment row in the risk history.
    RiskScoreId
);

/// Five performance signals, each on a 0-100 scale (higher is better).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    pub on_time_delivery_rate: f64,
    pub quality_score: f64,
    pub price_competitiveness: f64,
    pub responsiveness: f64,
    pub compliance_score: f64,
}

impl RiskSignals {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("on_time_delivery_rate", self.on_time_delivery_rate),
            ("quality_score", self.quality_score),
            ("price_competitiveness", self.price_competitiveness),
            ("responsiveness", self.responsiveness),
            ("compliance_score", self.compliance_score),
        ]
    }

    /// Reject signals that are not finite or fall outside [0, 100].
    pub fn validate(&self) -> DomainResult<()> {
        for (name, value) in self.named() {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(DomainError::validation(format!(
                    "{name} must be within [0, 100] (got {value})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Score `signals` under `policy`.
pub fn assess(signals: &RiskSignals, policy: &RiskPolicy) -> DomainResult<RiskAssessment> {
    signals.validate()?;
    let w = &policy.weights;
    let performance = signals.on_time_delivery_rate * w.on_time
        + signals.quality_score * w.quality
        + signals.price_competitiveness * w.price
        + signals.responsiveness * w.responsiveness
        + signals.compliance_score * w.compliance;

    // Trim float noise from the weighted sum so an exact band edge stays on the edge.
    let raw = ((100.0 - performance).clamp(0.0, 100.0) * 1e9).round() / 1e9;
    let risk_score = (raw * 100.0).round() / 100.0;

    let t = &policy.thresholds;
    let risk_level = if raw < t.medium {
        RiskLevel::Low
    } else if raw < t.high {
        RiskLevel::Medium
    } else if raw < t.critical {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    };

    Ok(RiskAssessment {
        risk_score,
        risk_level,
    })
}

/// One row of a vendor's risk history. Never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub id: RiskScoreId,
    pub vendor_id: VendorId,
    #[serde(flatten)]
    pub signals: RiskSignals,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub assessment_date: DateTime<Utc>,
}

impl RiskScore {
    pub fn new(
        id: RiskScoreId,
        vendor_id: VendorId,
        signals: RiskSignals,
        assessment: RiskAssessment,
        assessment_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            vendor_id,
            signals,
            risk_score: assessment.risk_score,
            risk_level: assessment.risk_level,
            assessment_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signals(on_time: f64, quality: f64, price: f64, responsiveness: f64, compliance: f64) -> RiskSignals {
        RiskSignals {
            on_time_delivery_rate: on_time,
            quality_score: quality,
            price_competitiveness: price,
            responsiveness,
            compliance_score: compliance,
        }
    }

    #[test]
    fn strong_vendor_is_low_risk() {
        let a = assess(&signals(90.0, 80.0, 70.0, 85.0, 100.0), &RiskPolicy::default()).unwrap();
        assert_eq!(a.risk_score, 15.25);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn band_edges_belong_to_the_upper_band() {
        let policy = RiskPolicy::default();
        let level = |perf: f64| assess(&signals(perf, perf, perf, perf, perf), &policy).unwrap().risk_level;
        assert_eq!(level(75.0), RiskLevel::Medium); // 25
        assert_eq!(level(50.0), RiskLevel::High); // 50
        assert_eq!(level(25.0), RiskLevel::Critical); // 75
        assert_eq!(level(0.0), RiskLevel::Critical); // 100
        assert_eq!(level(100.0), RiskLevel::Low); // 0
    }

    #[test]
    fn level_comes_from_the_unrounded_score() {
        let policy = RiskPolicy::default();
        let just_below = assess(&signals(75.004, 75.004, 75.004, 75.004, 75.004), &policy).unwrap();
        assert_eq!(just_below.risk_score, 25.0);
        assert_eq!(just_below.risk_level, RiskLevel::Low);

        let below_high = assess(&signals(50.004, 50.004, 50.004, 50.004, 50.004), &policy).unwrap();
        assert_eq!(below_high.risk_score, 50.0);
        assert_eq!(below_high.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn out_of_range_signal_is_rejected() {
        let err = assess(&signals(101.0, 80.0, 70.0, 85.0, 100.0), &RiskPolicy::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("on_time_delivery_rate")));
        assert!(assess(&signals(f64::NAN, 0.0, 0.0, 0.0, 0.0), &RiskPolicy::default()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: any in-range signals produce a score in [0, 100] whose level
        /// matches its band, up to the two-decimal rounding of the stored score.
        #[test]
        fn score_is_bounded_and_level_matches_band(
            a in 0.0f64..=100.0,
            b in 0.0f64..=100.0,
            c in 0.0f64..=100.0,
            d in 0.0f64..=100.0,
            e in 0.0f64..=100.0,
        ) {
            let result = assess(&signals(a, b, c, d, e), &RiskPolicy::default()).unwrap();
            prop_assert!((0.0..=100.0).contains(&result.risk_score));
            let (lo, hi) = match result.risk_level {
                RiskLevel::Low => (0.0, 25.0),
                RiskLevel::Medium => (25.0, 50.0),
                RiskLevel::High => (50.0, 75.0),
                RiskLevel::Critical => (75.0, 100.0),
            };
            prop_assert!(result.risk_score >= lo - 0.005, "{} below {:?}", result.risk_score, result.risk_level);
            prop_assert!(result.risk_score <= hi, "{} above {:?}", result.risk_score, result.risk_level);
        }
    }
}
