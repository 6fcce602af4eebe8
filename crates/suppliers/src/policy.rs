use serde::{Deserialize, Serialize};

use stockpact_core::{DomainError, DomainResult};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Contribution of each signal to the composite performance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub on_time: f64,
    pub quality: f64,
    pub price: f64,
    pub responsiveness: f64,
    pub compliance: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            on_time: 0.35,
            quality: 0.25,
            price: 0.15,
            responsiveness: 0.15,
            compliance: 0.10,
        }
    }
}

impl RiskWeights {
    fn as_array(&self) -> [f64; 5] {
        [self.on_time, self.quality, self.price, self.responsiveness, self.compliance]
    }

    pub fn validate(&self) -> DomainResult<()> {
        let weights = self.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DomainError::validation("risk weights must be finite and non-negative"));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(DomainError::validation(format!("risk weights must sum to 1 (got {sum})")));
        }
        Ok(())
    }
}

/// Lower bounds of the medium/high/critical bands; below `medium` is low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 25.0,
            high: 50.0,
            critical: 75.0,
        }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> DomainResult<()> {
        let ordered = 0.0 <= self.medium
            && self.medium <= self.high
            && self.high <= self.critical
            && self.critical <= 100.0;
        if !ordered {
            return Err(DomainError::validation(
                "risk thresholds must satisfy 0 <= medium <= high <= critical <= 100",
            ));
        }
        Ok(())
    }
}

/// Tunables for scoring and for deriving signals from raw history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub weights: RiskWeights,
    pub thresholds: RiskThresholds,
    pub trailing_window_days: i64,
    /// Average response time that maps to a responsiveness of 0.
    pub max_response_hours: f64,
    /// Value used for a signal that has no underlying data.
    pub neutral_signal: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            thresholds: RiskThresholds::default(),
            trailing_window_days: 365,
            max_response_hours: 168.0,
            neutral_signal: 50.0,
        }
    }
}

impl RiskPolicy {
    pub fn validate(&self) -> DomainResult<()> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        if self.trailing_window_days <= 0 {
            return Err(DomainError::validation("trailing_window_days must be positive"));
        }
        if !(self.max_response_hours.is_finite() && self.max_response_hours > 0.0) {
            return Err(DomainError::validation("max_response_hours must be positive"));
        }
        if !(0.0..=100.0).contains(&self.neutral_signal) {
            return Err(DomainError::validation("neutral_signal must be within [0, 100]"));
        }
        Ok(())
    }
}
