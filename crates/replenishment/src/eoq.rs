//! Economic Order Quantity.
//!
//! `EOQ = sqrt(2 * D * S / H)` with `D` annual demand, `S` cost per order
//! and `H` annual holding cost per unit.

use serde::{Deserialize, Serialize};

/// Annual holding cost, as stored by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoldingCost {
    PerUnit { amount: f64 },
    /// `H = percent / 100 * unit_cost`.
    PercentOfUnitCost { percent: f64, unit_cost: f64 },
}

impl HoldingCost {
    pub fn per_unit(&self) -> f64 {
        match *self {
            HoldingCost::PerUnit { amount } => amount,
            HoldingCost::PercentOfUnitCost { percent, unit_cost } => percent / 100.0 * unit_cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EoqInputs {
    pub annual_demand: f64,
    pub ordering_cost: f64,
    pub holding_cost: HoldingCost,
}

impl EoqInputs {
    pub fn new(annual_demand: f64, ordering_cost: f64, holding_cost_per_unit: f64) -> Self {
        Self {
            annual_demand,
            ordering_cost,
            holding_cost: HoldingCost::PerUnit {
                amount: holding_cost_per_unit,
            },
        }
    }

    /// Full EOQ breakdown, or `None` when any input is missing, zero,
    /// negative or not finite.
    pub fn details(&self) -> Option<EoqDetails> {
        let d = self.annual_demand;
        let s = self.ordering_cost;
        let h = self.holding_cost.per_unit();
        if ![d, s, h].iter().all(|v| v.is_finite() && *v > 0.0) {
            return None;
        }

        let eoq = (2.0 * d * s / h).sqrt();
        if !eoq.is_finite() {
            return None;
        }
        let orders = d / eoq;
        let total = orders * s + (eoq / 2.0) * h;

        Some(EoqDetails {
            annual_demand: d,
            ordering_cost: s,
            holding_cost: h,
            eoq,
            optimal_orders_per_year: (orders * 10.0).round() / 10.0,
            total_annual_cost: (total * 100.0).round() / 100.0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EoqDetails {
    pub annual_demand: f64,
    pub ordering_cost: f64,
    /// Per unit per year, after resolving percent-of-cost inputs.
    pub holding_cost: f64,
    /// Unrounded; callers round up when turning it into units.
    pub eoq: f64,
    pub optimal_orders_per_year: f64,
    pub total_annual_cost: f64,
}

impl EoqDetails {
    pub fn eoq_units(&self) -> i64 {
        self.eoq.ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_eoq() {
        let details = EoqInputs::new(1200.0, 50.0, 2.0).details().unwrap();
        assert!((details.eoq - 244.948_974).abs() < 1e-5);
        assert_eq!(details.eoq_units(), 245);
        assert_eq!(details.optimal_orders_per_year, 4.9);
        // 4.898979 * 50 + 122.474487 * 2
        assert_eq!(details.total_annual_cost, 489.9);
    }

    #[test]
    fn holding_cost_as_percent_of_unit_cost() {
        let inputs = EoqInputs {
            annual_demand: 1200.0,
            ordering_cost: 50.0,
            holding_cost: HoldingCost::PercentOfUnitCost {
                percent: 20.0,
                unit_cost: 10.0,
            },
        };
        let details = inputs.details().unwrap();
        assert_eq!(details.holding_cost, 2.0);
        assert_eq!(details.eoq_units(), 245);
    }

    #[test]
    fn non_positive_or_non_finite_inputs_yield_none() {
        assert!(EoqInputs::new(0.0, 50.0, 2.0).details().is_none());
        assert!(EoqInputs::new(1200.0, -1.0, 2.0).details().is_none());
        assert!(EoqInputs::new(1200.0, 50.0, 0.0).details().is_none());
        assert!(EoqInputs::new(f64::NAN, 50.0, 2.0).details().is_none());
        assert!(EoqInputs::new(1200.0, 50.0, f64::INFINITY).details().is_none());
    }
}
