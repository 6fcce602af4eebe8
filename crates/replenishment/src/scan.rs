//! Reorder-point scan.
//!
//! A product needs replenishment when its current stock is at or below the
//! reorder point. The suggestion is EOQ rounded up, but never less than the
//! gap to the reorder point.

use serde::{Deserialize, Serialize};

use stockpact_core::{ProductId, WarehouseId};

use crate::eoq::{EoqDetails, EoqInputs};

/// Which figure counts as "current stock" in the scan.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBasis {
    #[default]
    OnHand,
    Atp,
}

/// Everything the scan needs to know about one product, already resolved
/// from the catalog, stock provider and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentCandidate {
    pub product_id: ProductId,
    pub product_name: String,
    pub warehouse_id: Option<WarehouseId>,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub safety_stock: i64,
    pub max_stock_level: Option<i64>,
    pub eoq_inputs: Option<EoqInputs>,
}

/// Transient scan result. Not persisted; see `ReplenishmentRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentAlert {
    pub product_id: ProductId,
    pub product_name: String,
    pub warehouse_id: Option<WarehouseId>,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub safety_stock: i64,
    pub suggested_qty: i64,
    pub eoq_details: Option<EoqDetails>,
}

pub fn needs_replenishment(current_stock: i64, reorder_point: i64) -> bool {
    current_stock <= reorder_point
}

/// Suggested order size in whole units.
///
/// Without usable EOQ inputs the base is `max_stock_level - current_stock`
/// when a max level is set, else twice the reorder point.
pub fn suggested_quantity(
    current_stock: i64,
    reorder_point: i64,
    max_stock_level: Option<i64>,
    eoq: Option<&EoqDetails>,
) -> i64 {
    let base = match (eoq, max_stock_level) {
        (Some(details), _) => details.eoq_units(),
        (None, Some(max)) if max > 0 => max - current_stock,
        (None, _) => reorder_point.saturating_mul(2),
    };
    let gap = reorder_point - current_stock;
    base.max(gap).max(0)
}

/// Alert for `candidate`, or `None` when stock is above the reorder point.
pub fn evaluate(candidate: &ReplenishmentCandidate) -> Option<ReplenishmentAlert> {
    if !needs_replenishment(candidate.current_stock, candidate.reorder_point) {
        return None;
    }
    let eoq_details = candidate.eoq_inputs.as_ref().and_then(EoqInputs::details);
    let suggested_qty = suggested_quantity(
        candidate.current_stock,
        candidate.reorder_point,
        candidate.max_stock_level,
        eoq_details.as_ref(),
    );

    Some(ReplenishmentAlert {
        product_id: candidate.product_id,
        product_name: candidate.product_name.clone(),
        warehouse_id: candidate.warehouse_id,
        current_stock: candidate.current_stock,
        reorder_point: candidate.reorder_point,
        safety_stock: candidate.safety_stock,
        suggested_qty,
        eoq_details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(current_stock: i64, reorder_point: i64, eoq_inputs: Option<EoqInputs>) -> ReplenishmentCandidate {
        ReplenishmentCandidate {
            product_id: ProductId::new(),
            product_name: "Copper wire 2mm".to_string(),
            warehouse_id: None,
            current_stock,
            reorder_point,
            safety_stock: 0,
            max_stock_level: None,
            eoq_inputs,
        }
    }

    #[test]
    fn eoq_dominates_small_gap() {
        let alert = evaluate(&candidate(5, 20, Some(EoqInputs::new(1200.0, 50.0, 2.0)))).unwrap();
        assert_eq!(alert.suggested_qty, 245);
        let eoq = alert.eoq_details.unwrap();
        assert_eq!((eoq.annual_demand, eoq.ordering_cost, eoq.holding_cost), (1200.0, 50.0, 2.0));
    }

    #[test]
    fn gap_dominates_small_eoq() {
        // EOQ = sqrt(2 * 10 * 1 / 5) = 2
        let alert = evaluate(&candidate(-40, 20, Some(EoqInputs::new(10.0, 1.0, 5.0)))).unwrap();
        assert_eq!(alert.suggested_qty, 60);
    }

    #[test]
    fn at_reorder_point_triggers_above_does_not() {
        assert!(evaluate(&candidate(20, 20, None)).is_some());
        assert!(evaluate(&candidate(21, 20, None)).is_none());
    }

    #[test]
    fn fallback_without_eoq_inputs() {
        let mut c = candidate(5, 20, None);
        assert_eq!(evaluate(&c).unwrap().suggested_qty, 40);

        c.max_stock_level = Some(100);
        let alert = evaluate(&c).unwrap();
        assert_eq!(alert.suggested_qty, 95);
        assert!(alert.eoq_details.is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: ordering the suggestion always lifts stock to at least the reorder point.
        #[test]
        fn suggestion_never_leaves_stock_below_reorder_point(
            current in -1_000i64..1_000,
            reorder_point in 0i64..2_000,
            demand in 0.0f64..100_000.0,
            ordering in 0.0f64..500.0,
            holding in 0.0f64..50.0,
            max_level in prop::option::of(0i64..5_000),
        ) {
            let mut c = candidate(current, reorder_point, Some(EoqInputs::new(demand, ordering, holding)));
            c.max_stock_level = max_level;
            if let Some(alert) = evaluate(&c) {
                prop_assert!(alert.current_stock.saturating_add(alert.suggested_qty) >= alert.reorder_point);
                prop_assert!(alert.suggested_qty >= 0);
            } else {
                prop_assert!(current > reorder_point);
            }
        }
    }
}
