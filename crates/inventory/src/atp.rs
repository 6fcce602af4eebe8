//! Available-to-promise.
//!
//! `atp = on_hand - reserved + incoming`. The result is signed: a negative
//! value is an oversold position and must be surfaced as a shortage, never
//! clamped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockpact_core::{ProductId, WarehouseId};

use crate::stock::{IncomingOrderLine, StockPosition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtpQuery {
    pub product_id: ProductId,
    /// `None` sums across every warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Ignore incoming lines expected after this date (and undated ones).
    pub horizon: Option<NaiveDate>,
}

impl AtpQuery {
    pub fn product(product_id: ProductId) -> Self {
        Self {
            product_id,
            warehouse_id: None,
            horizon: None,
        }
    }

    pub fn in_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn with_horizon(mut self, horizon: NaiveDate) -> Self {
        self.horizon = Some(horizon);
        self
    }
}

/// One purchase order contributing to `incoming_po_qty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingContribution {
    pub po_number: String,
    pub quantity: i64,
    pub expected_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtpBreakdown {
    pub on_hand: i64,
    pub reserved: i64,
    pub incoming: Vec<IncomingContribution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtpResult {
    pub product_id: ProductId,
    pub warehouse_id: Option<WarehouseId>,
    pub on_hand: i64,
    pub reserved: i64,
    pub incoming_po_qty: i64,
    pub atp_qty: i64,
    /// First date on which the quantity becomes promisable, if any.
    pub atp_date: Option<NaiveDate>,
    pub breakdown: AtpBreakdown,
}

impl AtpResult {
    pub fn is_shortage(&self) -> bool {
        self.atp_qty < 0
    }

    /// Units oversold (zero when not short).
    pub fn shortage_qty(&self) -> i64 {
        (-self.atp_qty).max(0)
    }
}

/// Compute ATP for `query` from already-materialized data.
///
/// `held_reservations` is the quantity held by reservations this core
/// manages itself; it is added on top of the positions' `reserved`.
pub fn calculate_atp(
    query: &AtpQuery,
    positions: &[StockPosition],
    incoming: &[IncomingOrderLine],
    held_reservations: i64,
    today: NaiveDate,
) -> AtpResult {
    let in_scope = |warehouse_id: WarehouseId| match query.warehouse_id {
        Some(w) => w == warehouse_id,
        None => true,
    };

    let (on_hand, position_reserved) = positions
        .iter()
        .filter(|p| p.product_id == query.product_id && in_scope(p.warehouse_id))
        .fold((0i64, 0i64), |(oh, rs), p| (oh + p.on_hand, rs + p.reserved));
    let reserved = position_reserved + held_reservations;

    let mut contributions: Vec<IncomingContribution> = incoming
        .iter()
        .filter(|line| line.product_id == query.product_id)
        .filter(|line| line.status.counts_as_incoming())
        .filter(|line| match (query.warehouse_id, line.warehouse_id) {
            (Some(w), Some(dest)) => w == dest,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .filter(|line| match query.horizon {
            Some(h) => line.expected_date.is_some_and(|d| d <= h),
            None => true,
        })
        .filter(|line| line.outstanding() > 0)
        .map(|line| IncomingContribution {
            po_number: line.po_number.clone(),
            quantity: line.outstanding(),
            expected_date: line.expected_date,
        })
        .collect();

    // Dated lines first, chronologically; undated lines last.
    contributions.sort_by_key(|c| (c.expected_date.is_none(), c.expected_date, c.po_number.clone()));

    let incoming_po_qty: i64 = contributions.iter().map(|c| c.quantity).sum();
    let atp_qty = on_hand - reserved + incoming_po_qty;
    let atp_date = first_promisable_date(atp_qty, on_hand - reserved, &contributions, today);

    AtpResult {
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
        on_hand,
        reserved,
        incoming_po_qty,
        atp_qty,
        atp_date,
        breakdown: AtpBreakdown {
            on_hand,
            reserved,
            incoming: contributions,
        },
    }
}

/// Today whenever the overall ATP is positive; otherwise the arrival date at
/// which cumulative availability first turns positive.
fn first_promisable_date(
    atp_qty: i64,
    net_on_hand: i64,
    contributions: &[IncomingContribution],
    today: NaiveDate,
) -> Option<NaiveDate> {
    if atp_qty > 0 {
        return Some(today);
    }
    let mut cumulative = net_on_hand;
    for c in contributions {
        let Some(date) = c.expected_date else { continue };
        cumulative += c.quantity;
        if cumulative > 0 {
            return Some(date.max(today));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::IncomingLineStatus;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn position(product_id: ProductId, warehouse_id: WarehouseId, on_hand: i64, reserved: i64) -> StockPosition {
        StockPosition {
            product_id,
            warehouse_id,
            on_hand,
            reserved,
        }
    }

    fn line(product_id: ProductId, po: &str, qty: i64, date: Option<NaiveDate>, status: IncomingLineStatus) -> IncomingOrderLine {
        IncomingOrderLine {
            po_number: po.to_string(),
            product_id,
            warehouse_id: None,
            quantity: qty,
            received_quantity: 0,
            expected_date: date,
            status,
        }
    }

    #[test]
    fn on_hand_minus_reserved_plus_incoming() {
        let product = ProductId::new();
        let wh = WarehouseId::new();
        let result = calculate_atp(
            &AtpQuery::product(product),
            &[position(product, wh, 100, 30)],
            &[line(product, "PO-1", 40, Some(day(20)), IncomingLineStatus::Confirmed)],
            0,
            day(1),
        );
        assert_eq!(result.atp_qty, 110);
        assert_eq!(result.incoming_po_qty, 40);
        assert_eq!(result.breakdown.incoming.len(), 1);
        assert_eq!(result.breakdown.incoming[0].expected_date, Some(day(20)));
        assert_eq!(result.atp_date, Some(day(1)));
    }

    #[test]
    fn oversold_position_stays_negative() {
        let product = ProductId::new();
        let wh = WarehouseId::new();
        let result = calculate_atp(
            &AtpQuery::product(product),
            &[position(product, wh, 100, 130)],
            &[],
            0,
            day(1),
        );
        assert_eq!(result.atp_qty, -30);
        assert!(result.is_shortage());
        assert_eq!(result.shortage_qty(), 30);
        assert_eq!(result.atp_date, None);
    }

    #[test]
    fn cancelled_and_received_lines_do_not_count() {
        let product = ProductId::new();
        let mut partial = line(product, "PO-3", 50, Some(day(9)), IncomingLineStatus::InTransit);
        partial.received_quantity = 20;
        let result = calculate_atp(
            &AtpQuery::product(product),
            &[],
            &[
                line(product, "PO-1", 40, Some(day(5)), IncomingLineStatus::Cancelled),
                line(product, "PO-2", 40, Some(day(5)), IncomingLineStatus::Received),
                partial,
            ],
            0,
            day(1),
        );
        assert_eq!(result.incoming_po_qty, 30);
        assert_eq!(result.breakdown.incoming[0].po_number, "PO-3");
    }

    #[test]
    fn warehouse_scope_filters_positions_and_destinations() {
        let product = ProductId::new();
        let a = WarehouseId::new();
        let b = WarehouseId::new();
        let mut to_a = line(product, "PO-A", 10, Some(day(3)), IncomingLineStatus::Sent);
        to_a.warehouse_id = Some(a);
        let mut to_b = line(product, "PO-B", 5, Some(day(3)), IncomingLineStatus::Sent);
        to_b.warehouse_id = Some(b);

        let positions = [position(product, a, 50, 10), position(product, b, 7, 0)];
        let incoming = [to_a, to_b];

        let scoped = calculate_atp(&AtpQuery::product(product).in_warehouse(a), &positions, &incoming, 0, day(1));
        assert_eq!((scoped.on_hand, scoped.reserved, scoped.incoming_po_qty), (50, 10, 10));
        assert_eq!(scoped.atp_qty, 50);

        let all = calculate_atp(&AtpQuery::product(product), &positions, &incoming, 0, day(1));
        assert_eq!((all.on_hand, all.reserved, all.incoming_po_qty), (57, 10, 15));
    }

    #[test]
    fn horizon_excludes_late_and_undated_lines() {
        let product = ProductId::new();
        let incoming = [
            line(product, "PO-1", 10, Some(day(5)), IncomingLineStatus::Confirmed),
            line(product, "PO-2", 20, Some(day(25)), IncomingLineStatus::Confirmed),
            line(product, "PO-3", 30, None, IncomingLineStatus::Confirmed),
        ];
        let result = calculate_atp(&AtpQuery::product(product).with_horizon(day(10)), &[], &incoming, 0, day(1));
        assert_eq!(result.incoming_po_qty, 10);

        let unbounded = calculate_atp(&AtpQuery::product(product), &[], &incoming, 0, day(1));
        assert_eq!(unbounded.incoming_po_qty, 60);
    }

    #[test]
    fn positive_atp_is_promisable_today_even_with_a_deficit_on_hand() {
        let product = ProductId::new();
        let wh = WarehouseId::new();
        let result = calculate_atp(
            &AtpQuery::product(product),
            &[position(product, wh, 10, 40)],
            &[
                line(product, "PO-2", 25, Some(day(20)), IncomingLineStatus::Confirmed),
                line(product, "PO-1", 20, Some(day(12)), IncomingLineStatus::Confirmed),
            ],
            0,
            day(1),
        );
        // -30 + 20 + 25 = 15
        assert_eq!(result.atp_qty, 15);
        assert_eq!(result.atp_date, Some(day(1)));
        assert_eq!(result.breakdown.incoming[0].po_number, "PO-1");
    }

    #[test]
    fn undated_incoming_still_promisable_today() {
        let product = ProductId::new();
        let result = calculate_atp(
            &AtpQuery::product(product),
            &[],
            &[line(product, "PO-1", 50, None, IncomingLineStatus::Confirmed)],
            0,
            day(1),
        );
        assert_eq!(result.atp_qty, 50);
        assert_eq!(result.atp_date, Some(day(1)));
    }

    #[test]
    fn zero_atp_has_no_promisable_date() {
        let product = ProductId::new();
        let wh = WarehouseId::new();
        let result = calculate_atp(
            &AtpQuery::product(product),
            &[position(product, wh, 10, 40)],
            &[line(product, "PO-1", 30, Some(day(12)), IncomingLineStatus::Confirmed)],
            0,
            day(1),
        );
        assert_eq!(result.atp_qty, 0);
        assert_eq!(result.atp_date, None);
    }

    #[test]
    fn held_reservations_add_to_reserved() {
        let product = ProductId::new();
        let wh = WarehouseId::new();
        let result = calculate_atp(&AtpQuery::product(product), &[position(product, wh, 100, 30)], &[], 25, day(1));
        assert_eq!(result.reserved, 55);
        assert_eq!(result.atp_qty, 45);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: ATP is exactly the identity, with no clamping.
        #[test]
        fn atp_identity_holds(
            on_hand in 0i64..10_000,
            reserved in 0i64..20_000,
            incoming in prop::collection::vec(1i64..500, 0..8),
        ) {
            let product = ProductId::new();
            let wh = WarehouseId::new();
            let lines: Vec<_> = incoming
                .iter()
                .enumerate()
                .map(|(i, q)| line(product, &format!("PO-{i}"), *q, Some(day(2)), IncomingLineStatus::Confirmed))
                .collect();
            let result = calculate_atp(&AtpQuery::product(product), &[position(product, wh, on_hand, reserved)], &lines, 0, day(1));
            prop_assert_eq!(result.atp_qty, on_hand - reserved + incoming.iter().sum::<i64>());
        }
    }
}
