use serde::Serialize;

use stockpact_audit::AuditStore;
use stockpact_inventory::ShipmentStatus;
use stockpact_replenishment::RequestStatus;

use super::suppliers::latest_score;
use super::ScmService;
use crate::error::ScmError;

/// Headline counters for the SCM dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScmKpis {
    pub total_rfqs: usize,
    pub open_rfqs: usize,
    pub total_shipments: usize,
    pub in_transit_shipments: usize,
    pub delivered_shipments: usize,
    /// Vendors whose latest assessment is high or critical.
    pub high_risk_vendors: usize,
    pub pending_replenishment_requests: usize,
    pub active_reservations: usize,
    pub total_lots: usize,
}

impl<S: AuditStore> ScmService<S> {
    pub fn dashboard_kpis(&self) -> Result<ScmKpis, ScmError> {
        let mut kpis = ScmKpis::default();

        {
            let rfqs = self.rfqs.read()?;
            let visible = rfqs.values().filter(|r| !r.is_archived());
            for rfq in visible {
                kpis.total_rfqs += 1;
                if rfq.status().is_open() {
                    kpis.open_rfqs += 1;
                }
            }
        }
        {
            let shipments = self.shipments.read()?;
            kpis.total_shipments = shipments.len();
            for shipment in shipments.values() {
                match shipment.status() {
                    ShipmentStatus::Shipped | ShipmentStatus::InTransit => kpis.in_transit_shipments += 1,
                    ShipmentStatus::Delivered => kpis.delivered_shipments += 1,
                    ShipmentStatus::Pending | ShipmentStatus::Cancelled => {}
                }
            }
        }
        kpis.high_risk_vendors = self
            .risk_scores
            .read()?
            .values()
            .filter_map(|history| latest_score(history))
            .filter(|score| score.risk_level.is_elevated())
            .count();
        kpis.pending_replenishment_requests = self
            .replenishment_requests
            .read()?
            .values()
            .filter(|r| r.status() == RequestStatus::Pending)
            .count();
        kpis.active_reservations = self.reservations.read()?.values().filter(|r| r.is_active()).count();
        kpis.total_lots = self.lots.read()?.len();

        Ok(kpis)
    }
}
