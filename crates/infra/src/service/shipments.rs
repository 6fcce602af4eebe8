use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use stockpact_audit::{AuditAction, AuditStore, EntityType};
use stockpact_core::{ExpectedVersion, ProductId};
use stockpact_inventory::{
    AddShipmentLine, CreateShipment, Shipment, ShipmentCommand, ShipmentId, ShipmentKind, ShipmentLine,
    ShipmentStatus, UpdateShipmentStatus,
};

use super::{Change, ScmService};
use crate::error::ScmError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipment {
    pub kind: ShipmentKind,
    /// PO, sales order or transfer number this shipment moves goods for.
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub expected_delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipmentLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    #[serde(default)]
    pub weight_grams: Option<i64>,
}

impl<S: AuditStore> ScmService<S> {
    #[tracing::instrument(skip(self, shipment), fields(kind = ?shipment.kind))]
    pub fn create_shipment(&self, shipment: NewShipment) -> Result<Shipment, ScmError> {
        let shipment_id = ShipmentId::generate();
        let now = self.clock.now();
        self.numbers.issue_with(shipment.kind.number_prefix(), now.year(), |shipment_number| {
            let command = ShipmentCommand::Create(CreateShipment {
                shipment_id,
                shipment_number,
                kind: shipment.kind,
                reference: shipment.reference,
                carrier: shipment.carrier,
                expected_delivery_date: shipment.expected_delivery_date,
                occurred_at: now,
            });
            self.shipment_transition(shipment_id, AuditAction::Create, ExpectedVersion::Exact(0), &command)
        })
    }

    #[tracing::instrument(skip(self), fields(shipment_id = %shipment_id, status = status.as_str()))]
    pub fn update_shipment_status(
        &self,
        shipment_id: ShipmentId,
        status: ShipmentStatus,
        expected: ExpectedVersion,
    ) -> Result<Shipment, ScmError> {
        let command = ShipmentCommand::UpdateStatus(UpdateShipmentStatus {
            shipment_id,
            status,
            occurred_at: self.clock.now(),
        });
        self.shipment_transition(shipment_id, AuditAction::Update, expected, &command)
    }

    #[tracing::instrument(skip(self, line), fields(shipment_id = %shipment_id))]
    pub fn add_shipment_line(
        &self,
        shipment_id: ShipmentId,
        line: NewShipmentLine,
        expected: ExpectedVersion,
    ) -> Result<Shipment, ScmError> {
        let command = ShipmentCommand::AddLine(AddShipmentLine {
            shipment_id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            weight_grams: line.weight_grams,
            occurred_at: self.clock.now(),
        });
        self.shipment_transition(shipment_id, AuditAction::Update, expected, &command)
    }

    pub fn shipment_lines(&self, shipment_id: ShipmentId) -> Result<Vec<ShipmentLine>, ScmError> {
        Ok(self.get_shipment(shipment_id)?.lines().to_vec())
    }

    pub fn get_shipment(&self, shipment_id: ShipmentId) -> Result<Shipment, ScmError> {
        self.shipments
            .get(&shipment_id)?
            .ok_or_else(|| ScmError::not_found("shipment", shipment_id))
    }

    /// Shipments, newest first, optionally with one status.
    pub fn list_shipments(&self, status: Option<ShipmentStatus>) -> Result<Vec<Shipment>, ScmError> {
        let mut shipments: Vec<Shipment> = self
            .shipments
            .list()?
            .into_iter()
            .filter(|s| status.is_none_or(|wanted| s.status() == wanted))
            .collect();
        shipments.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.shipment_number().cmp(a.shipment_number()))
        });
        Ok(shipments)
    }

    fn shipment_transition(
        &self,
        shipment_id: ShipmentId,
        action: AuditAction,
        expected: ExpectedVersion,
        command: &ShipmentCommand,
    ) -> Result<Shipment, ScmError> {
        self.transition(
            &self.shipments,
            shipment_id,
            || Shipment::empty(shipment_id),
            Change {
                entity_type: EntityType::Shipment,
                entity_id: shipment_id.aggregate_id(),
                action,
                expected,
                command,
            },
        )
    }
}
