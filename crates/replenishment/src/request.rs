//! Persisted replenishment request: `pending -> approved -> converted_to_po`,
//! or `pending -> rejected`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{
    aggregate_id, Aggregate, AggregateRoot, DomainError, Event, ProductId, UserId, VendorId,
    WarehouseId,
};

use crate::eoq::EoqDetails;
use crate::scan::{needs_replenishment, ReplenishmentAlert};

aggregate_id!(
    /// Replenishment request identifier.
    ReplenishmentRequestId
);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    ConvertedToPo,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::ConvertedToPo => "converted_to_po",
        }
    }
}

/// Aggregate root: ReplenishmentRequest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplenishmentRequest {
    id: ReplenishmentRequestId,
    product_id: Option<ProductId>,
    warehouse_id: Option<WarehouseId>,
    current_stock: i64,
    reorder_point: i64,
    suggested_qty: i64,
    eoq_details: Option<EoqDetails>,
    status: RequestStatus,
    approved_by: Option<UserId>,
    rejection_reason: Option<String>,
    vendor_id: Option<VendorId>,
    po_number: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl ReplenishmentRequest {
    pub fn empty(id: ReplenishmentRequestId) -> Self {
        Self {
            id,
            product_id: None,
            warehouse_id: None,
            current_stock: 0,
            reorder_point: 0,
            suggested_qty: 0,
            eoq_details: None,
            status: RequestStatus::Pending,
            approved_by: None,
            rejection_reason: None,
            vendor_id: None,
            po_number: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ReplenishmentRequestId {
        self.id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn suggested_qty(&self) -> i64 {
        self.suggested_qty
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn po_number(&self) -> Option<&str> {
        self.po_number.as_deref()
    }

    pub fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Ensure the request is approved and can be handed to procurement.
    ///
    /// The facade calls this before creating the external PO so that no PO
    /// is created for a request that would be rejected anyway.
    pub fn ensure_convertible(&self) -> Result<(), DomainError> {
        self.ensure_created()?;
        if self.status != RequestStatus::Approved {
            return Err(DomainError::conflict(format!(
                "replenishment request is {}, only approved requests can be converted",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn ensure_created(&self) -> Result<(), DomainError> {
        if self.created {
            Ok(())
        } else {
            Err(DomainError::not_found("replenishment request", self.id))
        }
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        self.ensure_created()?;
        if self.status != RequestStatus::Pending {
            return Err(DomainError::conflict(format!(
                "replenishment request is already {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for ReplenishmentRequest {
    type Id = ReplenishmentRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub request_id: ReplenishmentRequestId,
    /// Fresh scan result for the product (and warehouse, if scoped).
    pub alert: ReplenishmentAlert,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub request_id: ReplenishmentRequestId,
    pub approved_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectRequest {
    pub request_id: ReplenishmentRequestId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkConverted {
    pub request_id: ReplenishmentRequestId,
    pub vendor_id: VendorId,
    pub po_number: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplenishmentCommand {
    Create(CreateRequest),
    Approve(ApproveRequest),
    Reject(RejectRequest),
    MarkConverted(MarkConverted),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplenishmentEvent {
    RequestCreated(CreateRequest),
    RequestApproved(ApproveRequest),
    RequestRejected(RejectRequest),
    ConvertedToPurchaseOrder(MarkConverted),
}

impl Event for ReplenishmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReplenishmentEvent::RequestCreated(_) => "replenishment.request.created",
            ReplenishmentEvent::RequestApproved(_) => "replenishment.request.approved",
            ReplenishmentEvent::RequestRejected(_) => "replenishment.request.rejected",
            ReplenishmentEvent::ConvertedToPurchaseOrder(_) => "replenishment.request.converted",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReplenishmentEvent::RequestCreated(e) => e.occurred_at,
            ReplenishmentEvent::RequestApproved(e) => e.occurred_at,
            ReplenishmentEvent::RequestRejected(e) => e.occurred_at,
            ReplenishmentEvent::ConvertedToPurchaseOrder(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ReplenishmentRequest {
    type Command = ReplenishmentCommand;
    type Event = ReplenishmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReplenishmentEvent::RequestCreated(e) => {
                self.id = e.request_id;
                self.product_id = Some(e.alert.product_id);
                self.warehouse_id = e.alert.warehouse_id;
                self.current_stock = e.alert.current_stock;
                self.reorder_point = e.alert.reorder_point;
                self.suggested_qty = e.alert.suggested_qty;
                self.eoq_details = e.alert.eoq_details;
                self.status = RequestStatus::Pending;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            ReplenishmentEvent::RequestApproved(e) => {
                self.status = RequestStatus::Approved;
                self.approved_by = e.approved_by;
            }
            ReplenishmentEvent::RequestRejected(e) => {
                self.status = RequestStatus::Rejected;
                self.rejection_reason = e.reason.clone();
            }
            ReplenishmentEvent::ConvertedToPurchaseOrder(e) => {
                self.status = RequestStatus::ConvertedToPo;
                self.vendor_id = Some(e.vendor_id);
                self.po_number = Some(e.po_number.clone());
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReplenishmentCommand::Create(cmd) => self.handle_create(cmd),
            ReplenishmentCommand::Approve(cmd) => {
                self.ensure_pending()?;
                Ok(vec![ReplenishmentEvent::RequestApproved(cmd.clone())])
            }
            ReplenishmentCommand::Reject(cmd) => {
                self.ensure_pending()?;
                Ok(vec![ReplenishmentEvent::RequestRejected(cmd.clone())])
            }
            ReplenishmentCommand::MarkConverted(cmd) => {
                self.ensure_convertible()?;
                if cmd.po_number.trim().is_empty() {
                    return Err(DomainError::validation("po number cannot be empty"));
                }
                Ok(vec![ReplenishmentEvent::ConvertedToPurchaseOrder(cmd.clone())])
            }
        }
    }
}

impl ReplenishmentRequest {
    fn handle_create(&self, cmd: &CreateRequest) -> Result<Vec<ReplenishmentEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("replenishment request already exists"));
        }
        let alert = &cmd.alert;
        if alert.warehouse_id.is_none() {
            return Err(DomainError::validation("replenishment request needs a warehouse"));
        }
        if !needs_replenishment(alert.current_stock, alert.reorder_point) {
            return Err(DomainError::validation(format!(
                "product {} does not need replenishment (stock {} above reorder point {})",
                alert.product_id, alert.current_stock, alert.reorder_point
            )));
        }
        if alert.suggested_qty <= 0 {
            return Err(DomainError::validation(format!(
                "product {} has no positive suggested quantity",
                alert.product_id
            )));
        }
        Ok(vec![ReplenishmentEvent::RequestCreated(cmd.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eoq::EoqInputs;
    use stockpact_core::execute;

    fn alert(current_stock: i64, reorder_point: i64) -> ReplenishmentAlert {
        let eoq_details = EoqInputs::new(1200.0, 50.0, 2.0).details();
        ReplenishmentAlert {
            product_id: ProductId::new(),
            product_name: "Bearing 6204".to_string(),
            warehouse_id: Some(WarehouseId::new()),
            current_stock,
            reorder_point,
            safety_stock: 5,
            suggested_qty: 245,
            eoq_details,
        }
    }

    fn pending() -> ReplenishmentRequest {
        let id = ReplenishmentRequestId::generate();
        let mut r = ReplenishmentRequest::empty(id);
        execute(
            &mut r,
            &ReplenishmentCommand::Create(CreateRequest {
                request_id: id,
                alert: alert(5, 20),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        r
    }

    fn approve(r: &mut ReplenishmentRequest) -> Result<Vec<ReplenishmentEvent>, DomainError> {
        let id = r.id_typed();
        execute(
            r,
            &ReplenishmentCommand::Approve(ApproveRequest {
                request_id: id,
                approved_by: Some(UserId::new()),
                occurred_at: Utc::now(),
            }),
        )
    }

    fn convert(r: &mut ReplenishmentRequest) -> Result<Vec<ReplenishmentEvent>, DomainError> {
        let id = r.id_typed();
        execute(
            r,
            &ReplenishmentCommand::MarkConverted(MarkConverted {
                request_id: id,
                vendor_id: VendorId::new(),
                po_number: "PO-2026-0001".to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    #[test]
    fn pending_approved_converted() {
        let mut r = pending();
        assert_eq!(r.status(), RequestStatus::Pending);
        assert_eq!(r.suggested_qty(), 245);

        approve(&mut r).unwrap();
        convert(&mut r).unwrap();
        assert_eq!(r.status(), RequestStatus::ConvertedToPo);
        assert_eq!(r.po_number(), Some("PO-2026-0001"));
        assert_eq!(r.version(), 3);
    }

    #[test]
    fn converting_a_pending_request_conflicts() {
        let mut r = pending();
        let err = convert(&mut r).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(r.version(), 1);
    }

    #[test]
    fn approving_twice_conflicts() {
        let mut r = pending();
        approve(&mut r).unwrap();
        assert!(matches!(approve(&mut r), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn rejected_request_cannot_be_approved() {
        let mut r = pending();
        let id = r.id_typed();
        execute(
            &mut r,
            &ReplenishmentCommand::Reject(RejectRequest {
                request_id: id,
                reason: Some("supplier shutdown".into()),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        assert_eq!(r.status(), RequestStatus::Rejected);
        assert!(matches!(approve(&mut r), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn create_requires_stock_at_or_below_reorder_point() {
        let id = ReplenishmentRequestId::generate();
        let r = ReplenishmentRequest::empty(id);
        let err = r
            .handle(&ReplenishmentCommand::Create(CreateRequest {
                request_id: id,
                alert: alert(50, 20),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_requires_a_warehouse() {
        let id = ReplenishmentRequestId::generate();
        let r = ReplenishmentRequest::empty(id);
        let mut unscoped = alert(5, 20);
        unscoped.warehouse_id = None;
        let err = r
            .handle(&ReplenishmentCommand::Create(CreateRequest {
                request_id: id,
                alert: unscoped,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("warehouse")));
    }
}
