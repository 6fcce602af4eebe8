//! Shipment tracking: inbound receipts, outbound deliveries and transfers.
//!
//! Items can be added to a shipment until it is delivered or cancelled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{aggregate_id, Aggregate, AggregateRoot, DomainError, Event, ProductId};

aggregate_id!(
    /// Shipment identifier.
    ShipmentId
);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentKind {
    Inbound,
    Outbound,
    Transfer,
}

impl ShipmentKind {
    /// Prefix of the human-readable shipment number.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            ShipmentKind::Inbound => "IN",
            ShipmentKind::Outbound => "OUT",
            ShipmentKind::Transfer => "TRF",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Shipped,
    InTransit,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    /// Position on the forward path; `None` for cancellation.
    fn stage(&self) -> Option<u8> {
        match self {
            ShipmentStatus::Pending => Some(0),
            ShipmentStatus::Shipped => Some(1),
            ShipmentStatus::InTransit => Some(2),
            ShipmentStatus::Delivered => Some(3),
            ShipmentStatus::Cancelled => None,
        }
    }
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub event: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// One item carried by a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub line_no: u32,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    pub weight_grams: Option<i64>,
}

/// Aggregate root: Shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    id: ShipmentId,
    shipment_number: String,
    kind: ShipmentKind,
    reference: Option<String>,
    carrier: Option<String>,
    status: ShipmentStatus,
    expected_delivery_date: Option<NaiveDate>,
    actual_delivery_date: Option<NaiveDate>,
    lines: Vec<ShipmentLine>,
    /// Newest first.
    tracking: Vec<TrackingEvent>,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Shipment {
    pub fn empty(id: ShipmentId) -> Self {
        Self {
            id,
            shipment_number: String::new(),
            kind: ShipmentKind::Inbound,
            reference: None,
            carrier: None,
            status: ShipmentStatus::Pending,
            expected_delivery_date: None,
            actual_delivery_date: None,
            lines: Vec::new(),
            tracking: Vec::new(),
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ShipmentId {
        self.id
    }

    pub fn shipment_number(&self) -> &str {
        &self.shipment_number
    }

    pub fn kind(&self) -> ShipmentKind {
        self.kind
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn actual_delivery_date(&self) -> Option<NaiveDate> {
        self.actual_delivery_date
    }

    pub fn lines(&self) -> &[ShipmentLine] {
        &self.lines
    }

    /// Sum of the known line weights.
    pub fn total_weight_grams(&self) -> i64 {
        self.lines.iter().filter_map(|l| l.weight_grams).sum()
    }

    pub fn tracking(&self) -> &[TrackingEvent] {
        &self.tracking
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl AggregateRoot for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateShipment {
    pub shipment_id: ShipmentId,
    /// Allocated by the caller (`IN-2026-0001`, ...).
    pub shipment_number: String,
    pub kind: ShipmentKind,
    pub reference: Option<String>,
    pub carrier: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateShipmentStatus {
    pub shipment_id: ShipmentId,
    pub status: ShipmentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddShipmentLine {
    pub shipment_id: ShipmentId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    pub weight_grams: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentCommand {
    Create(CreateShipment),
    AddLine(AddShipmentLine),
    UpdateStatus(UpdateShipmentStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentEvent {
    ShipmentCreated(CreateShipment),
    LineAdded {
        shipment_id: ShipmentId,
        line: ShipmentLine,
        occurred_at: DateTime<Utc>,
    },
    StatusChanged {
        shipment_id: ShipmentId,
        from: ShipmentStatus,
        to: ShipmentStatus,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentCreated(_) => "inventory.shipment.created",
            ShipmentEvent::LineAdded { .. } => "inventory.shipment.line_added",
            ShipmentEvent::StatusChanged { .. } => "inventory.shipment.status_changed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ShipmentEvent::ShipmentCreated(e) => e.occurred_at,
            ShipmentEvent::LineAdded { occurred_at, .. } | ShipmentEvent::StatusChanged { occurred_at, .. } => {
                *occurred_at
            }
        }
    }
}

impl Aggregate for Shipment {
    type Command = ShipmentCommand;
    type Event = ShipmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ShipmentEvent::ShipmentCreated(e) => {
                self.id = e.shipment_id;
                self.shipment_number = e.shipment_number.clone();
                self.kind = e.kind;
                self.reference = e.reference.clone();
                self.carrier = e.carrier.clone();
                self.expected_delivery_date = e.expected_delivery_date;
                self.status = ShipmentStatus::Pending;
                self.created_at = Some(e.occurred_at);
                self.tracking.insert(
                    0,
                    TrackingEvent {
                        event: "CREATED".to_string(),
                        description: format!("Shipment {} created", e.shipment_number),
                        occurred_at: e.occurred_at,
                    },
                );
                self.created = true;
            }
            ShipmentEvent::LineAdded { line, .. } => {
                self.lines.push(line.clone());
            }
            ShipmentEvent::StatusChanged { to, occurred_at, .. } => {
                self.status = *to;
                if *to == ShipmentStatus::Delivered {
                    self.actual_delivery_date = Some(occurred_at.date_naive());
                }
                self.tracking.insert(
                    0,
                    TrackingEvent {
                        event: format!("Status changed to {}", to.as_str().to_uppercase()),
                        description: format!("Shipment status updated to {to}"),
                        occurred_at: *occurred_at,
                    },
                );
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ShipmentCommand::Create(cmd) => {
                if self.created {
                    return Err(DomainError::conflict("shipment already exists"));
                }
                if cmd.shipment_number.trim().is_empty() {
                    return Err(DomainError::validation("shipment number cannot be empty"));
                }
                Ok(vec![ShipmentEvent::ShipmentCreated(cmd.clone())])
            }
            ShipmentCommand::AddLine(cmd) => self.handle_add_line(cmd),
            ShipmentCommand::UpdateStatus(cmd) => self.handle_status(cmd),
        }
    }
}

impl Shipment {
    fn handle_add_line(&self, cmd: &AddShipmentLine) -> Result<Vec<ShipmentEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found("shipment", self.id));
        }
        if self.status.is_terminal() {
            return Err(DomainError::conflict(format!(
                "shipment {} is already {}",
                self.shipment_number, self.status
            )));
        }
        if cmd.product_name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.weight_grams.is_some_and(|w| w < 0) {
            return Err(DomainError::validation("weight cannot be negative"));
        }

        let line_no = self.lines.last().map(|l| l.line_no + 1).unwrap_or(1);
        Ok(vec![ShipmentEvent::LineAdded {
            shipment_id: cmd.shipment_id,
            line: ShipmentLine {
                line_no,
                product_id: cmd.product_id,
                product_name: cmd.product_name.trim().to_string(),
                quantity: cmd.quantity,
                weight_grams: cmd.weight_grams,
            },
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_status(&self, cmd: &UpdateShipmentStatus) -> Result<Vec<ShipmentEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found("shipment", self.id));
        }
        if self.status.is_terminal() {
            return Err(DomainError::conflict(format!(
                "shipment {} is already {}",
                self.shipment_number, self.status
            )));
        }
        if let (Some(current), Some(next)) = (self.status.stage(), cmd.status.stage()) {
            if next <= current {
                return Err(DomainError::conflict(format!(
                    "shipment cannot move from {} to {}",
                    self.status, cmd.status
                )));
            }
        }

        Ok(vec![ShipmentEvent::StatusChanged {
            shipment_id: cmd.shipment_id,
            from: self.status,
            to: cmd.status,
            occurred_at: cmd.occurred_at,
        }])
    }
}
